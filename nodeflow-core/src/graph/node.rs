//! Graph Nodes
//!
//! This module defines the nodes that live in the dataflow graph and the
//! [`Processor`] trait that concrete node types implement.
//!
//! A node carries its ports, its parameter bag, and an explicit two-state
//! machine (`Clean` / `Dirty`). Cached outputs are only trusted while the
//! node is `Clean`; that is the whole memoization contract.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::port::{Port, PortDirection, PortSpec};
use crate::error::{GraphError, ProcessError, Result};
use crate::value::{Parameters, Value};

/// Unique identifier for a node in a graph.
///
/// Ids are assigned by the graph on insertion from a per-graph counter and
/// are never reused, so a stale id resolves to "not found" rather than to a
/// newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Placeholder carried by nodes that have not joined a graph.
    pub const DETACHED: NodeId = NodeId(u64::MAX);

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Whether this id was assigned by a graph.
    pub fn is_attached(&self) -> bool {
        *self != Self::DETACHED
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_attached() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#detached")
        }
    }
}

/// Dirty state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirtyState {
    /// The node's cached outputs are up-to-date.
    Clean,

    /// The node must run `process` before its outputs can be used.
    Dirty,
}

/// The computation behind a node.
///
/// Implementations declare their ports and default parameters and compute
/// outputs from inputs. `process` must be a pure function of the current
/// inputs and parameters: a `Clean` node is never re-run, so any hidden
/// state would be silently skipped.
pub trait Processor {
    /// Name of the node type, e.g. `"blur"`.
    fn type_name(&self) -> &str;

    /// Input and output port declarations.
    fn ports(&self) -> Vec<PortSpec>;

    /// Parameters a fresh node starts with.
    fn default_parameters(&self) -> Parameters {
        Parameters::new()
    }

    /// Compute outputs from inputs and parameters.
    fn process(&self, ctx: &mut ProcessContext<'_>) -> std::result::Result<(), ProcessError>;
}

/// What a [`Processor`] sees during one `process` call.
///
/// Inputs that are unconnected, or whose upstream produced nothing, read as
/// `None`. Deciding whether that is acceptable is up to the processor.
pub struct ProcessContext<'a> {
    node: NodeId,
    inputs: &'a IndexMap<String, Option<Value>>,
    parameters: &'a Parameters,
    outputs: IndexMap<String, Option<Value>>,
}

impl<'a> ProcessContext<'a> {
    /// Build a context whose outputs start empty.
    pub fn new<'n>(
        node: NodeId,
        inputs: &'a IndexMap<String, Option<Value>>,
        parameters: &'a Parameters,
        output_names: impl IntoIterator<Item = &'n str>,
    ) -> Self {
        Self {
            node,
            inputs,
            parameters,
            outputs: output_names
                .into_iter()
                .map(|name| (name.to_owned(), None))
                .collect(),
        }
    }

    /// The node being processed.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Pulled value of an input, if any.
    pub fn input(&self, name: &str) -> Option<&Value> {
        self.inputs.get(name).and_then(Option::as_ref)
    }

    /// Pulled value of an input, failing when there is none.
    pub fn require_input(&self, name: &str) -> std::result::Result<&Value, ProcessError> {
        self.input(name)
            .ok_or_else(|| ProcessError::MissingInput(name.to_owned()))
    }

    /// Current value of a parameter.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Write an output. Only declared outputs can be written.
    pub fn set_output(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> std::result::Result<(), ProcessError> {
        match self.outputs.get_mut(name) {
            Some(slot) => {
                *slot = Some(value.into());
                Ok(())
            }
            None => Err(ProcessError::UnknownOutput(name.to_owned())),
        }
    }

    /// Value written so far to an output.
    pub fn output(&self, name: &str) -> Option<&Value> {
        self.outputs.get(name).and_then(Option::as_ref)
    }

    /// Consume the context, yielding the produced outputs.
    pub fn into_outputs(self) -> IndexMap<String, Option<Value>> {
        self.outputs
    }
}

/// A node in the dataflow graph.
pub struct Node {
    /// Unique identifier for this node.
    id: NodeId,

    /// Display name.
    name: String,

    /// Input ports by name, in declaration order.
    inputs: IndexMap<String, Port>,

    /// Output ports by name, in declaration order. Their slots are the
    /// node's output cache.
    outputs: IndexMap<String, Port>,

    /// Node-specific settings.
    parameters: Parameters,

    /// Current dirty state.
    state: DirtyState,

    /// The computation.
    processor: Box<dyn Processor>,
}

impl Node {
    /// Create a detached node from a processor.
    ///
    /// Ports come from `Processor::ports` and parameters from
    /// `Processor::default_parameters`. The node starts `Dirty`.
    pub fn new(name: impl Into<String>, processor: Box<dyn Processor>) -> Result<Self> {
        let mut inputs = IndexMap::new();
        let mut outputs = IndexMap::new();

        for spec in processor.ports() {
            let ports = match spec.direction {
                PortDirection::Input => &mut inputs,
                PortDirection::Output => &mut outputs,
            };
            if ports.contains_key(&spec.name) {
                return Err(GraphError::DuplicatePort {
                    port: spec.name,
                    direction: spec.direction,
                });
            }
            ports.insert(spec.name.clone(), Port::from_spec(&spec));
        }

        Ok(Self {
            id: NodeId::DETACHED,
            name: name.into(),
            inputs,
            outputs,
            parameters: processor.default_parameters(),
            state: DirtyState::Dirty,
            processor,
        })
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the display name. Does not affect cached results.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Name of the node type.
    pub fn type_name(&self) -> &str {
        self.processor.type_name()
    }

    /// Input ports in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values()
    }

    /// Output ports in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = &Port> {
        self.outputs.values()
    }

    /// All ports, inputs first.
    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.inputs.values().chain(self.outputs.values())
    }

    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.get(name)
    }

    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.get(name)
    }

    /// Look up a port by direction and name.
    pub fn port(&self, direction: PortDirection, name: &str) -> Option<&Port> {
        match direction {
            PortDirection::Input => self.input(name),
            PortDirection::Output => self.output(name),
        }
    }

    /// Get all parameters.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Get a parameter's value.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// Get the current dirty state.
    pub fn dirty_state(&self) -> DirtyState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DirtyState::Dirty
    }

    pub fn is_clean(&self) -> bool {
        self.state == DirtyState::Clean
    }

    /// Cached value of an output. `None` while the node is dirty, since the
    /// cache is only valid in the `Clean` state.
    pub fn cached_output(&self, name: &str) -> Option<&Value> {
        if self.is_dirty() {
            return None;
        }
        self.outputs.get(name).and_then(Port::data)
    }

    pub(crate) fn bind(&mut self, id: NodeId) {
        self.id = id;
        for port in self.inputs.values_mut().chain(self.outputs.values_mut()) {
            port.bind(id);
        }
    }

    pub(crate) fn port_mut(&mut self, direction: PortDirection, name: &str) -> Option<&mut Port> {
        match direction {
            PortDirection::Input => self.inputs.get_mut(name),
            PortDirection::Output => self.outputs.get_mut(name),
        }
    }

    /// Store a parameter. Returns whether the stored value changed.
    pub(crate) fn store_parameter(&mut self, name: &str, value: Value) -> bool {
        match self.parameters.get_mut(name) {
            Some(current) if *current == value => false,
            Some(current) => {
                *current = value;
                true
            }
            None => {
                self.parameters.insert(name.to_owned(), value);
                true
            }
        }
    }

    /// Mark the node as dirty. Returns whether the state changed.
    pub(crate) fn mark_dirty(&mut self) -> bool {
        let was_clean = self.is_clean();
        self.state = DirtyState::Dirty;
        was_clean
    }

    /// Mark the node as clean.
    pub(crate) fn mark_clean(&mut self) {
        self.state = DirtyState::Clean;
    }

    /// Run `process` on pulled inputs and store the outputs.
    ///
    /// On success every output slot is overwritten (unset outputs become
    /// `None`) and the node turns `Clean`. On failure the node stays `Dirty`
    /// and its output slots keep their previous contents. A failing
    /// `process` is reported as `ProcessingFailure`.
    pub(crate) fn run(&mut self, pulled: IndexMap<String, Option<Value>>) -> Result<()> {
        for (name, value) in &pulled {
            if let Some(port) = self.inputs.get_mut(name) {
                port.record_pull(value.clone());
            }
        }

        let produced = {
            let mut ctx = ProcessContext::new(
                self.id,
                &pulled,
                &self.parameters,
                self.outputs.keys().map(String::as_str),
            );
            if let Err(source) = self.processor.process(&mut ctx) {
                return Err(GraphError::ProcessingFailure {
                    node: self.id,
                    name: self.name.clone(),
                    source,
                });
            }
            ctx.into_outputs()
        };

        for (name, value) in produced {
            if let Some(port) = self.outputs.get_mut(&name) {
                port.set_data(value)?;
            }
        }
        self.mark_clean();
        Ok(())
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.processor.type_name())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("state", &self.state)
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
