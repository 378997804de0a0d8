//! Evaluation
//!
//! Evaluation is pull-based and memoized. The graph orders the dependency
//! closure of the requested target (or of every sink) and visits it in that
//! order. A `Clean` node is skipped outright and its cached outputs are
//! reused. A `Dirty` node first makes sure every upstream node is evaluated,
//! pulls its inputs, runs `process`, stores the outputs, and turns `Clean`.
//!
//! A failing `process` aborts the pass. Nodes evaluated before the failure
//! keep their fresh results; the failing node and everything downstream of
//! it stay dirty.

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::dataflow::Graph;
use super::node::NodeId;
use super::scheduler;
use crate::error::{GraphError, Missing, Result};
use crate::value::Value;

/// Outcome of an evaluation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Nodes visited, in execution order.
    pub order: Vec<NodeId>,

    /// Nodes whose `process` actually ran, in invocation order.
    pub processed: Vec<NodeId>,
}

impl Evaluation {
    /// True when every visited node was already clean.
    pub fn is_cached(&self) -> bool {
        self.processed.is_empty()
    }
}

impl Graph {
    /// Execution order for `target`'s dependency closure, or for the
    /// closure of every sink when no target is given.
    pub fn topological_order(&self, target: Option<NodeId>) -> Result<Vec<NodeId>> {
        let roots = match target {
            Some(id) if self.contains_node(id) => vec![id],
            Some(id) => return Err(GraphError::NotFound(Missing::Node(id))),
            None => self.sinks(),
        };
        let closure = scheduler::upstream_closure(self, roots);
        scheduler::topological_sort(self, &closure)
    }

    /// Evaluate `target` (or every sink), recomputing only dirty nodes.
    pub fn evaluate(&mut self, target: Option<NodeId>) -> Result<Evaluation> {
        let order = self.topological_order(target)?;
        let mut processed = Vec::new();

        for &id in &order {
            self.evaluate_node(id, &mut processed)?;
        }

        debug!(
            target = ?target,
            visited = order.len(),
            processed = processed.len(),
            "evaluation finished"
        );
        Ok(Evaluation { order, processed })
    }

    /// Evaluate every sink and its upstream closure.
    pub fn evaluate_all(&mut self) -> Result<Evaluation> {
        self.evaluate(None)
    }

    /// Bring one node up to date.
    ///
    /// Upstream nodes are evaluated first. When called in topological order
    /// they are already clean and the recursion returns immediately.
    fn evaluate_node(&mut self, id: NodeId, processed: &mut Vec<NodeId>) -> Result<()> {
        let node = self
            .nodes
            .get(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))?;
        if node.is_clean() {
            trace!(node = %id, "clean, reusing cached outputs");
            return Ok(());
        }

        for upstream in self.dependencies(id) {
            self.evaluate_node(upstream, processed)?;
        }

        let pulled = self.pull_inputs(id);
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))?;

        trace!(node = %id, name = node.name(), "processing");
        if let Err(err) = node.run(pulled) {
            warn!(node = %id, name = node.name(), error = %err, "process failed");
            return Err(err);
        }
        processed.push(id);
        Ok(())
    }

    /// Current upstream value for every input of `id`.
    fn pull_inputs(&self, id: NodeId) -> IndexMap<String, Option<Value>> {
        let Some(node) = self.nodes.get(&id) else {
            return IndexMap::new();
        };
        node.inputs()
            .map(|port| (port.name().to_owned(), self.upstream_value(port).cloned()))
            .collect()
    }
}
