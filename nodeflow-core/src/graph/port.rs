//! Ports
//!
//! A port is a typed attachment point on a node. Output ports fan out to any
//! number of inputs; an input port accepts at most one incoming connection.
//!
//! Ports refer to their owning node and their connections by id only. The
//! graph owns everything, so detaching a port is plain bookkeeping.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::connection::ConnectionId;
use super::node::NodeId;
use crate::error::ConnectionRejection;
use crate::value::{DataType, Value};

/// Whether a port is an input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => f.write_str("input"),
            PortDirection::Output => f.write_str("output"),
        }
    }
}

/// Static declaration of a port, as published by a node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    pub name: String,
    pub direction: PortDirection,
    pub data_type: DataType,
}

impl PortSpec {
    pub fn input(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Input,
            data_type,
        }
    }

    pub fn output(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            direction: PortDirection::Output,
            data_type,
        }
    }
}

/// A port instance on a node.
#[derive(Debug, Clone)]
pub struct Port {
    /// Owning node. `NodeId::DETACHED` until the node joins a graph.
    owner: NodeId,

    name: String,
    direction: PortDirection,
    data_type: DataType,

    /// Last produced value (outputs) or last pulled value (inputs).
    data: Option<Value>,

    /// Attached connections. Never more than one for an input.
    connections: SmallVec<[ConnectionId; 2]>,
}

impl Port {
    /// Create a detached port.
    pub fn new(name: impl Into<String>, direction: PortDirection, data_type: DataType) -> Self {
        Self {
            owner: NodeId::DETACHED,
            name: name.into(),
            direction,
            data_type,
            data: None,
            connections: SmallVec::new(),
        }
    }

    pub fn from_spec(spec: &PortSpec) -> Self {
        Self::new(spec.name.clone(), spec.direction, spec.data_type.clone())
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    pub fn is_input(&self) -> bool {
        self.direction == PortDirection::Input
    }

    pub fn is_output(&self) -> bool {
        self.direction == PortDirection::Output
    }

    /// The local slot. For an input this is the value recorded at the last
    /// pull, which may be stale; use `Graph::read_port` for live data.
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Check whether a connection from `self` (an output) to `other` (an
    /// input) would be legal.
    ///
    /// Each failure has its own [`ConnectionRejection`] so callers can report
    /// exactly what is wrong. The checks run in a fixed order: direction,
    /// same node, type, occupancy.
    pub fn can_connect_to(&self, other: &Port) -> Result<(), ConnectionRejection> {
        if !self.is_output() || !other.is_input() {
            return Err(ConnectionRejection::DirectionMismatch);
        }
        if self.owner == other.owner {
            return Err(ConnectionRejection::SameNode);
        }
        if !self.data_type.is_compatible_with(&other.data_type) {
            return Err(ConnectionRejection::TypeMismatch {
                output: self.data_type.clone(),
                input: other.data_type.clone(),
            });
        }
        if other.is_connected() {
            return Err(ConnectionRejection::InputOccupied);
        }
        Ok(())
    }

    /// Store a produced value. Outputs only; connected ports are untouched.
    ///
    /// Input slots are only written by evaluation when it pulls upstream
    /// data, so an input rejects this with `DirectionMismatch` and keeps its
    /// slot.
    pub(crate) fn set_data(&mut self, value: Option<Value>) -> Result<(), ConnectionRejection> {
        if !self.is_output() {
            return Err(ConnectionRejection::DirectionMismatch);
        }
        self.data = value;
        Ok(())
    }

    /// Record the value an input pulled during evaluation.
    pub(crate) fn record_pull(&mut self, value: Option<Value>) {
        debug_assert!(self.is_input(), "record_pull on output port '{}'", self.name);
        self.data = value;
    }

    pub(crate) fn bind(&mut self, owner: NodeId) {
        self.owner = owner;
    }

    pub(crate) fn attach(&mut self, connection: ConnectionId) {
        debug_assert!(self.is_output() || self.connections.is_empty());
        if !self.connections.contains(&connection) {
            self.connections.push(connection);
        }
    }

    pub(crate) fn detach(&mut self, connection: ConnectionId) -> bool {
        match self.connections.iter().position(|c| *c == connection) {
            Some(index) => {
                self.connections.remove(index);
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} ({}, {})",
            self.owner, self.name, self.direction, self.data_type
        )
    }
}
