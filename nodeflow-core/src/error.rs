//! Engine error types.
//!
//! Mutation errors are local: a failed call leaves the graph exactly as it
//! was. The only fatal error is a cycle discovered while ordering nodes for
//! evaluation, which means an earlier validation was bypassed.

use std::fmt;

use thiserror::Error;

use crate::graph::{ConnectionId, NodeId, PortDirection};
use crate::value::DataType;

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors returned by graph mutation, query, and evaluation.
#[derive(Error, Debug)]
pub enum GraphError {
    /// A node id, port name, connection id, or node type could not be resolved.
    #[error("not found: {0}")]
    NotFound(Missing),

    /// The requested connection violates a port rule.
    #[error("invalid connection: {0}")]
    InvalidConnection(#[from] ConnectionRejection),

    /// A connection would close a cycle, or one was found at sort time.
    #[error("cycle detected: {0}")]
    CycleDetected(Cycle),

    /// A node's `process` implementation failed during evaluation.
    #[error("node {node} ({name}) failed: {source}")]
    ProcessingFailure {
        node: NodeId,
        name: String,
        #[source]
        source: ProcessError,
    },

    /// A node type declared the same port name twice in one direction.
    #[error("{direction} port '{port}' is declared more than once")]
    DuplicatePort {
        port: String,
        direction: PortDirection,
    },

    /// Construction options that cannot produce a usable graph.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Every assignable node id has been handed out.
    #[error("node ids exhausted")]
    NodeIdsExhausted,
}

impl GraphError {
    /// True for structural integrity violations that must not be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GraphError::CycleDetected(Cycle::Unsorted(_)))
    }
}

impl From<Missing> for GraphError {
    fn from(missing: Missing) -> Self {
        GraphError::NotFound(missing)
    }
}

/// What a failed lookup was looking for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Node(NodeId),
    Port { node: NodeId, port: String },
    Connection(ConnectionId),
    NodeType(String),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Node(id) => write!(f, "node {id}"),
            Missing::Port { node, port } => write!(f, "port '{port}' on node {node}"),
            Missing::Connection(id) => write!(f, "connection {id}"),
            Missing::NodeType(name) => write!(f, "node type '{name}'"),
        }
    }
}

/// Why two ports cannot be connected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    /// The source is not an output or the destination is not an input.
    #[error("connections must run from an output port to an input port")]
    DirectionMismatch,

    /// Both ports belong to the same node.
    #[error("source and destination belong to the same node")]
    SameNode,

    /// The declared data types are incompatible.
    #[error("type mismatch: {output} cannot feed {input}")]
    TypeMismatch { output: DataType, input: DataType },

    /// The destination input already has an incoming connection.
    #[error("input port is already connected")]
    InputOccupied,
}

/// Where a cycle was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// Adding `from -> to` would close a cycle because `to` already reaches `from`.
    WouldClose { from: NodeId, to: NodeId },

    /// Nodes left unsorted by the topological sort.
    Unsorted(Vec<NodeId>),
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cycle::WouldClose { from, to } => {
                write!(f, "connecting {from} -> {to} would close a cycle")
            }
            Cycle::Unsorted(nodes) => {
                write!(f, "{} node(s) could not be ordered: {nodes:?}", nodes.len())
            }
        }
    }
}

/// Error raised by a `Processor` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    /// A required input had no data.
    #[error("input '{0}' has no data")]
    MissingInput(String),

    /// The processor tried to write an output it does not declare.
    #[error("unknown output '{0}'")]
    UnknownOutput(String),

    /// An input or parameter held a value of the wrong shape.
    #[error("unexpected value for '{name}': expected {expected}")]
    UnexpectedValue { name: String, expected: DataType },

    /// Any other failure reported by the processor.
    #[error("{0}")]
    Failed(String),
}

impl ProcessError {
    pub fn failed(message: impl Into<String>) -> Self {
        ProcessError::Failed(message.into())
    }
}
