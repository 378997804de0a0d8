//! Dataflow Graph
//!
//! This module implements the graph of processing nodes, the ports and
//! connections that tie them together, and the machinery that decides what
//! runs and when.
//!
//! # Overview
//!
//! The graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are units of computation with named, typed ports
//! - Connections run from one output port to one input port; the
//!   destination node depends on the source node
//!
//! Any mutation marks the affected nodes and everything downstream of them
//! dirty. Evaluation then orders the dependency closure of the requested
//! target and recomputes only the dirty nodes, reusing cached outputs for
//! the rest.
//!
//! # Design Decisions
//!
//! 1. The graph owns every node and connection. Ports refer to their node
//!    and their connections by id, so removal is plain bookkeeping.
//!
//! 2. Cycles are rejected when a connection is added. The topological sort
//!    still checks for them before every evaluation and treats a hit as a
//!    fatal integrity error.
//!
//! 3. Node ids come from a per-graph counter and are never reused.

mod connection;
mod dataflow;
mod evaluate;
mod node;
mod port;
mod scheduler;

pub use connection::{Connection, ConnectionId, PortAddress};
pub use dataflow::Graph;
pub use evaluate::Evaluation;
pub use node::{DirtyState, Node, NodeId, ProcessContext, Processor};
pub use port::{Port, PortDirection, PortSpec};
pub use scheduler::{reaches, topological_sort, upstream_closure, DependencyView};
