//! Nodeflow Core
//!
//! This crate provides the execution engine behind a node-based processing
//! pipeline. It implements:
//!
//! - Typed ports and validated connections
//! - Eager cycle prevention and deterministic topological ordering
//! - Dirty-state propagation on every mutation
//! - Memoized, pull-based evaluation that re-runs only what changed
//!
//! Concrete node types (image loaders, filters, writers) live outside the
//! engine and plug in through the [`Processor`] trait. The engine knows
//! nothing about pixels, windows, or files.
//!
//! # Architecture
//!
//! - `graph`: nodes, ports, connections, ordering, and evaluation
//! - `value`: the dynamically typed values that flow through ports
//! - `registry`: concrete node types registered by name
//! - `config`: graph construction options
//! - `error`: the engine's error types
//!
//! # Example
//!
//! ```rust
//! use nodeflow_core::{
//!     DataType, Graph, Node, PortSpec, ProcessContext, ProcessError, Processor, Value,
//! };
//!
//! struct Constant(i64);
//!
//! impl Processor for Constant {
//!     fn type_name(&self) -> &str {
//!         "constant"
//!     }
//!
//!     fn ports(&self) -> Vec<PortSpec> {
//!         vec![PortSpec::output("value", DataType::Int)]
//!     }
//!
//!     fn process(&self, ctx: &mut ProcessContext<'_>) -> Result<(), ProcessError> {
//!         ctx.set_output("value", self.0)
//!     }
//! }
//!
//! let mut graph = Graph::new();
//! let id = graph.add_node(Node::new("Answer", Box::new(Constant(42)))?)?;
//!
//! graph.evaluate(Some(id))?;
//! assert_eq!(graph.cached_output(id, "value")?, Some(&Value::Int(42)));
//! # Ok::<(), nodeflow_core::GraphError>(())
//! ```
//!
//! # Threading
//!
//! Everything is single-threaded and synchronous. A host that shares a
//! graph across threads must serialize access itself.

pub mod config;
pub mod error;
pub mod graph;
pub mod registry;
pub mod value;

pub use config::GraphConfig;
pub use error::{ConnectionRejection, Cycle, GraphError, Missing, ProcessError, Result};
pub use graph::{
    Connection, ConnectionId, DirtyState, Evaluation, Graph, Node, NodeId, Port, PortAddress,
    PortDirection, PortSpec, ProcessContext, Processor,
};
pub use registry::NodeRegistry;
pub use value::{DataType, Parameters, Value};
