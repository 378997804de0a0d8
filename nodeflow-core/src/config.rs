//! Graph configuration.

use serde::Deserialize;

use crate::error::{GraphError, Result};
use crate::graph::NodeId;

/// Construction options for a [`Graph`](crate::Graph).
///
/// Deserializable so hosts can keep it alongside their own settings; every
/// field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Id handed to the first inserted node. Later ids count up from here.
    pub first_node_id: u64,

    /// Number of nodes to preallocate storage for.
    pub node_capacity: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            first_node_id: 1,
            node_capacity: 0,
        }
    }
}

impl GraphConfig {
    /// Reject options a graph cannot start from.
    pub fn validate(&self) -> Result<()> {
        if !NodeId::from(self.first_node_id).is_attached() {
            return Err(GraphError::InvalidConfig(format!(
                "first_node_id {} is reserved for detached nodes",
                self.first_node_id
            )));
        }
        Ok(())
    }
}
