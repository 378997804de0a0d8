//! Connections
//!
//! A connection is a directed edge from one output port to one input port.
//! It is the unit of dependency: the destination node depends on the source
//! node. Connections are immutable; the graph validates them before they
//! exist and detaches them from both ports when they are removed.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::node::NodeId;

/// Graph-scoped connection identifier. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ConnectionId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A port named by its owning node and port name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortAddress {
    pub node: NodeId,
    pub port: String,
}

impl PortAddress {
    pub fn new(node: NodeId, port: impl Into<String>) -> Self {
        Self {
            node,
            port: port.into(),
        }
    }
}

impl fmt::Display for PortAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}

/// A committed edge between an output port and an input port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    id: ConnectionId,
    source: PortAddress,
    destination: PortAddress,
}

impl Connection {
    /// Only the graph creates connections, after validation.
    pub(crate) fn new(id: ConnectionId, source: PortAddress, destination: PortAddress) -> Self {
        debug_assert_ne!(source.node, destination.node);
        Self {
            id,
            source,
            destination,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// The output port feeding this connection.
    pub fn source(&self) -> &PortAddress {
        &self.source
    }

    /// The input port this connection feeds.
    pub fn destination(&self) -> &PortAddress {
        &self.destination
    }

    /// Whether either endpoint lives on `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source.node == node || self.destination.node == node
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Connection {
        Connection::new(
            ConnectionId::from(1),
            PortAddress::new(NodeId::from(1), "img"),
            PortAddress::new(NodeId::from(2), "img"),
        )
    }

    #[test]
    fn endpoints_are_preserved() {
        let conn = sample();
        assert_eq!(conn.id(), ConnectionId::from(1));
        assert_eq!(conn.source().node, NodeId::from(1));
        assert_eq!(conn.destination().port, "img");
    }

    #[test]
    fn touches_either_endpoint() {
        let conn = sample();
        assert!(conn.touches(NodeId::from(1)));
        assert!(conn.touches(NodeId::from(2)));
        assert!(!conn.touches(NodeId::from(3)));
    }

    #[test]
    fn display_reads_as_an_arrow() {
        assert_eq!(sample().to_string(), "#1.img -> #2.img");
    }
}
