//! The Graph
//!
//! [`Graph`] owns every node and connection. Ports only hold connection ids,
//! and the graph is the single place that attaches and detaches them, so the
//! connection map and the per-port connection lists cannot drift apart.
//!
//! Every mutation is atomic: validation happens before anything is touched,
//! and a rejected call leaves nodes, connections, and dirty flags as they
//! were.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

use super::connection::{Connection, ConnectionId, PortAddress};
use super::node::{Node, NodeId};
use super::port::{Port, PortDirection};
use super::scheduler::{self, DependencyView};
use crate::config::GraphConfig;
use crate::error::{Cycle, GraphError, Missing, Result};
use crate::registry::NodeRegistry;
use crate::value::Value;

/// A directed acyclic graph of processing nodes.
#[derive(Debug)]
pub struct Graph {
    /// All nodes, indexed by ID. Ids are handed out in increasing order, so
    /// iteration order is ascending id order.
    pub(super) nodes: IndexMap<NodeId, Node>,

    /// All connections, indexed by ID.
    connections: IndexMap<ConnectionId, Connection>,

    next_node_id: u64,
    next_connection_id: u64,
}

impl Graph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            connections: IndexMap::new(),
            next_node_id: GraphConfig::default().first_node_id,
            next_connection_id: 1,
        }
    }

    /// Create a new empty graph with explicit options.
    ///
    /// Fails with `InvalidConfig` when the options are rejected by
    /// [`GraphConfig::validate`].
    pub fn with_config(config: &GraphConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            nodes: IndexMap::with_capacity(config.node_capacity),
            connections: IndexMap::new(),
            next_node_id: config.first_node_id,
            next_connection_id: 1,
        })
    }

    // -----------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------

    /// Insert a node, assigning it a fresh id.
    ///
    /// Fails with `NodeIdsExhausted` once the counter reaches the id
    /// reserved for detached nodes; the graph is left unchanged.
    pub fn add_node(&mut self, mut node: Node) -> Result<NodeId> {
        let id = NodeId::from(self.next_node_id);
        if !id.is_attached() {
            warn!(next = self.next_node_id, "node ids exhausted");
            return Err(GraphError::NodeIdsExhausted);
        }
        self.next_node_id = self
            .next_node_id
            .checked_add(1)
            .ok_or(GraphError::NodeIdsExhausted)?;

        node.bind(id);
        debug!(node = %id, name = node.name(), kind = node.type_name(), "node added");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Instantiate a registered node type and insert it.
    pub fn create_node(
        &mut self,
        registry: &NodeRegistry,
        type_name: &str,
        name: impl Into<String>,
    ) -> Result<NodeId> {
        let node = registry.create(type_name, name)?;
        self.add_node(node)
    }

    /// Remove a node and every connection touching it.
    ///
    /// Nodes that lose an input through this are marked dirty.
    pub fn remove_node(&mut self, id: NodeId) -> Result<Node> {
        let removed = self.disconnect_all(id)?;
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))?;
        debug!(node = %id, name = node.name(), connections = removed, "node removed");
        Ok(node)
    }

    /// Remove every connection attached to any port of `id`.
    ///
    /// Returns how many connections were removed.
    pub fn disconnect_all(&mut self, id: NodeId) -> Result<usize> {
        let node = self.node_or_err(id)?;
        let attached: BTreeSet<ConnectionId> = node
            .ports()
            .flat_map(|port| port.connections().iter().copied())
            .collect();

        for connection in &attached {
            self.remove_connection(*connection)?;
        }
        Ok(attached.len())
    }

    /// Get a reference to a node.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// All nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Change a node's display name. Cached results stay valid.
    pub fn rename_node(&mut self, id: NodeId, name: impl Into<String>) -> Result<()> {
        self.nodes
            .get_mut(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))?
            .set_name(name);
        Ok(())
    }

    /// Set a parameter and invalidate the node if the value changed.
    ///
    /// Setting a parameter the node type never declared is allowed but
    /// logged. Returns whether the stored value changed.
    pub fn set_parameter(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<bool> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))?;

        if node.parameter(name).is_none() {
            warn!(node = %id, parameter = name, "setting undeclared parameter");
        }
        let changed = node.store_parameter(name, value.into());
        if changed {
            debug!(node = %id, parameter = name, "parameter changed");
            self.mark_dirty(id)?;
        }
        Ok(changed)
    }

    fn node_or_err(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))
    }

    // -----------------------------------------------------------------
    // Ports
    // -----------------------------------------------------------------

    /// Look up a port by node, direction, and name.
    pub fn port(&self, id: NodeId, direction: PortDirection, name: &str) -> Result<&Port> {
        self.node_or_err(id)?
            .port(direction, name)
            .ok_or_else(|| missing_port(id, name))
    }

    /// Look up a port by name, preferring `direction`.
    ///
    /// Falls back to the opposite direction so a caller who names an input
    /// as a connection source gets a direction error rather than "not
    /// found".
    fn resolve_port(&self, id: NodeId, direction: PortDirection, name: &str) -> Result<&Port> {
        let node = self.node_or_err(id)?;
        let opposite = match direction {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        };
        node.port(direction, name)
            .or_else(|| node.port(opposite, name))
            .ok_or_else(|| missing_port(id, name))
    }

    /// Current data visible at a port.
    ///
    /// An input reads whatever its upstream output last produced, or `None`
    /// when unconnected or the upstream has produced nothing. An output
    /// reads its own slot. Never triggers evaluation.
    pub fn read_port(
        &self,
        id: NodeId,
        direction: PortDirection,
        name: &str,
    ) -> Result<Option<&Value>> {
        let port = self.port(id, direction, name)?;
        Ok(match direction {
            PortDirection::Input => self.upstream_value(port),
            PortDirection::Output => port.data(),
        })
    }

    /// Cached value of an output, `None` while the node is dirty.
    pub fn cached_output(&self, id: NodeId, name: &str) -> Result<Option<&Value>> {
        let node = self.node_or_err(id)?;
        if node.output(name).is_none() {
            return Err(missing_port(id, name));
        }
        Ok(node.cached_output(name))
    }

    /// Value most recently produced upstream of an input port.
    pub(super) fn upstream_value(&self, input: &Port) -> Option<&Value> {
        let connection = self.connections.get(input.connections().first()?)?;
        let source = connection.source();
        self.nodes.get(&source.node)?.output(&source.port)?.data()
    }

    // -----------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------

    /// Connect an output port to an input port.
    ///
    /// Fails with `NotFound` if a node or port is missing,
    /// `InvalidConnection` if the ports are incompatible, and
    /// `CycleDetected` if the destination already reaches the source. On
    /// success the destination and everything downstream of it turn dirty.
    pub fn add_connection(
        &mut self,
        out_node: NodeId,
        out_port: &str,
        in_node: NodeId,
        in_port: &str,
    ) -> Result<ConnectionId> {
        let source = self.resolve_port(out_node, PortDirection::Output, out_port)?;
        let destination = self.resolve_port(in_node, PortDirection::Input, in_port)?;

        if let Err(reason) = source.can_connect_to(destination) {
            warn!(from = %source, to = %destination, %reason, "connection rejected");
            return Err(reason.into());
        }

        if scheduler::reaches(self, in_node, out_node) {
            warn!(from = %out_node, to = %in_node, "connection would close a cycle");
            return Err(GraphError::CycleDetected(Cycle::WouldClose {
                from: out_node,
                to: in_node,
            }));
        }

        let id = ConnectionId::from(self.next_connection_id);
        self.next_connection_id += 1;

        let connection = Connection::new(
            id,
            PortAddress::new(out_node, out_port),
            PortAddress::new(in_node, in_port),
        );
        self.attach(&connection);
        debug!(connection = %id, edge = %connection, "connection added");
        self.connections.insert(id, connection);

        self.mark_dirty(in_node)?;
        Ok(id)
    }

    /// Remove a connection, detaching it from both ports.
    ///
    /// Cached data on either port is kept; the destination and everything
    /// downstream of it turn dirty.
    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<Connection> {
        let connection = self
            .connections
            .shift_remove(&id)
            .ok_or(GraphError::NotFound(Missing::Connection(id)))?;

        self.detach(&connection);
        debug!(connection = %id, edge = %connection, "connection removed");

        let destination = connection.destination().node;
        if self.contains_node(destination) {
            self.mark_dirty(destination)?;
        }
        Ok(connection)
    }

    /// Get a connection by id.
    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// All connections in creation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Id of the connection between two named ports, if one exists.
    pub fn find_connection(
        &self,
        out_node: NodeId,
        out_port: &str,
        in_node: NodeId,
        in_port: &str,
    ) -> Option<ConnectionId> {
        let input = self.node(in_node)?.input(in_port)?;
        let id = *input.connections().first()?;
        let source = self.connections.get(&id)?.source();
        (source.node == out_node && source.port == out_port).then_some(id)
    }

    fn attach(&mut self, connection: &Connection) {
        let id = connection.id();
        self.with_port(connection.source(), PortDirection::Output, |port| {
            port.attach(id)
        });
        self.with_port(connection.destination(), PortDirection::Input, |port| {
            port.attach(id)
        });
    }

    fn detach(&mut self, connection: &Connection) {
        let id = connection.id();
        self.with_port(connection.source(), PortDirection::Output, |port| {
            port.detach(id);
        });
        self.with_port(connection.destination(), PortDirection::Input, |port| {
            port.detach(id);
        });
    }

    fn with_port(
        &mut self,
        address: &PortAddress,
        direction: PortDirection,
        f: impl FnOnce(&mut Port),
    ) {
        if let Some(port) = self
            .nodes
            .get_mut(&address.node)
            .and_then(|node| node.port_mut(direction, &address.port))
        {
            f(port);
        }
    }

    // -----------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------

    /// Distinct nodes feeding `id`, ascending.
    pub fn dependencies(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let upstream: BTreeSet<NodeId> = node
            .inputs()
            .flat_map(|port| port.connections().iter())
            .filter_map(|c| self.connections.get(c))
            .map(|c| c.source().node)
            .collect();
        upstream.into_iter().collect()
    }

    /// Distinct nodes fed by `id`, ascending.
    pub fn dependents(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let downstream: BTreeSet<NodeId> = node
            .outputs()
            .flat_map(|port| port.connections().iter())
            .filter_map(|c| self.connections.get(c))
            .map(|c| c.destination().node)
            .collect();
        downstream.into_iter().collect()
    }

    /// Nodes nothing depends on. These are the roots of a full evaluation.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| !node.outputs().any(Port::is_connected))
            .map(Node::id)
            .collect()
    }

    // -----------------------------------------------------------------
    // Dirty state
    // -----------------------------------------------------------------

    /// Whether a node's cached outputs are stale.
    pub fn is_dirty(&self, id: NodeId) -> Result<bool> {
        Ok(self.node_or_err(id)?.is_dirty())
    }

    /// Mark a node dirty along with everything downstream of it.
    ///
    /// The walk stops at nodes that are already dirty: a dirty node's
    /// dependents are always dirty too, so there is nothing past it to mark.
    pub fn mark_dirty(&mut self, id: NodeId) -> Result<()> {
        self.nodes
            .get_mut(&id)
            .ok_or(GraphError::NotFound(Missing::Node(id)))?
            .mark_dirty();

        let mut stack = self.dependents(id);
        let mut marked = 0usize;
        while let Some(next) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&next) else {
                continue;
            };
            if node.mark_dirty() {
                marked += 1;
                stack.extend(self.dependents(next));
            }
        }

        trace!(node = %id, downstream = marked, "marked dirty");
        Ok(())
    }

    /// Mark every node dirty, forcing a full recomputation.
    pub fn clear_cache(&mut self) {
        for node in self.nodes.values_mut() {
            node.mark_dirty();
        }
        debug!(nodes = self.nodes.len(), "cache cleared");
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyView for Graph {
    fn dependencies(&self, node: NodeId) -> Vec<NodeId> {
        Graph::dependencies(self, node)
    }

    fn dependents(&self, node: NodeId) -> Vec<NodeId> {
        Graph::dependents(self, node)
    }
}

fn missing_port(node: NodeId, port: &str) -> GraphError {
    GraphError::NotFound(Missing::Port {
        node,
        port: port.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConnectionRejection, ProcessError};
    use crate::graph::{PortSpec, ProcessContext, Processor};
    use crate::value::DataType;

    /// Ports only; never processed in these tests.
    struct Shape(Vec<PortSpec>);

    impl Processor for Shape {
        fn type_name(&self) -> &str {
            "shape"
        }

        fn ports(&self) -> Vec<PortSpec> {
            self.0.clone()
        }

        fn process(&self, _ctx: &mut ProcessContext<'_>) -> std::result::Result<(), ProcessError> {
            Ok(())
        }
    }

    fn source() -> Node {
        Node::new("Input", Box::new(Shape(vec![PortSpec::output("out", DataType::Int)]))).unwrap()
    }

    fn process() -> Node {
        Node::new(
            "Process",
            Box::new(Shape(vec![
                PortSpec::input("in1", DataType::Int),
                PortSpec::input("in2", DataType::Text),
                PortSpec::output("res", DataType::Int),
            ])),
        )
        .unwrap()
    }

    fn sink() -> Node {
        Node::new(
            "Output",
            Box::new(Shape(vec![PortSpec::input("final_in", DataType::Int)])),
        )
        .unwrap()
    }

    fn clean_all(graph: &mut Graph) {
        for node in graph.nodes.values_mut() {
            node.mark_clean();
        }
    }

    #[test]
    fn graph_starts_empty() {
        let graph = Graph::new();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(source()).unwrap();
        assert_eq!(a, NodeId::from(1));
        assert_eq!(b, NodeId::from(2));

        graph.remove_node(b).unwrap();
        let c = graph.add_node(source()).unwrap();
        assert_eq!(c, NodeId::from(3));
        assert!(graph.node(b).is_none());
        assert!(matches!(
            graph.remove_node(b),
            Err(GraphError::NotFound(Missing::Node(id))) if id == b
        ));
    }

    #[test]
    fn config_sets_the_first_id() {
        let mut graph = Graph::with_config(&GraphConfig {
            first_node_id: 100,
            node_capacity: 8,
        })
        .unwrap();
        assert_eq!(graph.add_node(source()).unwrap(), NodeId::from(100));
    }

    #[test]
    fn reserved_first_id_is_rejected_by_with_config() {
        let config = GraphConfig {
            first_node_id: NodeId::DETACHED.raw(),
            ..GraphConfig::default()
        };
        assert!(matches!(
            Graph::with_config(&config),
            Err(GraphError::InvalidConfig(_))
        ));
    }

    #[test]
    fn exhausted_ids_fail_without_panicking() {
        let mut graph = Graph::with_config(&GraphConfig {
            first_node_id: u64::MAX - 1,
            ..GraphConfig::default()
        })
        .unwrap();

        let last = graph.add_node(source()).unwrap();
        assert_eq!(last, NodeId::from(u64::MAX - 1));
        assert!(last.is_attached());

        assert!(matches!(
            graph.add_node(source()),
            Err(GraphError::NodeIdsExhausted)
        ));
        assert_eq!(graph.node_count(), 1);
        assert!(graph.nodes().all(|node| node.id().is_attached()));
    }

    #[test]
    fn added_node_ports_know_their_owner() {
        let mut graph = Graph::new();
        let id = graph.add_node(process()).unwrap();
        let port = graph.port(id, PortDirection::Input, "in1").unwrap();
        assert_eq!(port.owner(), id);
        assert_eq!(graph.node(id).unwrap().id(), id);
    }

    #[test]
    fn valid_connection_registers_on_both_ports() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();

        let conn = graph.add_connection(a, "out", b, "in1").unwrap();

        assert_eq!(graph.connection_count(), 1);
        let out = graph.port(a, PortDirection::Output, "out").unwrap();
        let inp = graph.port(b, PortDirection::Input, "in1").unwrap();
        assert_eq!(out.connections(), &[conn]);
        assert_eq!(inp.connections(), &[conn]);
        assert_eq!(graph.find_connection(a, "out", b, "in1"), Some(conn));
        assert_eq!(graph.dependencies(b), vec![a]);
        assert_eq!(graph.dependents(a), vec![b]);
    }

    #[test]
    fn unknown_nodes_and_ports_are_not_found() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();
        let ghost = NodeId::from(99);

        for result in [
            graph.add_connection(ghost, "out", b, "in1"),
            graph.add_connection(a, "out", ghost, "in1"),
            graph.add_connection(a, "bad_port", b, "in1"),
            graph.add_connection(a, "out", b, "bad_port"),
        ] {
            assert!(matches!(result, Err(GraphError::NotFound(_))));
        }
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();

        let err = graph.add_connection(a, "out", b, "in2").unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidConnection(ConnectionRejection::TypeMismatch { .. })
        ));
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn occupied_input_is_rejected_without_side_effects() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();
        let a2 = graph.add_node(source()).unwrap();
        graph.add_connection(a, "out", b, "in1").unwrap();
        clean_all(&mut graph);

        let err = graph.add_connection(a2, "out", b, "in1").unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidConnection(ConnectionRejection::InputOccupied)
        ));
        assert_eq!(graph.connection_count(), 1);
        assert!(!graph.port(a2, PortDirection::Output, "out").unwrap().is_connected());
        assert!(!graph.is_dirty(b).unwrap());
    }

    #[test]
    fn input_used_as_source_is_a_direction_mismatch() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let c = graph.add_node(sink()).unwrap();

        let err = graph.add_connection(c, "final_in", a, "out").unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidConnection(ConnectionRejection::DirectionMismatch)
        ));
    }

    #[test]
    fn cycles_are_rejected_eagerly() {
        let mut graph = Graph::new();
        let p1 = graph.add_node(process()).unwrap();
        let p2 = graph.add_node(process()).unwrap();
        graph.add_connection(p1, "res", p2, "in1").unwrap();
        clean_all(&mut graph);

        let err = graph.add_connection(p2, "res", p1, "in1").unwrap_err();
        assert!(matches!(
            err,
            GraphError::CycleDetected(Cycle::WouldClose { from, to }) if from == p2 && to == p1
        ));
        assert!(!err.is_fatal());
        assert_eq!(graph.connection_count(), 1);
        assert!(!graph.is_dirty(p1).unwrap());
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut graph = Graph::new();
        let p = graph.add_node(process()).unwrap();
        let err = graph.add_connection(p, "res", p, "in1").unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidConnection(ConnectionRejection::SameNode)
        ));
    }

    #[test]
    fn removing_a_connection_detaches_and_dirties() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();
        let c = graph.add_node(sink()).unwrap();
        let conn = graph.add_connection(a, "out", b, "in1").unwrap();
        graph.add_connection(b, "res", c, "final_in").unwrap();
        clean_all(&mut graph);

        let removed = graph.remove_connection(conn).unwrap();
        assert_eq!(removed.source().node, a);
        assert_eq!(graph.connection_count(), 1);
        assert!(!graph.port(a, PortDirection::Output, "out").unwrap().is_connected());
        assert!(!graph.port(b, PortDirection::Input, "in1").unwrap().is_connected());
        assert!(!graph.is_dirty(a).unwrap());
        assert!(graph.is_dirty(b).unwrap());
        assert!(graph.is_dirty(c).unwrap());

        assert!(matches!(
            graph.remove_connection(conn),
            Err(GraphError::NotFound(Missing::Connection(_)))
        ));
    }

    #[test]
    fn removing_a_node_removes_its_connections() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();
        let c = graph.add_node(sink()).unwrap();
        graph.add_connection(a, "out", b, "in1").unwrap();
        graph.add_connection(b, "res", c, "final_in").unwrap();
        clean_all(&mut graph);

        let node = graph.remove_node(b).unwrap();
        assert_eq!(node.name(), "Process");
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.connection_count(), 0);
        assert!(!graph.port(a, PortDirection::Output, "out").unwrap().is_connected());
        assert!(!graph.port(c, PortDirection::Input, "final_in").unwrap().is_connected());
        assert!(graph.is_dirty(c).unwrap());
        assert!(!graph.is_dirty(a).unwrap());
    }

    #[test]
    fn mark_dirty_reaches_downstream_only() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();
        let c = graph.add_node(sink()).unwrap();
        let other = graph.add_node(source()).unwrap();
        graph.add_connection(a, "out", b, "in1").unwrap();
        graph.add_connection(b, "res", c, "final_in").unwrap();
        clean_all(&mut graph);

        graph.mark_dirty(b).unwrap();
        assert!(!graph.is_dirty(a).unwrap());
        assert!(graph.is_dirty(b).unwrap());
        assert!(graph.is_dirty(c).unwrap());
        assert!(!graph.is_dirty(other).unwrap());
    }

    #[test]
    fn parameter_changes_dirty_only_when_different() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        clean_all(&mut graph);

        assert!(graph.set_parameter(a, "gain", 2i64).unwrap());
        assert!(graph.is_dirty(a).unwrap());

        clean_all(&mut graph);
        assert!(!graph.set_parameter(a, "gain", 2i64).unwrap());
        assert!(!graph.is_dirty(a).unwrap());

        assert!(graph.set_parameter(NodeId::from(42), "gain", 1i64).is_err());
    }

    #[test]
    fn rename_keeps_cache_valid() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        clean_all(&mut graph);
        graph.rename_node(a, "Renamed").unwrap();
        assert_eq!(graph.node(a).unwrap().name(), "Renamed");
        assert!(!graph.is_dirty(a).unwrap());
    }

    #[test]
    fn clear_cache_dirties_everything() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let c = graph.add_node(sink()).unwrap();
        clean_all(&mut graph);
        graph.clear_cache();
        assert!(graph.is_dirty(a).unwrap());
        assert!(graph.is_dirty(c).unwrap());
    }

    #[test]
    fn sinks_are_nodes_without_dependents() {
        let mut graph = Graph::new();
        let a = graph.add_node(source()).unwrap();
        let b = graph.add_node(process()).unwrap();
        let lonely = graph.add_node(source()).unwrap();
        graph.add_connection(a, "out", b, "in1").unwrap();
        assert_eq!(graph.sinks(), vec![b, lonely]);
    }

    #[test]
    fn unconnected_input_reads_no_data() {
        let mut graph = Graph::new();
        let b = graph.add_node(process()).unwrap();
        assert_eq!(graph.read_port(b, PortDirection::Input, "in1").unwrap(), None);
        assert!(graph.cached_output(b, "res").unwrap().is_none());
        assert!(graph.cached_output(b, "nope").is_err());
    }
}
