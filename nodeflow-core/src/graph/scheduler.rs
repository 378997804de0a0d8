//! Scheduler
//!
//! The scheduler answers the structural questions evaluation needs: which
//! nodes a target depends on, whether one node reaches another, and in what
//! order a set of nodes can run so that dependencies come before dependents.
//!
//! # Algorithm
//!
//! Ordering uses Kahn's algorithm restricted to a node set:
//!
//! 1. Count, for each node in the set, its dependencies inside the set
//! 2. Seed the ready queue with every node whose count is zero
//! 3. Repeatedly pop the smallest ready id, emit it, and decrement its
//!    dependents; any that reach zero become ready
//! 4. Nodes never emitted sit on a cycle
//!
//! Popping the smallest id keeps the order deterministic for identical
//! structures.

use std::collections::{BTreeMap, BTreeSet};

use tracing::error;

use super::node::NodeId;
use crate::error::{Cycle, GraphError, Result};

/// Read-only adjacency over nodes.
///
/// Both lists are expected to be free of duplicates.
pub trait DependencyView {
    /// Nodes feeding `node` (upstream neighbours).
    fn dependencies(&self, node: NodeId) -> Vec<NodeId>;

    /// Nodes fed by `node` (downstream neighbours).
    fn dependents(&self, node: NodeId) -> Vec<NodeId>;
}

/// Whether `to` is reachable from `from` by following dependents.
///
/// Depth-first with an explicit stack. A node reaches itself.
pub fn reaches<V: DependencyView + ?Sized>(view: &V, from: NodeId, to: NodeId) -> bool {
    let mut visited = BTreeSet::new();
    let mut stack = vec![from];

    while let Some(node) = stack.pop() {
        if node == to {
            return true;
        }
        if !visited.insert(node) {
            continue;
        }
        stack.extend(
            view.dependents(node)
                .into_iter()
                .filter(|next| !visited.contains(next)),
        );
    }
    false
}

/// The roots together with every node upstream of them.
pub fn upstream_closure<V, I>(view: &V, roots: I) -> BTreeSet<NodeId>
where
    V: DependencyView + ?Sized,
    I: IntoIterator<Item = NodeId>,
{
    let mut closure = BTreeSet::new();
    let mut stack: Vec<NodeId> = roots.into_iter().collect();

    while let Some(node) = stack.pop() {
        if closure.insert(node) {
            stack.extend(view.dependencies(node));
        }
    }
    closure
}

/// Order `nodes` so every dependency precedes its dependents.
///
/// Edges leaving the set are ignored. Ties go to the smallest id. If some
/// nodes cannot be ordered they form a cycle, which the graph should have
/// made impossible; this is reported as a fatal
/// [`GraphError::CycleDetected`].
pub fn topological_sort<V: DependencyView + ?Sized>(
    view: &V,
    nodes: &BTreeSet<NodeId>,
) -> Result<Vec<NodeId>> {
    let mut in_degree: BTreeMap<NodeId, usize> = BTreeMap::new();
    let mut ready = BTreeSet::new();

    // Calculate in-degrees (only counting edges within the node set)
    for &node in nodes {
        let degree = view
            .dependencies(node)
            .iter()
            .filter(|dep| nodes.contains(*dep))
            .count();
        in_degree.insert(node, degree);
        if degree == 0 {
            ready.insert(node);
        }
    }

    let mut order = Vec::with_capacity(nodes.len());

    // Kahn's algorithm
    while let Some(node) = ready.pop_first() {
        order.push(node);

        for dependent in view.dependents(node) {
            if let Some(degree) = in_degree.get_mut(&dependent) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.insert(dependent);
                }
            }
        }
    }

    if order.len() < nodes.len() {
        let emitted: BTreeSet<_> = order.iter().copied().collect();
        let stuck: Vec<NodeId> = nodes.difference(&emitted).copied().collect();
        error!(nodes = ?stuck, "topological sort left nodes unordered");
        return Err(GraphError::CycleDetected(Cycle::Unsorted(stuck)));
    }

    Ok(order)
}
