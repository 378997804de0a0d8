//! Node Type Registry
//!
//! Concrete node types are supplied by collaborators. The registry maps a
//! type name to a factory so hosts can instantiate nodes by name, e.g. when
//! a user picks "blur" from a menu or a saved graph is being rebuilt.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::{Missing, Result};
use crate::graph::{Node, Processor};

type Factory = Box<dyn Fn() -> Box<dyn Processor>>;

/// Factories for concrete node types, keyed by type name.
#[derive(Default)]
pub struct NodeRegistry {
    factories: BTreeMap<String, Factory>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `type_name`, replacing any previous one.
    pub fn register<F, P>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> P + 'static,
        P: Processor + 'static,
    {
        let type_name = type_name.into();
        debug!(kind = %type_name, "node type registered");
        let boxed: Factory = Box::new(move || Box::new(factory()) as Box<dyn Processor>);
        self.factories.insert(type_name, boxed);
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build a detached node of the given type.
    pub fn create(&self, type_name: &str, name: impl Into<String>) -> Result<Node> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| Missing::NodeType(type_name.to_owned()))?;
        Node::new(name, factory())
    }
}

impl fmt::Debug for NodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
