//! Port Values
//!
//! Data flowing between nodes is dynamically typed. Every port declares a
//! [`DataType`] tag that is checked when a connection is made; the payload
//! itself is a [`Value`]. The engine never inspects payloads beyond their
//! tag, so collaborators can carry domain data (an image buffer, say) in
//! [`Value::Named`] under a tag of their choosing.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node's parameter bag, in declaration order.
pub type Parameters = IndexMap<String, Value>;

/// The declared data type of a port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Accepts and feeds every other type.
    Any,
    Bool,
    Int,
    Float,
    Text,
    Bytes,
    List,
    /// A collaborator-defined tag, e.g. `"image"`.
    Named(String),
}

impl DataType {
    /// Shorthand for [`DataType::Named`].
    pub fn named(tag: impl Into<String>) -> Self {
        DataType::Named(tag.into())
    }

    /// Two tags are compatible when they are equal or either one is `Any`.
    pub fn is_compatible_with(&self, other: &DataType) -> bool {
        matches!(self, DataType::Any) || matches!(other, DataType::Any) || self == other
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Any => f.write_str("any"),
            DataType::Bool => f.write_str("bool"),
            DataType::Int => f.write_str("int"),
            DataType::Float => f.write_str("float"),
            DataType::Text => f.write_str("text"),
            DataType::Bytes => f.write_str("bytes"),
            DataType::List => f.write_str("list"),
            DataType::Named(tag) => f.write_str(tag),
        }
    }
}

/// A value carried by a port or stored as a parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    /// Opaque collaborator payload under a named tag.
    Named { tag: String, data: Vec<u8> },
}

impl Value {
    /// The tag describing this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Bool(_) => DataType::Bool,
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Text(_) => DataType::Text,
            Value::Bytes(_) => DataType::Bytes,
            Value::List(_) => DataType::List,
            Value::Named { tag, .. } => DataType::Named(tag.clone()),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Integers widen to floats.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of a `Bytes` or `Named` payload.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Named { data, .. } => Some(data),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
