//! Persistent tree nodes
//!
//! A `Node` is either a map, a sequence or a scalar. Containers sit behind
//! `Arc`, so cloning a node never copies its children and two versions of a
//! tree share every subtree that was not rewritten between them.

use crate::tree::path::Key;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Leaf values
#[derive(Debug, Clone, Default)]
pub enum Scalar {
    /// Absent value. Never serialized as a map entry.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
}

/// A node of the persistent tree
#[derive(Debug, Clone)]
pub enum Node {
    Map(Arc<BTreeMap<String, Node>>),
    Seq(Arc<Vec<Node>>),
    Scalar(Scalar),
}

impl Default for Node {
    fn default() -> Self {
        Node::UNDEFINED
    }
}

impl Node {
    pub const UNDEFINED: Node = Node::Scalar(Scalar::Undefined);
    pub const NULL: Node = Node::Scalar(Scalar::Null);

    /// Build a sequence node from any iterator of values.
    pub fn seq<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Node>,
    {
        Node::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a map node from `(name, value)` pairs.
    pub fn map<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Node>,
    {
        Node::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Undefined))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Map(_) | Node::Seq(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Node::Scalar(Scalar::Number(n)) if n.is_nan())
    }

    pub fn as_seq(&self) -> Option<&Arc<Vec<Node>>> {
        match self {
            Node::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Arc<BTreeMap<String, Node>>> {
        match self {
            Node::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Scalar(Scalar::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Number of elements for sequences, `None` otherwise.
    pub fn seq_len(&self) -> Option<usize> {
        self.as_seq().map(|items| items.len())
    }

    /// Identity comparison.
    ///
    /// Containers are the same only if they are the same allocation; scalars
    /// compare by value, with numbers compared bit-for-bit so that a value is
    /// always the same as itself (NaN included). This is the commit signal
    /// for transforms: a transform that hands back a `same` node commits
    /// nothing.
    pub fn same(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Map(a), Node::Map(b)) => Arc::ptr_eq(a, b),
            (Node::Seq(a), Node::Seq(b)) => Arc::ptr_eq(a, b),
            (Node::Scalar(a), Node::Scalar(b)) => match (a, b) {
                (Scalar::Undefined, Scalar::Undefined) | (Scalar::Null, Scalar::Null) => true,
                (Scalar::Bool(x), Scalar::Bool(y)) => x == y,
                (Scalar::Number(x), Scalar::Number(y)) => x.to_bits() == y.to_bits(),
                (Scalar::String(x), Scalar::String(y)) => Arc::ptr_eq(x, y) || x == y,
                _ => false,
            },
            _ => false,
        }
    }

    /// Strict equality as used by element search: containers by identity,
    /// numbers by IEEE equality (so NaN never matches and `0 == -0`).
    pub fn strict_eq(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Scalar(Scalar::Number(x)), Node::Scalar(Scalar::Number(y))) => x == y,
            _ => self.same(other),
        }
    }

    /// Read one step down. Sequences expose their `length` as a number.
    pub fn child(&self, key: &Key) -> Node {
        match (self, key) {
            (Node::Map(entries), key) => entries
                .get(&*key.as_name())
                .cloned()
                .unwrap_or_default(),
            (Node::Seq(items), Key::Index(ix)) => items.get(*ix).cloned().unwrap_or_default(),
            (Node::Seq(items), Key::Name(name)) if name == "length" => {
                Node::from(items.len())
            }
            _ => Node::UNDEFINED,
        }
    }

    /// Descend by a key sequence; `Undefined` as soon as a segment is missing.
    pub fn get_in(&self, path: &[Key]) -> Node {
        let mut current = self.clone();
        for key in path {
            if current.is_undefined() {
                break;
            }
            current = current.child(key);
        }
        current
    }

    /// String conversion used by joins and the default sort order.
    pub fn to_js_string(&self) -> String {
        match self {
            Node::Scalar(Scalar::Undefined) => "undefined".to_string(),
            Node::Scalar(Scalar::Null) => "null".to_string(),
            Node::Scalar(Scalar::Bool(b)) => b.to_string(),
            Node::Scalar(Scalar::Number(n)) => format_number(*n),
            Node::Scalar(Scalar::String(s)) => s.to_string(),
            Node::Seq(items) => items
                .iter()
                .map(|item| match item {
                    Node::Scalar(Scalar::Undefined) | Node::Scalar(Scalar::Null) => String::new(),
                    other => other.to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Node::Map(_) => "[object Object]".to_string(),
        }
    }

    /// Convert to JSON. Undefined map entries are dropped, undefined
    /// elements and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Node::Scalar(Scalar::Undefined) | Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Number(n)) => {
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(Value::Number)
                        .unwrap_or(Value::Null)
                }
            }
            Node::Scalar(Scalar::String(s)) => Value::String(s.to_string()),
            Node::Seq(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Node::Map(entries) => Value::Object(
                entries
                    .iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{}", n)
    }
}

/// Deep value equality with an identity shortcut.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        if self.same(other) {
            return true;
        }
        match (self, other) {
            (Node::Map(a), Node::Map(b)) => a == b,
            (Node::Seq(a), Node::Seq(b)) => a == b,
            (Node::Scalar(Scalar::Number(x)), Node::Scalar(Scalar::Number(y))) => x == y,
            _ => false,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Node::NULL,
            Value::Bool(b) => Node::from(b),
            Value::Number(n) => Node::from(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Node::from(s),
            Value::Array(items) => Node::seq(items),
            Value::Object(entries) => Node::map(entries),
        }
    }
}

impl From<Scalar> for Node {
    fn from(scalar: Scalar) -> Self {
        Node::Scalar(scalar)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Scalar(Scalar::Bool(b))
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Scalar(Scalar::Number(n))
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Self {
        Node::from(n as f64)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::from(n as f64)
    }
}

impl From<usize> for Node {
    fn from(n: usize) -> Self {
        Node::from(n as f64)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Scalar(Scalar::String(Arc::from(s)))
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Scalar(Scalar::String(Arc::from(s)))
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::Seq(Arc::new(items))
    }
}

impl From<BTreeMap<String, Node>> for Node {
    fn from(entries: BTreeMap<String, Node>) -> Self {
        Node::Map(Arc::new(entries))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Node::from)
    }
}
