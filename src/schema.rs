//! Schema Types
//!
//! The store does not own a type system. It consumes one through the
//! `Schema` trait: shape, defaults, packing, validation, child types and
//! fixed arity. `types` provides a small set of concrete schemas that cover
//! the common shapes and can be built from JSON descriptors.

use crate::tree::{Key, Node};
use std::fmt;
use std::rc::Rc;

pub mod types;

pub use types::{from_descriptor, ArrayType, ObjectType, RefType, ScalarKind, ScalarType, TupleType};

/// Shared handle to a schema.
pub type SchemaRef = Rc<dyn Schema>;

/// Shape a schema projects onto its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Array-like view with the sequence operation table.
    Sequence,
    /// Object-like view with the map operation table.
    Map,
    /// Unpacked to the plain value, never cached.
    Scalar,
}

/// How an element is handed back when it leaves a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Value,
    Reference,
}

/// Identity of a schema as far as view reuse is concerned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeMoniker(Vec<String>);

impl TypeMoniker {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeMoniker(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Moniker of a schema nested in this one.
    pub fn nest(&self, inner: &TypeMoniker) -> TypeMoniker {
        let mut parts = self.0.clone();
        parts.extend(inner.0.iter().cloned());
        TypeMoniker(parts)
    }
}

impl fmt::Display for TypeMoniker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// Type collaborator consumed by the store and its views.
pub trait Schema: fmt::Debug {
    fn kind(&self) -> SchemaKind;

    fn moniker(&self) -> TypeMoniker;

    fn default_value(&self) -> Node;

    /// Normalize a plain value into the stored form of this type.
    fn pack(&self, value: Node) -> Node {
        value
    }

    /// Pack a value destined for element `index`.
    fn pack_prop(&self, index: usize, value: Node) -> Node {
        match self.prop_type(&Key::Index(index)) {
            Some(prop) => prop.pack(value),
            None => value,
        }
    }

    /// `None` when valid, otherwise a message describing the problem.
    fn validate_data(&self, value: &Node) -> Option<String>;

    /// Schema of the child at `key`, if this type declares one.
    fn prop_type(&self, key: &Key) -> Option<SchemaRef>;

    fn prop_kind(&self, index: usize) -> PropKind {
        match self.prop_type(&Key::Index(index)) {
            Some(prop) if prop.is_reference() => PropKind::Reference,
            _ => PropKind::Value,
        }
    }

    /// Element appended when a sequence is extended by a length assignment.
    fn default_rest_prop(&self) -> Node {
        Node::UNDEFINED
    }

    /// Fixed element count for tuple types.
    fn fixed_arity(&self) -> Option<usize> {
        None
    }

    fn is_reference(&self) -> bool {
        false
    }
}
