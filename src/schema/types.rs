//! Concrete schema types and JSON descriptor parsing

use crate::error::StoreError;
use crate::schema::{Schema, SchemaKind, SchemaRef, TypeMoniker};
use crate::tree::{Key, Node, Scalar};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Leaf value categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Any,
    Number,
    String,
    Bool,
}

impl ScalarKind {
    fn name(self) -> &'static str {
        match self {
            ScalarKind::Any => "any",
            ScalarKind::Number => "number",
            ScalarKind::String => "string",
            ScalarKind::Bool => "boolean",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScalarType {
    kind: ScalarKind,
    default: Node,
}

impl ScalarType {
    pub fn new(kind: ScalarKind) -> Self {
        let default = match kind {
            ScalarKind::Any => Node::UNDEFINED,
            ScalarKind::Number => Node::from(0),
            ScalarKind::String => Node::from(""),
            ScalarKind::Bool => Node::from(false),
        };
        Self { kind, default }
    }

    pub fn any() -> SchemaRef {
        Rc::new(Self::new(ScalarKind::Any))
    }

    pub fn number() -> SchemaRef {
        Rc::new(Self::new(ScalarKind::Number))
    }

    pub fn string() -> SchemaRef {
        Rc::new(Self::new(ScalarKind::String))
    }

    pub fn boolean() -> SchemaRef {
        Rc::new(Self::new(ScalarKind::Bool))
    }

    pub fn with_default(mut self, default: Node) -> Self {
        self.default = default;
        self
    }
}

impl Schema for ScalarType {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Scalar
    }

    fn moniker(&self) -> TypeMoniker {
        TypeMoniker::new([self.kind.name()])
    }

    fn default_value(&self) -> Node {
        self.default.clone()
    }

    fn validate_data(&self, value: &Node) -> Option<String> {
        let ok = match (self.kind, value) {
            (ScalarKind::Any, _) => true,
            (_, Node::Scalar(Scalar::Undefined)) => true,
            (ScalarKind::Number, Node::Scalar(Scalar::Number(_))) => true,
            (ScalarKind::String, Node::Scalar(Scalar::String(_))) => true,
            (ScalarKind::Bool, Node::Scalar(Scalar::Bool(_))) => true,
            _ => false,
        };
        if ok {
            None
        } else {
            Some(format!("expected {}, got {}", self.kind.name(), value))
        }
    }

    fn prop_type(&self, _key: &Key) -> Option<SchemaRef> {
        None
    }
}

/// Variable-length sequence of one element type.
#[derive(Debug, Clone)]
pub struct ArrayType {
    items: SchemaRef,
}

impl ArrayType {
    pub fn of(items: SchemaRef) -> Rc<Self> {
        Rc::new(Self { items })
    }
}

impl Schema for ArrayType {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Sequence
    }

    fn moniker(&self) -> TypeMoniker {
        TypeMoniker::new(["array"]).nest(&self.items.moniker())
    }

    fn default_value(&self) -> Node {
        Node::seq(Vec::<Node>::new())
    }

    fn pack(&self, value: Node) -> Node {
        if value.is_undefined() {
            self.default_value()
        } else {
            value
        }
    }

    fn validate_data(&self, value: &Node) -> Option<String> {
        let Some(items) = value.as_seq() else {
            return Some(format!("expected array, got {}", value));
        };
        items
            .iter()
            .enumerate()
            .find_map(|(ix, item)| {
                self.items
                    .validate_data(item)
                    .map(|msg| format!("[{}]: {}", ix, msg))
            })
    }

    fn prop_type(&self, key: &Key) -> Option<SchemaRef> {
        match key {
            Key::Index(_) => Some(self.items.clone()),
            Key::Name(_) => None,
        }
    }

    fn default_rest_prop(&self) -> Node {
        self.items.default_value()
    }
}

/// Fixed-arity sequence with one type per slot.
#[derive(Debug, Clone)]
pub struct TupleType {
    items: Vec<SchemaRef>,
}

impl TupleType {
    pub fn new(items: Vec<SchemaRef>) -> Rc<Self> {
        Rc::new(Self { items })
    }
}

impl Schema for TupleType {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Sequence
    }

    fn moniker(&self) -> TypeMoniker {
        self.items
            .iter()
            .fold(TypeMoniker::new(["tuple"]), |acc, item| acc.nest(&item.moniker()))
    }

    fn default_value(&self) -> Node {
        Node::seq(self.items.iter().map(|item| item.default_value()))
    }

    fn pack(&self, value: Node) -> Node {
        if value.is_undefined() {
            self.default_value()
        } else {
            value
        }
    }

    fn validate_data(&self, value: &Node) -> Option<String> {
        let Some(items) = value.as_seq() else {
            return Some(format!("expected tuple, got {}", value));
        };
        if items.len() != self.items.len() {
            return Some(format!(
                "expected tuple of {} elements, got {}",
                self.items.len(),
                items.len()
            ));
        }
        items
            .iter()
            .zip(&self.items)
            .enumerate()
            .find_map(|(ix, (item, ty))| ty.validate_data(item).map(|msg| format!("[{}]: {}", ix, msg)))
    }

    fn prop_type(&self, key: &Key) -> Option<SchemaRef> {
        key.as_index().and_then(|ix| self.items.get(ix).cloned())
    }

    fn fixed_arity(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Map with declared fields.
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    fields: BTreeMap<String, SchemaRef>,
}

impl ObjectType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, ty: SchemaRef) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    pub fn build(self) -> Rc<Self> {
        Rc::new(self)
    }
}

impl Schema for ObjectType {
    fn kind(&self) -> SchemaKind {
        SchemaKind::Map
    }

    fn moniker(&self) -> TypeMoniker {
        TypeMoniker::new(["object", self.name.as_str()])
    }

    fn default_value(&self) -> Node {
        Node::map(
            self.fields
                .iter()
                .map(|(name, ty)| (name.clone(), ty.default_value()))
                .filter(|(_, value)| !value.is_undefined()),
        )
    }

    /// Fills missing declared fields with their defaults.
    fn pack(&self, value: Node) -> Node {
        let Some(entries) = value.as_map() else {
            return if value.is_undefined() {
                self.default_value()
            } else {
                value
            };
        };
        let missing: Vec<(&String, &SchemaRef)> = self
            .fields
            .iter()
            .filter(|(name, _)| !entries.contains_key(*name))
            .collect();
        if missing.is_empty() {
            return value;
        }
        let mut copy = entries.as_ref().clone();
        for (name, ty) in missing {
            let default = ty.default_value();
            if !default.is_undefined() {
                copy.insert(name.clone(), default);
            }
        }
        Node::from(copy)
    }

    fn validate_data(&self, value: &Node) -> Option<String> {
        let Some(entries) = value.as_map() else {
            return Some(format!("expected object {}, got {}", self.name, value));
        };
        self.fields.iter().find_map(|(name, ty)| {
            let field = entries.get(name).cloned().unwrap_or_default();
            ty.validate_data(&field)
                .map(|msg| format!("{}.{}: {}", self.name, name, msg))
        })
    }

    fn prop_type(&self, key: &Key) -> Option<SchemaRef> {
        self.fields.get(&*key.as_name()).cloned()
    }
}

/// Marks the wrapped type as reference-kinded; elements removed from a
/// sequence of references are handed back as views rather than plain values.
#[derive(Debug, Clone)]
pub struct RefType {
    target: SchemaRef,
}

impl RefType {
    pub fn to(target: SchemaRef) -> Rc<Self> {
        Rc::new(Self { target })
    }
}

impl Schema for RefType {
    fn kind(&self) -> SchemaKind {
        self.target.kind()
    }

    fn moniker(&self) -> TypeMoniker {
        TypeMoniker::new(["ref"]).nest(&self.target.moniker())
    }

    fn default_value(&self) -> Node {
        self.target.default_value()
    }

    fn pack(&self, value: Node) -> Node {
        self.target.pack(value)
    }

    fn validate_data(&self, value: &Node) -> Option<String> {
        self.target.validate_data(value)
    }

    fn prop_type(&self, key: &Key) -> Option<SchemaRef> {
        self.target.prop_type(key)
    }

    fn default_rest_prop(&self) -> Node {
        self.target.default_rest_prop()
    }

    fn fixed_arity(&self) -> Option<usize> {
        self.target.fixed_arity()
    }

    fn is_reference(&self) -> bool {
        true
    }
}

/// Build a schema from a JSON descriptor.
///
/// Accepted forms: `"number"`, `"string"`, `"boolean"`, `"any"`, or an
/// object with a `type` of one of those (plus an optional `default`), or
/// `{"type": "array", "items": ..}`, `{"type": "tuple", "items": [..]}`,
/// `{"type": "object", "name": .., "properties": {..}}`,
/// `{"type": "ref", "target": ..}`.
pub fn from_descriptor(descriptor: &Value) -> Result<SchemaRef, StoreError> {
    let invalid = |msg: &str| StoreError::InvalidArgument(format!("{}: {}", msg, descriptor));

    if let Value::String(name) = descriptor {
        return scalar_from_name(name).map(|ty| Rc::new(ty) as SchemaRef).ok_or_else(|| invalid("Unknown schema type"));
    }

    let ty = descriptor
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("Schema descriptor needs a type"))?;

    match ty {
        "array" => {
            let items = descriptor.get("items").ok_or_else(|| invalid("Array descriptor needs items"))?;
            Ok(ArrayType::of(from_descriptor(items)?))
        }
        "tuple" => {
            let items = descriptor
                .get("items")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid("Tuple descriptor needs an items list"))?;
            let items = items.iter().map(from_descriptor).collect::<Result<Vec<_>, _>>()?;
            Ok(TupleType::new(items))
        }
        "object" => {
            let name = descriptor.get("name").and_then(Value::as_str).unwrap_or("object");
            let mut object = ObjectType::named(name);
            if let Some(properties) = descriptor.get("properties").and_then(Value::as_object) {
                for (field, sub) in properties {
                    object = object.field(field.clone(), from_descriptor(sub)?);
                }
            }
            Ok(object.build())
        }
        "ref" => {
            let target = descriptor.get("target").ok_or_else(|| invalid("Ref descriptor needs a target"))?;
            Ok(RefType::to(from_descriptor(target)?))
        }
        other => {
            let scalar = scalar_from_name(other).ok_or_else(|| invalid("Unknown schema type"))?;
            let scalar = match descriptor.get("default") {
                Some(default) => scalar.with_default(Node::from(default.clone())),
                None => scalar,
            };
            Ok(Rc::new(scalar))
        }
    }
}

fn scalar_from_name(name: &str) -> Option<ScalarType> {
    let kind = match name {
        "any" => ScalarKind::Any,
        "number" => ScalarKind::Number,
        "string" => ScalarKind::String,
        "boolean" => ScalarKind::Bool,
        _ => return None,
    };
    Some(ScalarType::new(kind))
}
