//! Views
//!
//! A view is a path-bound lens onto the live tree. It holds no snapshot:
//! every read goes back to the store. Sequence and map views share the same
//! `View` core and differ only in the operation table attached to it.

pub mod map;
pub mod sequence;

pub use map::{MapView, MAP_OPS};
pub use sequence::{SequenceView, SEQUENCE_OPS};

use crate::action::{assign_type, method_type, Arg, AsyncArg};
use crate::error::StoreError;
use crate::protocol::{ready_args, Operation, OperationTable, EMPTY_OPS};
use crate::schema::{SchemaKind, SchemaRef, TypeMoniker};
use crate::store::Store;
use crate::tree::{Key, Node, Path};
use std::fmt;
use std::rc::{Rc, Weak};

/// Path-bound lens with typed operations.
pub struct View {
    store: Weak<Store>,
    schema: SchemaRef,
    moniker: TypeMoniker,
    tree_path: Path,
    view_path: Path,
    parent: Option<Weak<View>>,
    ops: &'static OperationTable,
}

impl View {
    pub(crate) fn new(
        store: Weak<Store>,
        schema: SchemaRef,
        moniker: TypeMoniker,
        tree_path: Path,
        view_path: Path,
        parent: Option<&Rc<View>>,
    ) -> Rc<Self> {
        let ops = match schema.kind() {
            SchemaKind::Sequence => &SEQUENCE_OPS,
            SchemaKind::Map => &MAP_OPS,
            SchemaKind::Scalar => &EMPTY_OPS,
        };
        Rc::new(View {
            store,
            schema,
            moniker,
            tree_path,
            view_path,
            parent: parent.map(Rc::downgrade),
            ops,
        })
    }

    pub fn store(&self) -> Result<Rc<Store>, StoreError> {
        self.store.upgrade().ok_or_else(|| {
            StoreError::InvalidOperation(format!("store behind view \"{}\" was dropped", self.view_path))
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn moniker(&self) -> &TypeMoniker {
        &self.moniker
    }

    pub fn kind(&self) -> SchemaKind {
        self.schema.kind()
    }

    pub fn tree_path(&self) -> &Path {
        &self.tree_path
    }

    pub fn view_path(&self) -> &Path {
        &self.view_path
    }

    pub fn parent(&self) -> Option<Rc<View>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    pub fn operations(&self) -> &'static OperationTable {
        self.ops
    }

    /// Current node at this view's tree path.
    pub fn value(&self) -> Node {
        match self.store.upgrade() {
            Some(store) => store.get(&self.tree_path),
            None => Node::UNDEFINED,
        }
    }

    /// Child at `key`: a cached view for typed containers, the plain value
    /// otherwise. Missing children are always plain `Undefined`.
    pub fn get(self: &Rc<Self>, key: &Key) -> Unpacked {
        let Some(store) = self.store.upgrade() else {
            return Unpacked::Value(Node::UNDEFINED);
        };
        let tree_path = self.tree_path.child(key.clone());
        let Some(prop) = self.schema.prop_type(key) else {
            return Unpacked::Value(store.get(&tree_path));
        };
        if store.get(&tree_path).is_undefined() {
            return Unpacked::Value(Node::UNDEFINED);
        }
        store.unpack(prop, tree_path, self.view_path.child(key.clone()), None, Some(self))
    }

    /// Run a mutating operation by name.
    ///
    /// Pending arguments are refused here; use `call_async` for operations
    /// that accept them.
    pub fn call(self: &Rc<Self>, name: &str, args: Vec<AsyncArg>) -> Result<Outcome, StoreError> {
        let args = ready_args(args)?;
        self.invoke_operation(name, args)
    }

    /// Run a mutating operation, awaiting pending arguments first when the
    /// operation auto-resolves.
    pub async fn call_async(self: &Rc<Self>, name: &str, args: Vec<AsyncArg>) -> Result<Outcome, StoreError> {
        let operation = self.lookup(name)?;
        let store = self.store()?;
        let action_type = method_type(name, &self.view_path);
        let path = self.view_path.child(name);
        store
            .invoke_async(self, &action_type, &path, operation, args)
            .await
    }

    pub(crate) fn invoke_operation(self: &Rc<Self>, name: &str, args: Vec<Arg>) -> Result<Outcome, StoreError> {
        let operation = self.lookup(name)?;
        let store = self.store()?;
        let action_type = method_type(name, &self.view_path);
        store.invoke(self, &action_type, &self.view_path.child(name), operation, args)
    }

    fn lookup(&self, name: &str) -> Result<&'static Operation, StoreError> {
        self.ops.operation(name).ok_or_else(|| {
            StoreError::InvalidOperation(format!(
                "{} view at \"{}\" has no operation \"{}\"",
                self.ops.kind, self.view_path, name
            ))
        })
    }

    /// Assign a property through the view.
    ///
    /// Properties with a custom setter (a sequence's `length`) go through
    /// the mutation protocol as an `ASSIGN_*` action. Everything else is a
    /// plain assignment of the packed value.
    pub fn set(self: &Rc<Self>, key: &Key, value: Node) -> Result<Outcome, StoreError> {
        let store = self.store()?;
        let name = key.as_name();
        match self.ops.property(&name) {
            Some(property) => store.assign(
                self,
                &assign_type(&name, &self.view_path),
                &self.view_path.child(key.clone()),
                property,
                value,
            ),
            None => store.put(&self.tree_path.child(key.clone()), self.pack_child(key, value)),
        }
    }

    /// Property assignment inside a reduction, without verification.
    pub(crate) fn apply_prop(self: &Rc<Self>, key: &Key, value: Node) -> Result<Outcome, StoreError> {
        match self.ops.property(&key.as_name()) {
            Some(property) => (property.set)(self, value),
            None => self
                .store()?
                .put(&self.tree_path.child(key.clone()), self.pack_child(key, value)),
        }
    }

    pub(crate) fn pack_child(&self, key: &Key, value: Node) -> Node {
        match self.schema.prop_type(key) {
            Some(prop) => prop.pack(value),
            None => value,
        }
    }

    pub fn as_sequence(self: &Rc<Self>) -> Option<SequenceView> {
        (self.kind() == SchemaKind::Sequence).then(|| SequenceView::new(self.clone()))
    }

    pub fn as_map(self: &Rc<Self>) -> Option<MapView> {
        (self.kind() == SchemaKind::Map).then(|| MapView::new(self.clone()))
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("kind", &self.ops.kind)
            .field("moniker", &self.moniker.to_string())
            .field("tree_path", &self.tree_path.to_string())
            .field("view_path", &self.view_path.to_string())
            .finish()
    }
}

/// A child as handed out by the store: a plain value or a cached view.
#[derive(Debug, Clone)]
pub enum Unpacked {
    Value(Node),
    View(Rc<View>),
}

impl Unpacked {
    /// Plain data, reading through views.
    pub fn to_node(&self) -> Node {
        match self {
            Unpacked::Value(node) => node.clone(),
            Unpacked::View(view) => view.value(),
        }
    }

    pub fn as_view(&self) -> Option<&Rc<View>> {
        match self {
            Unpacked::View(view) => Some(view),
            Unpacked::Value(_) => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Unpacked::Value(node) => Some(node),
            Unpacked::View(_) => None,
        }
    }

    pub fn as_sequence(&self) -> Option<SequenceView> {
        self.as_view().and_then(|view| view.as_sequence())
    }

    pub fn as_map(&self) -> Option<MapView> {
        self.as_view().and_then(|view| view.as_map())
    }
}

/// Values compare by value, views by identity.
impl PartialEq for Unpacked {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Unpacked::Value(a), Unpacked::Value(b)) => a == b,
            (Unpacked::View(a), Unpacked::View(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<Node> for Unpacked {
    fn from(node: Node) -> Self {
        Unpacked::Value(node)
    }
}

impl From<Rc<View>> for Unpacked {
    fn from(view: Rc<View>) -> Self {
        Unpacked::View(view)
    }
}

/// Result of a mutation.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// No result: plain assignments and skipped invocations.
    Nothing,
    Value(Node),
    View(Rc<View>),
}

impl Outcome {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Outcome::Nothing)
    }

    pub fn value(&self) -> Option<&Node> {
        match self {
            Outcome::Value(node) => Some(node),
            _ => None,
        }
    }

    pub fn view(&self) -> Option<&Rc<View>> {
        match self {
            Outcome::View(view) => Some(view),
            _ => None,
        }
    }

    /// Plain data for any outcome; `Undefined` for `Nothing`.
    pub fn to_node(&self) -> Node {
        match self {
            Outcome::Nothing => Node::UNDEFINED,
            Outcome::Value(node) => node.clone(),
            Outcome::View(view) => view.value(),
        }
    }
}

impl From<Unpacked> for Outcome {
    fn from(unpacked: Unpacked) -> Self {
        match unpacked {
            Unpacked::Value(node) => Outcome::Value(node),
            Unpacked::View(view) => Outcome::View(view),
        }
    }
}

impl PartialEq for Outcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Outcome::Nothing, Outcome::Nothing) => true,
            (Outcome::Value(a), Outcome::Value(b)) => a == b,
            (Outcome::View(a), Outcome::View(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
