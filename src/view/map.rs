//! Object-like view over a map node.

use crate::action::{Arg, AsyncArg};
use crate::error::StoreError;
use crate::protocol::{value_arg, OpKind, Operation, OperationTable, ResultBag};
use crate::tree::update::remove_map_key;
use crate::tree::{Key, Node};
use crate::view::{Outcome, Unpacked, View};
use std::rc::Rc;

pub static MAP_OPS: OperationTable = OperationTable {
    kind: "map",
    operations: &[
        Operation { name: "assign", kind: OpKind::Direct(assign), auto_resolve: false },
        Operation { name: "remove", kind: OpKind::Transform(remove), auto_resolve: false },
    ],
    properties: &[],
};

/// Copy every entry of the argument map into the view, one assignment per key.
fn assign(view: &Rc<View>, args: &[Arg]) -> Result<Outcome, StoreError> {
    let entries = value_arg(args, 0)?;
    let Some(entries) = entries.as_map() else {
        return Err(StoreError::InvalidArgument(format!("assign expects a map, got {}", entries)));
    };
    let store = view.store()?;
    for (name, value) in entries.iter() {
        let key = Key::from(name.as_str());
        store.put(&view.tree_path().child(key.clone()), view.pack_child(&key, value.clone()))?;
    }
    Ok(Outcome::View(view.clone()))
}

fn remove(_view: &Rc<View>, state: &Node, args: &[Arg], bag: &mut ResultBag) -> Result<Node, StoreError> {
    let name = match value_arg(args, 0)? {
        Node::Scalar(scalar) => Node::Scalar(scalar).to_js_string(),
        other => {
            return Err(StoreError::InvalidArgument(format!("remove expects a key, got {}", other)));
        }
    };
    let Some(entries) = state.as_map() else {
        return Err(StoreError::InvalidOperation(format!("remove expects a map, got {}", state)));
    };
    match entries.get(&name) {
        Some(removed) => {
            bag.set(removed.clone());
            Ok(remove_map_key(state, &name))
        }
        None => {
            bag.set(Node::UNDEFINED);
            Ok(state.clone())
        }
    }
}

#[derive(Debug, Clone)]
pub struct MapView {
    view: Rc<View>,
}

impl MapView {
    pub(crate) fn new(view: Rc<View>) -> Self {
        Self { view }
    }

    pub fn view(&self) -> &Rc<View> {
        &self.view
    }

    pub fn get(&self, name: &str) -> Unpacked {
        self.view.get(&Key::from(name))
    }

    pub fn keys(&self) -> Vec<String> {
        self.view
            .value()
            .as_map()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.view
            .value()
            .as_map()
            .is_some_and(|entries| entries.contains_key(name))
    }

    pub fn to_node(&self) -> Node {
        self.view.value()
    }

    /// Plain assignment of one entry.
    pub fn set(&self, name: &str, value: impl Into<Node>) -> Result<Outcome, StoreError> {
        self.view.set(&Key::from(name), value.into())
    }

    /// Assign several entries as a single action.
    pub fn assign<I, K, V>(&self, entries: I) -> Result<Outcome, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Node>,
    {
        self.view.call("assign", vec![AsyncArg::value(Node::map(entries))])
    }

    /// Remove an entry. The outcome holds the removed value.
    pub fn remove(&self, name: &str) -> Result<Outcome, StoreError> {
        self.view.call("remove", vec![AsyncArg::value(name)])
    }
}
