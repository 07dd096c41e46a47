//! Actions and operation arguments
//!
//! An `Action` is the unit handed to the dispatcher: a type string, the
//! path it targets, and either a value (assignment) or an argument list
//! (method call). Arguments are plain values or comparator callbacks;
//! `AsyncArg` adds values that are still pending.

use crate::error::StoreError;
use crate::tree::path::upper_snake;
use crate::tree::{Node, Path};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

/// Ordering callback over plain element values.
pub type Comparator = Rc<dyn Fn(&Node, &Node) -> Ordering>;

/// A resolved operation argument.
#[derive(Clone)]
pub enum Arg {
    Value(Node),
    Compare(Comparator),
}

impl Arg {
    pub fn value(value: impl Into<Node>) -> Self {
        Arg::Value(value.into())
    }

    pub fn compare(f: impl Fn(&Node, &Node) -> Ordering + 'static) -> Self {
        Arg::Compare(Rc::new(f))
    }

    pub fn as_value(&self) -> Option<&Node> {
        match self {
            Arg::Value(value) => Some(value),
            Arg::Compare(_) => None,
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(value) => write!(f, "Value({})", value),
            Arg::Compare(_) => write!(f, "Compare(<fn>)"),
        }
    }
}

/// Pending argument: settles to a value or is rejected with a reason.
pub type PendingValue = LocalBoxFuture<'static, Result<Node, String>>;

/// An argument that may still be pending.
pub enum AsyncArg {
    Ready(Arg),
    Pending(PendingValue),
}

impl AsyncArg {
    pub fn value(value: impl Into<Node>) -> Self {
        AsyncArg::Ready(Arg::value(value))
    }

    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Node, String>> + 'static,
    {
        AsyncArg::Pending(future.boxed_local())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, AsyncArg::Pending(_))
    }
}

impl From<Arg> for AsyncArg {
    fn from(arg: Arg) -> Self {
        AsyncArg::Ready(arg)
    }
}

impl fmt::Debug for AsyncArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsyncArg::Ready(arg) => write!(f, "Ready({:?})", arg),
            AsyncArg::Pending(_) => write!(f, "Pending"),
        }
    }
}

/// Unit of work handed to the dispatcher.
#[derive(Debug, Clone)]
pub struct Action {
    pub action_type: String,
    /// `None` for host bookkeeping actions the store passes through.
    pub path: Option<Path>,
    pub value: Option<Node>,
    pub args: Option<Vec<Arg>>,
}

impl Action {
    /// Pathless action used to seed a dispatcher with the default state.
    pub fn init() -> Self {
        Action {
            action_type: "@@treelens/INIT".to_string(),
            path: None,
            value: None,
            args: None,
        }
    }

    /// Plain assignment of `value` at `path`.
    pub fn set(path: Path, value: Node) -> Self {
        Action {
            action_type: set_type(&path),
            path: Some(path),
            value: Some(value),
            args: None,
        }
    }

    /// Method call; the last path segment names the operation.
    pub fn method(action_type: impl Into<String>, path: Path, args: Vec<Arg>) -> Self {
        Action {
            action_type: action_type.into(),
            path: Some(path),
            value: None,
            args: Some(args),
        }
    }

    /// Property assignment through a view; the last segment names the property.
    pub fn assign(action_type: impl Into<String>, path: Path, value: Node) -> Self {
        Action {
            action_type: action_type.into(),
            path: Some(path),
            value: Some(value),
            args: None,
        }
    }

    pub fn is_plain_assignment(&self) -> bool {
        match (&self.path, &self.value) {
            (Some(path), Some(_)) => self.action_type == set_type(path),
            _ => false,
        }
    }
}

/// `SET_<derived path name>`
pub fn set_type(path: &Path) -> String {
    format!("SET_{}", path.action_name())
}

/// `<OPERATION>_<derived view path name>`
pub fn method_type(operation: &str, view_path: &Path) -> String {
    format!("{}_{}", upper_snake(operation), view_path.action_name())
}

/// `ASSIGN_<PROPERTY>_<derived view path name>`
pub fn assign_type(property: &str, view_path: &Path) -> String {
    format!("ASSIGN_{}_{}", upper_snake(property), view_path.action_name())
}

/// Serializable action shape: `{ type, path, value?, args? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireAction {
    /// Derived from the path when omitted.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Node>>,
}

/// A present `value` field is `Some` even when it is `null`.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Node>, D::Error> {
    Node::deserialize(deserializer).map(Some)
}

impl WireAction {
    pub fn into_action(self) -> Action {
        let action_type = match (&self.action_type, &self.path) {
            (Some(action_type), _) => action_type.clone(),
            (None, Some(path)) if self.args.is_some() => match path.split_last() {
                Some((operation, view_path)) => method_type(&operation.as_name(), &view_path),
                None => set_type(path),
            },
            (None, Some(path)) => set_type(path),
            (None, None) => Action::init().action_type,
        };
        Action {
            action_type,
            path: self.path,
            value: self.value,
            args: self
                .args
                .map(|args| args.into_iter().map(Arg::Value).collect()),
        }
    }
}

impl TryFrom<&Action> for WireAction {
    type Error = StoreError;

    fn try_from(action: &Action) -> Result<Self, Self::Error> {
        let args = match &action.args {
            Some(args) => Some(
                args.iter()
                    .map(|arg| {
                        arg.as_value().cloned().ok_or_else(|| {
                            StoreError::InvalidArgument(format!(
                                "{} carries a callback and has no wire form",
                                action.action_type
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        Ok(WireAction {
            action_type: Some(action.action_type.clone()),
            path: action.path.clone(),
            value: action.value.clone(),
            args,
        })
    }
}
