//! Mutation Protocol
//!
//! Operations come in two categories. Query operations are ordinary methods
//! on the typed views and only read the live tree. Mutating operations are
//! listed in a per-view-kind `OperationTable` and always go through
//! `Store::invoke`, which either dispatches them as actions or, inside a
//! reduction, runs them against the staged tree.
//!
//! A `Transform` receives the current sub-state and returns the next one.
//! Returning the identical node (see `Node::same`) means "no change" and
//! commits nothing. A `Direct` operation runs against the view itself and
//! writes through the store as it goes.

use crate::action::{Arg, AsyncArg};
use crate::error::StoreError;
use crate::tree::Node;
use crate::view::{Outcome, Unpacked, View};
use std::rc::Rc;
use tracing::trace;

/// Pure transform: `(view, current sub-state, args, result bag) -> next sub-state`.
pub type TransformFn = fn(&Rc<View>, &Node, &[Arg], &mut ResultBag) -> Result<Node, StoreError>;

/// Operation applied directly against the view.
pub type DirectFn = fn(&Rc<View>, &[Arg]) -> Result<Outcome, StoreError>;

/// Setter behind a property assignment.
pub type SetterFn = fn(&Rc<View>, Node) -> Result<Outcome, StoreError>;

#[derive(Clone, Copy)]
pub enum OpKind {
    Transform(TransformFn),
    Direct(DirectFn),
}

/// One named mutating operation.
#[derive(Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub kind: OpKind,
    /// Pending arguments are awaited before the operation runs.
    pub auto_resolve: bool,
}

/// Property with custom assignment behavior (for example a sequence's `length`).
#[derive(Clone, Copy)]
pub struct Property {
    pub name: &'static str,
    pub set: SetterFn,
}

/// Operation catalog attached to a view kind.
pub struct OperationTable {
    pub kind: &'static str,
    pub operations: &'static [Operation],
    pub properties: &'static [Property],
}

impl OperationTable {
    pub fn operation(&self, name: &str) -> Option<&'static Operation> {
        self.operations.iter().find(|op| op.name == name)
    }

    pub fn property(&self, name: &str) -> Option<&'static Property> {
        self.properties.iter().find(|prop| prop.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.operations.iter().map(|op| op.name)
    }
}

/// Operations for view kinds that expose none.
pub static EMPTY_OPS: OperationTable = OperationTable {
    kind: "empty",
    operations: &[],
    properties: &[],
};

/// Where a transform leaves an explicit return value.
#[derive(Debug, Default)]
pub struct ResultBag {
    result: Option<Unpacked>,
}

impl ResultBag {
    pub fn set(&mut self, result: impl Into<Unpacked>) {
        self.result = Some(result.into());
    }

    pub fn is_set(&self) -> bool {
        self.result.is_some()
    }

    /// The explicit result, or the view itself for chained calls.
    pub fn into_outcome(self, view: &Rc<View>) -> Outcome {
        match self.result {
            Some(result) => Outcome::from(result),
            None => Outcome::View(view.clone()),
        }
    }
}

/// Await pending arguments one at a time, leftmost first.
///
/// There is no timeout: a value that never settles stalls this call
/// indefinitely. Callers that need a bound must race the returned future
/// against their own deadline.
pub async fn resolve_pending(mut args: Vec<AsyncArg>) -> Result<Vec<Arg>, StoreError> {
    while let Some(ix) = args.iter().position(AsyncArg::is_pending) {
        trace!(argument = ix, "Suspending on pending argument");
        let slot = std::mem::replace(&mut args[ix], AsyncArg::value(Node::UNDEFINED));
        if let AsyncArg::Pending(pending) = slot {
            let value = pending.await.map_err(StoreError::Rejected)?;
            args[ix] = AsyncArg::Ready(Arg::Value(value));
        }
    }
    Ok(args
        .into_iter()
        .filter_map(|arg| match arg {
            AsyncArg::Ready(arg) => Some(arg),
            AsyncArg::Pending(_) => None,
        })
        .collect())
}

/// Reject pending arguments on synchronous entry points.
pub fn ready_args(args: Vec<AsyncArg>) -> Result<Vec<Arg>, StoreError> {
    args.into_iter()
        .enumerate()
        .map(|(ix, arg)| match arg {
            AsyncArg::Ready(arg) => Ok(arg),
            AsyncArg::Pending(_) => Err(StoreError::InvalidArgument(format!(
                "argument {} is pending and the operation does not auto-resolve",
                ix
            ))),
        })
        .collect()
}

/// Integer argument at `ix`. Missing, undefined and null read as `None`;
/// NaN reads as zero.
pub fn int_arg(args: &[Arg], ix: usize, name: &str) -> Result<Option<i64>, StoreError> {
    match args.get(ix) {
        None => Ok(None),
        Some(Arg::Value(value)) if value.is_undefined() || *value == Node::NULL => Ok(None),
        Some(Arg::Value(value)) => match value.as_f64() {
            Some(n) if n.is_nan() => Ok(Some(0)),
            Some(n) => Ok(Some(n.trunc() as i64)),
            None => Err(StoreError::InvalidArgument(format!(
                "{} must be a number, got {}",
                name, value
            ))),
        },
        Some(Arg::Compare(_)) => Err(StoreError::InvalidArgument(format!(
            "{} must be a number, got a callback",
            name
        ))),
    }
}

/// Value argument at `ix`, `Undefined` when missing.
pub fn value_arg(args: &[Arg], ix: usize) -> Result<Node, StoreError> {
    match args.get(ix) {
        None => Ok(Node::UNDEFINED),
        Some(Arg::Value(value)) => Ok(value.clone()),
        Some(Arg::Compare(_)) => Err(StoreError::InvalidArgument(format!(
            "argument {} must be a value, got a callback",
            ix
        ))),
    }
}

/// Resolve a possibly negative position against `len`, clamped to `0..=len`.
pub fn clamp_relative(position: i64, len: usize) -> usize {
    if position < 0 {
        (len as i64 + position).max(0) as usize
    } else {
        (position as usize).min(len)
    }
}
