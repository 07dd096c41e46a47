//! Action replay
//!
//! Applies a list of wire actions to a fresh store backed by an in-memory
//! dispatcher and reports the resulting tree.

use crate::action::WireAction;
use crate::dispatch::InMemoryDispatcher;
use crate::error::StoreError;
use crate::schema::from_descriptor;
use crate::store::{Store, StoreOptions};
use crate::tree::{Node, Path};
use tracing::{debug, info};

/// Outcome of a replay run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// Final tree, or the node at the requested path.
    pub value: Node,
    pub applied: usize,
    pub commits: u64,
}

/// Replay `actions` against `schema`, starting from `initial` or the
/// schema default. Stops at the first failing action.
pub fn replay(
    schema: &serde_json::Value,
    initial: Option<Node>,
    actions: Vec<WireAction>,
    path: Option<&Path>,
    options: StoreOptions,
) -> Result<ReplayReport, StoreError> {
    let schema = from_descriptor(schema)?;
    let store = Store::new(Some(schema), options)?;
    let dispatcher = InMemoryDispatcher::attach(&store, initial)?;

    let mut applied = 0;
    for wire in actions {
        let action = wire.into_action();
        debug!(action = %action.action_type, "Replaying action");
        store.dispatch(action)?;
        applied += 1;
    }
    info!(applied, commits = dispatcher.commits(), "Replay finished");

    let value = match path {
        Some(path) => store.get(path),
        None => store.state(),
    };
    Ok(ReplayReport {
        value,
        applied,
        commits: dispatcher.commits(),
    })
}
