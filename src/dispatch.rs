//! Dispatcher
//!
//! The host runtime that owns committed state. A dispatcher receives
//! actions, calls back `Store::reduce` with its current state, and commits
//! the tree the reduction returns. `InMemoryDispatcher` is the minimal
//! host used by the CLI and the tests.

use crate::action::Action;
use crate::error::StoreError;
use crate::store::Store;
use crate::tree::Node;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::debug;

/// External action dispatcher.
pub trait Dispatcher {
    /// Reduce `action` and commit the result synchronously.
    fn dispatch(&self, action: Action) -> Result<(), StoreError>;

    /// Committed state.
    fn get_state(&self) -> Node;
}

/// Keeps the committed tree in memory.
#[derive(Debug)]
pub struct InMemoryDispatcher {
    store: Weak<Store>,
    state: RefCell<Node>,
    commits: Cell<u64>,
}

impl InMemoryDispatcher {
    /// Seed with `initial` (or the schema default), then attach to `store`.
    pub fn attach(store: &Rc<Store>, initial: Option<Node>) -> Result<Rc<Self>, StoreError> {
        let state = store.reduce(initial.unwrap_or_default(), &Action::init())?;
        let dispatcher = Rc::new(Self {
            store: Rc::downgrade(store),
            state: RefCell::new(state),
            commits: Cell::new(0),
        });
        store.set_dispatcher(dispatcher.clone());
        Ok(dispatcher)
    }

    /// Number of actions committed so far.
    pub fn commits(&self) -> u64 {
        self.commits.get()
    }
}

impl Dispatcher for InMemoryDispatcher {
    fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        let store = self.store.upgrade().ok_or(StoreError::NoDispatcher)?;
        let current = self.state.borrow().clone();
        let next = store.reduce(current, &action)?;
        if !next.same(&self.state.borrow()) {
            self.commits.set(self.commits.get() + 1);
            debug!(action = %action.action_type, commits = self.commits.get(), "Committed state");
        }
        *self.state.borrow_mut() = next;
        Ok(())
    }

    fn get_state(&self) -> Node {
        self.state.borrow().clone()
    }
}
