//! Treelens: Path-Addressed Immutable State
//!
//! A state container over a persistent tree of plain data. Writes produce
//! new versions that share every untouched subtree with the previous one.
//! Callers work through cached, schema-typed views whose mutating
//! operations run either inside a reduction or as actions round-tripped
//! through an external dispatcher.

pub mod action;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod replay;
pub mod schema;
pub mod store;
pub mod tree;
pub mod view;

pub use action::{Action, Arg, AsyncArg, WireAction};
pub use dispatch::{Dispatcher, InMemoryDispatcher};
pub use error::StoreError;
pub use schema::{Schema, SchemaKind, SchemaRef};
pub use store::{Store, StoreOptions};
pub use tree::{Key, Node, Path};
pub use view::{MapView, Outcome, SequenceView, Unpacked, View};
