//! Persistent Tree
//!
//! Immutable nested maps, sequences and scalars addressed by `Path`.
//! Every write produces a new root that shares untouched subtrees with the
//! previous one.

pub mod node;
pub mod path;
pub mod update;

pub use node::{Node, Scalar};
pub use path::{Key, Path};
pub use update::update_at;
