//! Persistent update at a path
//!
//! Rebuilds the ancestors of the addressed node and reuses every other
//! subtree by reference. When nothing changes the original node is returned
//! untouched, so callers can detect no-ops with `Node::same`.

use crate::error::StoreError;
use crate::tree::node::Node;
use crate::tree::path::Key;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Return a new version of `state` with `value` written at `path`.
pub fn update_at(state: &Node, path: &[Key], value: Node) -> Result<Node, StoreError> {
    let Some((key, rest)) = path.split_first() else {
        return Ok(value);
    };

    let prop = state.child(key);
    let updated = update_at(&prop, rest, value)?;
    if updated.same(&prop) {
        return Ok(state.clone());
    }

    match (state, key) {
        (Node::Seq(items), Key::Index(ix)) => set_seq_index(items, *ix, updated),
        (Node::Seq(items), Key::Name(name)) if name == "length" => {
            set_seq_length(items, &updated)
        }
        (Node::Seq(_), Key::Name(name)) => Err(StoreError::InvalidOperation(format!(
            "Property put does not support extra property \"{}\" on sequences",
            name
        ))),
        (state, key) => {
            let name = key.as_name().into_owned();
            if updated.is_undefined() {
                Ok(remove_map_key(state, &name))
            } else {
                Ok(set_map_key(state, name, updated))
            }
        }
    }
}

/// Longest sequence a write may produce. Indexes run up to one below it.
pub const MAX_SEQ_LEN: usize = u32::MAX as usize;

/// Read a sequence length: a whole, non-negative number no larger than
/// `MAX_SEQ_LEN`.
pub fn parse_length(length: &Node) -> Result<usize, StoreError> {
    length
        .as_f64()
        .filter(|n| n.is_finite() && n.fract() == 0.0 && *n >= 0.0 && *n <= MAX_SEQ_LEN as f64)
        .map(|n| n as usize)
        .ok_or_else(|| StoreError::InvalidArgument(format!("Invalid sequence length: {}", length)))
}

/// Copy of `items` truncated or padded with `fill` to `length`.
pub fn resized(items: &[Node], length: usize, fill: Node) -> Result<Vec<Node>, StoreError> {
    if length > MAX_SEQ_LEN {
        return Err(StoreError::InvalidArgument(format!("Invalid sequence length: {}", length)));
    }
    let mut copy: Vec<Node> = Vec::new();
    copy.try_reserve_exact(length)
        .map_err(|e| StoreError::InvalidArgument(format!("Cannot grow sequence to {}: {}", length, e)))?;
    copy.extend(items.iter().take(length).cloned());
    copy.resize(length, fill);
    Ok(copy)
}

/// Shallow copy of the sequence with one slot replaced. Writing past the end
/// pads the gap with `Undefined`.
pub fn set_seq_index(items: &Arc<Vec<Node>>, ix: usize, value: Node) -> Result<Node, StoreError> {
    if ix >= MAX_SEQ_LEN {
        return Err(StoreError::InvalidArgument(format!("Invalid sequence index: {}", ix)));
    }
    let mut copy = resized(items, items.len().max(ix + 1), Node::UNDEFINED)?;
    copy[ix] = value;
    Ok(Node::from(copy))
}

/// Shallow copy truncated or padded with `Undefined` to the requested length.
pub fn set_seq_length(items: &Arc<Vec<Node>>, length: &Node) -> Result<Node, StoreError> {
    let length = parse_length(length)?;
    Ok(Node::from(resized(items, length, Node::UNDEFINED)?))
}

/// Shallow copy of the map with one key set. Non-map ancestors are replaced
/// by a fresh map.
pub fn set_map_key(state: &Node, name: String, value: Node) -> Node {
    let mut copy: BTreeMap<String, Node> = match state {
        Node::Map(entries) => entries.as_ref().clone(),
        _ => BTreeMap::new(),
    };
    copy.insert(name, value);
    Node::from(copy)
}

/// Shallow copy of the map without `name`.
pub fn remove_map_key(state: &Node, name: &str) -> Node {
    let mut copy: BTreeMap<String, Node> = match state {
        Node::Map(entries) => entries.as_ref().clone(),
        _ => BTreeMap::new(),
    };
    copy.remove(name);
    Node::from(copy)
}
