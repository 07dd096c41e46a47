//! Path keys, path parsing and action-name derivation

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::fmt;

/// One step of a path: a map key or a sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The key as it would be written into a map.
    pub fn as_name(&self) -> Cow<'_, str> {
        match self {
            Key::Index(ix) => Cow::Owned(ix.to_string()),
            Key::Name(name) => Cow::Borrowed(name),
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(ix) => Some(*ix),
            Key::Name(_) => None,
        }
    }
}

/// Digit-only names normalize to indices so `"3"` and `3` address the same slot.
impl From<&str> for Key {
    fn from(name: &str) -> Self {
        if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(ix) = name.parse::<usize>() {
                return Key::Index(ix);
            }
        }
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::from(name.as_str())
    }
}

impl From<usize> for Key {
    fn from(ix: usize) -> Self {
        Key::Index(ix)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(ix) => write!(f, "{}", ix),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawKey {
    Index(usize),
    Name(String),
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Index(ix) => Key::Index(ix),
            RawKey::Name(name) => Key::from(name),
        })
    }
}

/// Ordered key sequence locating a node from the tree root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Key>);

impl Path {
    pub fn root() -> Self {
        Path(Vec::new())
    }

    pub fn new(keys: Vec<Key>) -> Self {
        Path(keys)
    }

    /// Parse a dotted path string. Empty segments are dropped, so `""`,
    /// `"."` and `"a..b."` normalize to the root, and `a.b` respectively.
    pub fn parse(path: &str) -> Self {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .map(Key::from)
            .collect()
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Key> {
        self.0.last()
    }

    /// A new path one step below this one.
    pub fn child(&self, key: impl Into<Key>) -> Path {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Path(keys)
    }

    /// Split into the final key and the parent path.
    pub fn split_last(&self) -> Option<(&Key, Path)> {
        self.0
            .split_last()
            .map(|(last, rest)| (last, Path(rest.to_vec())))
    }

    /// Action-name fragment for this path: the second segment is dropped,
    /// every remaining key is upper-snake-cased, and the pieces are joined
    /// with `_`. The root derives `ROOT`.
    pub fn action_name(&self) -> String {
        let parts: Vec<String> = self
            .0
            .iter()
            .enumerate()
            .filter(|(ix, _)| *ix != 1)
            .map(|(_, key)| upper_snake(&key.as_name()))
            .collect();
        if parts.is_empty() {
            "ROOT".to_string()
        } else {
            parts.join("_")
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(Key::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Path(keys)
    }
}

impl<K: Into<Key>> FromIterator<K> for Path {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Path(iter.into_iter().map(Into::into).collect())
    }
}

/// `todoItems` -> `TODO_ITEMS`, `first-name` -> `FIRST_NAME`.
pub fn upper_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() && prev_lower && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            out.extend(ch.to_uppercase());
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}
