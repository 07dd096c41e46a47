//! View Cache
//!
//! Bounded path -> view map in recency order. A cached view is only reused
//! when its schema moniker matches the one requested; a mismatched entry is
//! replaced rather than returned.

use crate::schema::TypeMoniker;
use crate::tree::Path;
use crate::view::View;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::rc::Rc;
use tracing::{debug, trace};

pub struct ViewCache {
    entries: LruCache<Path, Rc<View>>,
}

impl ViewCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Return and promote the view at `path` if it was built for `moniker`.
    /// A moniker mismatch leaves recency untouched.
    pub fn touch(&mut self, path: &Path, moniker: &TypeMoniker) -> Option<Rc<View>> {
        let matches = self
            .entries
            .peek(path)
            .is_some_and(|view| view.moniker() == moniker);
        if !matches {
            return None;
        }
        trace!(path = %path, "View cache hit");
        self.entries.get(path).cloned()
    }

    /// Insert as most recent, replacing any entry at the same path and
    /// evicting the least recently touched one when full.
    pub fn install(&mut self, path: Path, view: Rc<View>) {
        if let Some((evicted, _)) = self.entries.push(path.clone(), view) {
            if evicted != path {
                debug!(path = %evicted, "Evicted view from cache");
            }
        }
    }

    pub fn peek(&self, path: &Path) -> Option<&Rc<View>> {
        self.entries.peek(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Cached paths, most recent first.
    pub fn paths(&self) -> Vec<Path> {
        self.entries.iter().map(|(path, _)| path.clone()).collect()
    }
}
