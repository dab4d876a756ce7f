//! Extraction registry: which resources to pull out of which chunk
//!
//! Entries are keyed by chunk name and only ever grow. The scanner creates an
//! entry before its first traversal for a chunk and appends flagged resources;
//! the splitter reads it.

use indexmap::IndexSet;
use log::trace;

use crate::chunk_graph::FxIndexMap;

#[derive(Debug, Clone, Default)]
pub struct ExtractionRegistry {
    entries: FxIndexMap<String, IndexSet<String>>,
}

impl ExtractionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty entry for `chunk` unless one exists
    pub fn ensure_entry(&mut self, chunk: &str) {
        if !self.entries.contains_key(chunk) {
            trace!("Created extraction entry for {chunk} chunk");
            self.entries.insert(chunk.to_owned(), IndexSet::new());
        }
    }

    /// Flag a resource for extraction from `chunk`.
    ///
    /// Returns `false` if it was already flagged.
    pub fn flag(&mut self, chunk: &str, resource: &str) -> bool {
        self.ensure_entry(chunk);
        self.entries
            .get_mut(chunk)
            .is_some_and(|entry| entry.insert(resource.to_owned()))
    }

    pub fn contains(&self, chunk: &str, resource: &str) -> bool {
        self.entries
            .get(chunk)
            .is_some_and(|entry| entry.contains(resource))
    }

    pub fn entry(&self, chunk: &str) -> Option<&IndexSet<String>> {
        self.entries.get(chunk)
    }

    /// Whether `chunk` has at least one resource to extract
    pub fn has_pending(&self, chunk: &str) -> bool {
        self.entries.get(chunk).is_some_and(|entry| !entry.is_empty())
    }

    /// Chunk names with an entry, in creation order
    pub fn chunk_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_grow_in_order() {
        let mut registry = ExtractionRegistry::new();
        registry.ensure_entry("main");
        assert!(!registry.has_pending("main"));

        assert!(registry.flag("main", "/b.css"));
        assert!(registry.flag("main", "/a.css"));
        assert!(!registry.flag("main", "/b.css"));

        let entry: Vec<_> = registry
            .entry("main")
            .expect("entry")
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(entry, vec!["/b.css", "/a.css"]);
        assert!(registry.has_pending("main"));
        assert!(!registry.contains("other", "/b.css"));
    }

    #[test]
    fn test_ensure_entry_keeps_existing_flags() {
        let mut registry = ExtractionRegistry::new();
        registry.flag("main", "/b.css");
        registry.ensure_entry("main");
        assert!(registry.contains("main", "/b.css"));
        assert_eq!(registry.chunk_names().collect::<Vec<_>>(), vec!["main"]);
    }
}
