//! Page store value type
//!
//! A page store is an ordered list of `(path, content)` pairs embedded in a
//! website component. Paths are compared as exact strings; callers normalize
//! before looking anything up.

use serde::Deserialize;

/// A previously generated page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageEntry {
    pub path: String,
    pub content: String,
}

impl PageEntry {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Ordered cache of generated pages for one website component
///
/// A read-only projection of the document's `page_store` array. Writes go
/// through `upsert_stored_page` so entries this type cannot hold are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageStore {
    entries: Vec<PageEntry>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Vec<PageEntry>) -> Self {
        Self { entries }
    }

    /// Finds the first entry whose path equals `path` exactly
    pub fn lookup(&self, path: &str) -> Option<&PageEntry> {
        self.entries.iter().find(|entry| entry.path == path)
    }

    /// Read-only view of the entries in store order
    pub fn enumerate(&self) -> &[PageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
