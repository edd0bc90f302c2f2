use std::collections::BTreeMap;

use bstr::{BStr, BString};
use regraft_object::{FileMode, Object, ObjectId, Tree, TreeEntry};

use crate::{Store, StoreError};

/// Scratch state for assembling a tree object.
///
/// Entries are keyed by name; `write` serializes them in lexicographic byte
/// order, matching [`Tree`]'s canonical ordering. Builders are cheap and
/// short-lived: the rebase engine creates one per tree-merge invocation.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    entries: BTreeMap<BString, (ObjectId, FileMode)>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, name: impl Into<BString>, oid: ObjectId, mode: FileMode) {
        self.entries.insert(name.into(), (oid, mode));
    }

    /// Remove an entry if present.
    pub fn remove(&mut self, name: &BStr) {
        self.entries.remove(name);
    }

    pub fn get(&self, name: &BStr) -> Option<(ObjectId, FileMode)> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the assembled tree to the store and return its id.
    ///
    /// Writing an empty builder yields the canonical empty-tree id.
    pub fn write(&self, store: &Store) -> Result<ObjectId, StoreError> {
        let entries = self
            .entries
            .iter()
            .map(|(name, &(oid, mode))| TreeEntry {
                name: name.clone(),
                oid,
                mode,
            })
            .collect();
        store.write(&Object::Tree(Tree { entries }))
    }
}
