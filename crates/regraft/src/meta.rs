//! Per-commit context shared across one tree-merge invocation.

use std::cell::RefCell;

use bstr::BStr;
use regraft_object::{Commit, FileMode, ObjectId, Tree};
use regraft_store::Repository;
use regraft_walk::merge_base_many;

use crate::RebaseError;

/// An optional blob at a path: `(id, mode)` or absent.
pub(crate) type BlobItem = Option<(ObjectId, FileMode)>;

#[derive(Clone)]
struct Bases {
    old_tree: Option<Tree>,
    new_tree: Option<Tree>,
}

/// The commit being replayed, its rebased parents, and lazily computed
/// merge bases of both parent sets.
///
/// The many-way merge-base query is expensive on deep histories; it is
/// only answered when a blob-level decision actually needs it, then
/// memoized for the rest of the commit.
pub struct CommitMetadata<'r> {
    repo: &'r Repository,
    commit: Commit,
    new_parent_ids: Vec<ObjectId>,
    old_parent_trees: Vec<Tree>,
    new_parent_trees: Vec<Tree>,
    bases: RefCell<Option<Bases>>,
}

impl<'r> CommitMetadata<'r> {
    /// Build the context for one commit. `new_parent_ids` must map the
    /// commit's parents one-to-one.
    pub fn new(
        repo: &'r Repository,
        commit: Commit,
        new_parent_ids: Vec<ObjectId>,
    ) -> Result<Self, RebaseError> {
        assert_eq!(
            commit.parents.len(),
            new_parent_ids.len(),
            "rebased parents must map the original parents one-to-one"
        );

        let old_parent_trees = commit
            .parents
            .iter()
            .map(|p| {
                let tree = repo.find_commit(p)?.tree;
                repo.find_tree(&tree)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let new_parent_trees = new_parent_ids
            .iter()
            .map(|p| {
                let tree = repo.find_commit(p)?.tree;
                repo.find_tree(&tree)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            repo,
            commit,
            new_parent_ids,
            old_parent_trees,
            new_parent_trees,
            bases: RefCell::new(None),
        })
    }

    pub fn commit(&self) -> &Commit {
        &self.commit
    }

    pub fn new_parent_ids(&self) -> &[ObjectId] {
        &self.new_parent_ids
    }

    /// Whether the commit being replayed is a merge commit.
    pub fn is_merge(&self) -> bool {
        self.commit.is_merge()
    }

    /// The blob at `path` in every original resp. rebased parent tree, in
    /// parent order. The blob merge needs all of them, not only the
    /// differing ones.
    pub(crate) fn parent_blobs(
        &self,
        path: &BStr,
    ) -> Result<(Vec<BlobItem>, Vec<BlobItem>), RebaseError> {
        let old = self
            .old_parent_trees
            .iter()
            .map(|tree| self.blob_at(tree, path))
            .collect::<Result<Vec<_>, _>>()?;
        let new = self
            .new_parent_trees
            .iter()
            .map(|tree| self.blob_at(tree, path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((old, new))
    }

    /// The blob at `path` in the old resp. new merge-base tree, computing
    /// and memoizing the bases on first use.
    pub(crate) fn base_blobs(&self, path: &BStr) -> Result<(BlobItem, BlobItem), RebaseError> {
        self.ensure_bases()?;
        let bases = self.bases.borrow();
        let bases = bases.as_ref().expect("ensured above");

        let old = match &bases.old_tree {
            Some(tree) => self.blob_at(tree, path)?,
            None => None,
        };
        let new = match &bases.new_tree {
            Some(tree) => self.blob_at(tree, path)?,
            None => None,
        };
        Ok((old, new))
    }

    fn ensure_bases(&self) -> Result<(), RebaseError> {
        if self.bases.borrow().is_some() {
            return Ok(());
        }

        let (old_base, new_base) = match self.commit.parents.len() {
            0 => (None, None),
            1 => (Some(self.commit.parents[0]), Some(self.new_parent_ids[0])),
            _ => (
                merge_base_many(self.repo, &self.commit.parents)?,
                merge_base_many(self.repo, &self.new_parent_ids)?,
            ),
        };

        let old_tree = match old_base {
            Some(id) => {
                let tree = self.repo.find_commit(&id)?.tree;
                Some(self.repo.find_tree(&tree)?)
            }
            None => None,
        };
        let new_tree = match new_base {
            Some(id) => {
                let tree = self.repo.find_commit(&id)?.tree;
                Some(self.repo.find_tree(&tree)?)
            }
            None => None,
        };

        *self.bases.borrow_mut() = Some(Bases { old_tree, new_tree });
        Ok(())
    }

    /// A blob-kind entry at a nested path, or `None` (a subtree at the
    /// path does not count as a blob).
    fn blob_at(&self, tree: &Tree, path: &BStr) -> Result<BlobItem, RebaseError> {
        let entry = self.repo.entry_at_path(tree, path)?;
        Ok(entry.and_then(|e| {
            if e.mode.is_tree() {
                None
            } else {
                Some((e.oid, e.mode))
            }
        }))
    }
}
