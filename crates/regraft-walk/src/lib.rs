//! Commit-graph traversal for regraft.
//!
//! [`Walk`] iterates commits reachable from pushed tips minus those
//! reachable from hidden tips, in chronological or topological order,
//! optionally reversed. The `bases` module computes lowest common
//! ancestors, including the many-way variant used for octopus merges.

mod bases;
mod walk;

pub use bases::{is_ancestor, merge_base, merge_base_many, merge_bases};
pub use walk::{SortOrder, Walk};

use regraft_object::ObjectId;
use regraft_store::StoreError;

/// Errors produced by graph traversal.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("cannot walk from {0}: not a commit")]
    NotACommit(ObjectId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub(crate) fn read_commit(
    repo: &regraft_store::Repository,
    oid: &ObjectId,
) -> Result<regraft_object::Commit, WalkError> {
    repo.find_commit(oid).map_err(|e| match e {
        StoreError::UnexpectedType { oid, .. } => WalkError::NotACommit(oid),
        other => WalkError::Store(other),
    })
}
