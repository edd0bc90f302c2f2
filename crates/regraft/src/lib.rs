//! Merge-preserving history rewrite.
//!
//! [`rebase`] replays the commits in `upstream..source` onto `onto`,
//! reconstructing merge commits instead of linearizing them: for every
//! commit, the tree merger combines the original tree, the original parent
//! trees, and the rebased parent trees into a new tree carrying the same
//! semantic change, or reports per-path conflicts and stops.
//!
//! Commits whose parents are untouched by the remap are reused verbatim.
//! Authors and messages are carried over; the committer is sourced fresh.

mod blob;
mod easy;
mod item;
mod iter;
mod meta;
mod rebase;
mod tree;

pub use meta::CommitMetadata;
pub use rebase::rebase;

use std::collections::HashMap;
use std::ops::ControlFlow;

use bstr::BString;
use regraft_object::{ObjectId, Signature, TreeEntry};
use regraft_store::StoreError;
use regraft_walk::WalkError;

/// What happened to a single commit during the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseAction {
    /// The commit was replayed onto new parents.
    Rebased,
    /// The commit was taken as-is because its parents were unchanged.
    Reused,
    /// Tree merging produced conflicts; the rebase stops here.
    Conflicts,
}

/// Progress callback, invoked between commits with `(action, index, total)`.
///
/// Returning [`ControlFlow::Break`] aborts the walk cleanly; the driver
/// surfaces that as [`RebaseError::Interrupted`].
pub type ProgressHook<'h> =
    Box<dyn FnMut(RebaseAction, usize, usize) -> ControlFlow<()> + 'h>;

/// Parameters of a rebase invocation.
pub struct RebaseOptions<'h> {
    /// Tip defining the old home of the range: commits reachable from it
    /// are not rewritten.
    pub upstream: ObjectId,
    /// Tip of the range to rewrite.
    pub source: ObjectId,
    /// The commit the rewritten range is planted onto. Defaults to
    /// `upstream`.
    pub onto: Option<ObjectId>,
    /// Rewrite every commit, even when its parents are unchanged.
    pub force_rebase: bool,
    /// Committer signature override. When unset the identity is sourced
    /// from the repository config and stamped with the current time. The
    /// author is always carried over from the original commit.
    pub committer: Option<Signature>,
    /// Optional progress callback.
    pub progress: Option<ProgressHook<'h>>,
}

impl<'h> RebaseOptions<'h> {
    pub fn new(upstream: ObjectId, source: ObjectId) -> Self {
        Self {
            upstream,
            source,
            onto: None,
            force_rebase: false,
            committer: None,
            progress: None,
        }
    }
}

/// A path the tree merger could not reconcile.
///
/// `path` is the full `/`-joined path relative to the commit tree root.
/// The items record what each side held there: the commit's own entry and
/// one entry per original resp. rebased parent, in parent order.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub path: BString,
    pub item: Option<TreeEntry>,
    pub old_parent_items: Vec<Option<TreeEntry>>,
    pub new_parent_items: Vec<Option<TreeEntry>>,
}

/// Result of a completed rebase invocation.
#[derive(Debug, Clone)]
pub enum RebaseOutcome {
    /// Every commit was replayed; the id of the rebased `source`.
    Completed(ObjectId),
    /// `upstream` and `source` share no ancestor; nothing was done.
    NoMergeBase,
    /// Tree merging hit conflicts at `commit`. `commits_map` holds the
    /// original→rebased mapping built so far; the conflict sink holds the
    /// records in order of discovery.
    Conflicted {
        commit: ObjectId,
        commits_map: HashMap<ObjectId, ObjectId>,
    },
}

/// Errors aborting a rebase. Conflicts are not errors; they are reported
/// through [`RebaseOutcome::Conflicted`] and the conflict sink.
#[derive(Debug, thiserror::Error)]
pub enum RebaseError {
    #[error("rebase interrupted by progress hook")]
    Interrupted,

    #[error(transparent)]
    Walk(#[from] WalkError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
