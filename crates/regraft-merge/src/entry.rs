//! Three-way merge of optional blob entries.
//!
//! This is the store-level merge the rebase engine defers to once its own
//! shortcuts are exhausted: content and file mode are resolved
//! independently, and a clean result is written back to the store.

use regraft_object::{Blob, FileMode, Object, ObjectId};
use regraft_store::{Store, StoreError};

use crate::content::{merge_content, ContentMerge, MergeLabels};

/// Outcome of merging three optional `(id, mode)` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryMerge {
    /// A merged blob with its resolved mode.
    Resolved(ObjectId, FileMode),
    /// The entry is deleted at this path.
    Deleted,
    /// The sides cannot be reconciled.
    Conflict,
}

/// Merge `ours` and `theirs` against their common `ancestor`.
///
/// Each argument is an optional `(id, mode)` pair; absence means the path
/// does not exist on that side. A clean content merge writes the merged
/// blob to `store` and returns its id with the resolved mode.
pub fn merge_entries(
    store: &Store,
    ancestor: Option<(ObjectId, FileMode)>,
    ours: Option<(ObjectId, FileMode)>,
    theirs: Option<(ObjectId, FileMode)>,
) -> Result<EntryMerge, StoreError> {
    // No change between the sides, or only one side changed.
    if ours == theirs {
        return Ok(take(ours));
    }
    if theirs == ancestor {
        return Ok(take(ours));
    }
    if ours == ancestor {
        return Ok(take(theirs));
    }

    // One side deleted what the other changed.
    let ((ours_oid, ours_mode), (theirs_oid, theirs_mode)) = match (ours, theirs) {
        (Some(o), Some(t)) => (o, t),
        _ => return Ok(EntryMerge::Conflict),
    };

    let mode = match resolve_mode(ancestor.map(|(_, m)| m), ours_mode, theirs_mode) {
        Some(mode) => mode,
        None => return Ok(EntryMerge::Conflict),
    };

    let base_data = match ancestor {
        Some((oid, _)) => store.read_blob(&oid)?.data,
        None => Vec::new(),
    };
    let ours_data = store.read_blob(&ours_oid)?.data;
    let theirs_data = store.read_blob(&theirs_oid)?.data;

    match merge_content(&base_data, &ours_data, &theirs_data, &MergeLabels::default()) {
        ContentMerge::Clean(data) => {
            let oid = store.write(&Object::Blob(Blob::new(data)))?;
            Ok(EntryMerge::Resolved(oid, mode))
        }
        ContentMerge::Conflict { .. } => Ok(EntryMerge::Conflict),
    }
}

fn take(side: Option<(ObjectId, FileMode)>) -> EntryMerge {
    match side {
        Some((oid, mode)) => EntryMerge::Resolved(oid, mode),
        None => EntryMerge::Deleted,
    }
}

/// Three-way mode resolution: agreeing sides win; otherwise the side that
/// changed away from the ancestor wins; two different changes conflict.
fn resolve_mode(
    ancestor: Option<FileMode>,
    ours: FileMode,
    theirs: FileMode,
) -> Option<FileMode> {
    if ours == theirs {
        return Some(ours);
    }
    match ancestor {
        Some(a) if theirs == a => Some(ours),
        Some(a) if ours == a => Some(theirs),
        _ => None,
    }
}
