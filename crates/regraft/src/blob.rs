//! Blob-level reconciliation.
//!
//! `merge_blob_3way` is the three-way merge of optional `(id, mode)`
//! pairs with the cheap equality shortcuts applied before deferring to the
//! store-level merge. `merge_commit_blob` reconstructs a blob at a replayed
//! commit from the old and new merge bases and every parent pair.

use regraft_merge::{merge_entries, EntryMerge};
use regraft_store::{Store, StoreError};

use crate::meta::BlobItem;

/// Three-way merge of optional blob entries.
///
/// Shortcuts: equal sides, or a side equal to the ancestor, resolve
/// without touching content. Everything else is the store's problem.
pub(crate) fn merge_blob_3way(
    store: &Store,
    ancestor: BlobItem,
    ours: BlobItem,
    theirs: BlobItem,
) -> Result<EntryMerge, StoreError> {
    if ours == theirs {
        return Ok(take(ours));
    }
    if theirs == ancestor {
        return Ok(take(ours));
    }
    if ours == ancestor {
        return Ok(take(theirs));
    }

    merge_entries(store, ancestor, ours, theirs)
}

fn take(side: BlobItem) -> EntryMerge {
    match side {
        Some((oid, mode)) => EntryMerge::Resolved(oid, mode),
        None => EntryMerge::Deleted,
    }
}

/// Reconstruct the blob at one path of a replayed commit.
///
/// Starting from the commit's own blob, the movement of the merge base
/// (if any) is transported first, then each parent's old→new change is
/// applied in order. When the bases moved, each old parent is projected
/// onto the new base before its change is applied.
///
/// For merge commits only, a step that cannot be reconciled is forgiven
/// when the parents themselves carry the base movement: a transport
/// conflict keeps the commit blob and leaves the work to the per-parent
/// steps, and a per-parent conflict whose pair equals the base pair is
/// skipped (that change arrived through another parent branch). Commits
/// with a single parent never use this forgiveness.
pub(crate) fn merge_commit_blob(
    store: &Store,
    multi_parent: bool,
    commit_blob: BlobItem,
    old_base: BlobItem,
    old_parents: &[BlobItem],
    new_base: BlobItem,
    new_parents: &[BlobItem],
) -> Result<EntryMerge, StoreError> {
    debug_assert_eq!(old_parents.len(), new_parents.len());

    let mut current = commit_blob;

    if old_base == new_base {
        for (&old_p, &new_p) in old_parents.iter().zip(new_parents) {
            if old_p == new_p {
                continue;
            }
            match merge_blob_3way(store, old_p, current, new_p)? {
                EntryMerge::Resolved(oid, mode) => current = Some((oid, mode)),
                EntryMerge::Deleted => current = None,
                EntryMerge::Conflict => {
                    if multi_parent && old_p == old_base && new_p == new_base {
                        continue;
                    }
                    return Ok(EntryMerge::Conflict);
                }
            }
        }
    } else {
        // Transport the base movement onto the commit content.
        match merge_blob_3way(store, old_base, current, new_base)? {
            EntryMerge::Resolved(oid, mode) => current = Some((oid, mode)),
            EntryMerge::Deleted => current = None,
            EntryMerge::Conflict => {
                if !multi_parent {
                    return Ok(EntryMerge::Conflict);
                }
                // Keep the commit blob; the per-parent steps below carry
                // the base movement through the projected parents.
            }
        }

        for (&old_p, &new_p) in old_parents.iter().zip(new_parents) {
            if old_p == new_p {
                continue;
            }

            // Project the old parent forward onto the new base.
            let updated_old = match merge_blob_3way(store, old_base, old_p, new_base)? {
                EntryMerge::Resolved(oid, mode) => Some((oid, mode)),
                EntryMerge::Deleted => None,
                EntryMerge::Conflict => return Ok(EntryMerge::Conflict),
            };

            match merge_blob_3way(store, updated_old, current, new_p)? {
                EntryMerge::Resolved(oid, mode) => current = Some((oid, mode)),
                EntryMerge::Deleted => current = None,
                EntryMerge::Conflict => {
                    if multi_parent && old_p == old_base && new_p == new_base {
                        continue;
                    }
                    return Ok(EntryMerge::Conflict);
                }
            }
        }
    }

    Ok(take(current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regraft_object::{Blob, FileMode, Object};

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("objects"));
        (dir, store)
    }

    fn blob(store: &Store, data: &[u8]) -> BlobItem {
        let oid = store
            .write(&Object::Blob(Blob::new(data.to_vec())))
            .unwrap();
        Some((oid, FileMode::Regular))
    }

    fn resolved_data(store: &Store, result: EntryMerge) -> Vec<u8> {
        match result {
            EntryMerge::Resolved(oid, _) => store.read_blob(&oid).unwrap().data,
            other => panic!("expected a resolved blob, got {other:?}"),
        }
    }

    #[test]
    fn three_way_shortcuts() {
        let (_dir, store) = temp_store();
        let a = blob(&store, b"hello\n");
        let b = blob(&store, b"changed\n");

        // Equal sides.
        assert_eq!(
            merge_blob_3way(&store, a, b, b).unwrap(),
            EntryMerge::Resolved(b.unwrap().0, FileMode::Regular)
        );
        // Theirs unchanged: take ours.
        assert_eq!(
            merge_blob_3way(&store, a, b, a).unwrap(),
            EntryMerge::Resolved(b.unwrap().0, FileMode::Regular)
        );
        // Ours unchanged: take theirs.
        assert_eq!(
            merge_blob_3way(&store, a, a, b).unwrap(),
            EntryMerge::Resolved(b.unwrap().0, FileMode::Regular)
        );
        // Deleted on the unchanged side.
        assert_eq!(merge_blob_3way(&store, a, a, None).unwrap(), EntryMerge::Deleted);
        assert_eq!(merge_blob_3way(&store, a, None, a).unwrap(), EntryMerge::Deleted);
        // All absent.
        assert_eq!(
            merge_blob_3way(&store, None, None, None).unwrap(),
            EntryMerge::Deleted
        );
    }

    #[test]
    fn unchanged_parents_keep_the_commit_blob() {
        let (_dir, store) = temp_store();
        let base = blob(&store, b"base\n");
        let parent = blob(&store, b"parent\n");
        let commit = blob(&store, b"commit\n");

        let result = merge_commit_blob(
            &store,
            false,
            commit,
            base,
            &[parent],
            base,
            &[parent],
        )
        .unwrap();
        assert_eq!(result, EntryMerge::Resolved(commit.unwrap().0, FileMode::Regular));
    }

    #[test]
    fn single_parent_change_is_applied() {
        let (_dir, store) = temp_store();
        let base = blob(&store, b"a\nb\nc\nd\ne\n");
        let old_parent = base;
        let new_parent = blob(&store, b"a\nb\nc\nd\nE\n");
        let commit = blob(&store, b"A\nb\nc\nd\ne\n");

        let result = merge_commit_blob(
            &store,
            false,
            commit,
            base,
            &[old_parent],
            base,
            &[new_parent],
        )
        .unwrap();
        assert_eq!(resolved_data(&store, result), b"A\nb\nc\nd\nE\n");
    }

    #[test]
    fn moved_base_transports_its_change_onto_the_commit() {
        let (_dir, store) = temp_store();
        let old_base = blob(&store, b"1\n2\n3\n4\n5\n");
        let new_base = blob(&store, b"1\n4\n5\n"); // 2 and 3 removed
        let commit = blob(&store, b"1\n2\n3\n4\nfive\n");

        // The parent pair equals the base pair, so after the transport no
        // further change applies.
        let result = merge_commit_blob(
            &store,
            false,
            commit,
            old_base,
            &[old_base],
            new_base,
            &[new_base],
        )
        .unwrap();
        assert_eq!(resolved_data(&store, result), b"1\n4\nfive\n");
    }

    #[test]
    fn merge_commit_applies_changes_from_every_parent() {
        let (_dir, store) = temp_store();
        let base = blob(&store, b"one\ntwo\nthree\nfour\nfive\n");
        let p0 = blob(&store, b"ONE\ntwo\nthree\nfour\nfive\n");
        let p1 = blob(&store, b"one\ntwo\nthree\nfour\nFIVE\n");
        // The original merge resolved both sides.
        let commit = blob(&store, b"ONE\ntwo\nthree\nfour\nFIVE\n");
        // Each rebased parent gained an extra, separate change.
        let np0 = blob(&store, b"ONE\nTWO\nthree\nfour\nfive\n");
        let np1 = blob(&store, b"one\ntwo\nthree\nFOUR\nFIVE\n");

        let result = merge_commit_blob(
            &store,
            true,
            commit,
            base,
            &[p0, p1],
            base,
            &[np0, np1],
        )
        .unwrap();
        assert_eq!(
            resolved_data(&store, result),
            b"ONE\nTWO\nthree\nFOUR\nFIVE\n"
        );
    }

    #[test]
    fn hand_resolved_conflict_survives_when_parents_carry_the_base_move() {
        // The commit blob disagrees with both bases, but every differing
        // parent pair is exactly the base movement: a merge commit keeps
        // its content.
        let (_dir, store) = temp_store();
        let old_base = blob(&store, b"blob2");
        let new_base = blob(&store, b"blob3");
        let commit = blob(&store, b"blob1");

        let result = merge_commit_blob(
            &store,
            true,
            commit,
            old_base,
            &[old_base],
            new_base,
            &[new_base],
        )
        .unwrap();
        assert_eq!(
            result,
            EntryMerge::Resolved(commit.unwrap().0, FileMode::Regular)
        );
    }

    #[test]
    fn single_parent_commits_do_not_get_the_forgiveness() {
        let (_dir, store) = temp_store();
        let old_base = blob(&store, b"blob2");
        let new_base = blob(&store, b"blob3");
        let commit = blob(&store, b"blob1");

        let result = merge_commit_blob(
            &store,
            false,
            commit,
            old_base,
            &[old_base],
            new_base,
            &[new_base],
        )
        .unwrap();
        assert_eq!(result, EntryMerge::Conflict);
    }

    #[test]
    fn deletion_resolved_in_the_merge_is_preserved() {
        let (_dir, store) = temp_store();
        let base = blob(&store, b"original\n");
        let p0 = blob(&store, b"changed in main\n");
        let p1 = blob(&store, b"changed in other\n");

        // The merge resolved the clash by deleting the file; parents are
        // unchanged by the remap.
        let result =
            merge_commit_blob(&store, true, None, base, &[p0, p1], base, &[p0, p1]).unwrap();
        assert_eq!(result, EntryMerge::Deleted);
    }

    #[test]
    fn reintroduced_edit_against_a_deletion_conflicts() {
        let (_dir, store) = temp_store();
        let base = blob(&store, b"original\n");
        let p0 = blob(&store, b"changed in main\n");
        let p1 = blob(&store, b"changed in other\n");
        let np0 = blob(&store, b"edited again on main\n");

        // The deletion-merge meets a parent that re-edited the path.
        let result =
            merge_commit_blob(&store, true, None, base, &[p0, p1], base, &[np0, p1]).unwrap();
        assert_eq!(result, EntryMerge::Conflict);
    }

    #[test]
    fn absent_everywhere_stays_absent() {
        let (_dir, store) = temp_store();
        let result = merge_commit_blob(&store, false, None, None, &[], None, &[]).unwrap();
        assert_eq!(result, EntryMerge::Deleted);
    }

    #[test]
    fn mode_flip_from_one_parent_combines_with_content_from_another() {
        let (_dir, store) = temp_store();
        let base = blob(&store, b"content\n");
        let exec = base.map(|(oid, _)| (oid, FileMode::Executable));
        let edited = blob(&store, b"content changed\n");

        // Parent 0 flipped the mode, parent 1 edited the content; the
        // original merge took both.
        let commit = edited.map(|(oid, _)| (oid, FileMode::Executable));
        let result = merge_commit_blob(
            &store,
            true,
            commit,
            base,
            &[exec, edited],
            base,
            &[exec, edited],
        )
        .unwrap();
        assert_eq!(result, EntryMerge::Resolved(commit.unwrap().0, FileMode::Executable));
    }
}
