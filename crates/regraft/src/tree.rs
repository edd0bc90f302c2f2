//! The recursive tree merger.
//!
//! Produces the tree of a replayed commit from its original tree, the
//! original parent trees, and the rebased parent trees. Paths that cannot
//! be reconciled are appended to the caller's conflict sink; conflicts are
//! materialized only at leaves (irreconcilable blobs or blob-vs-subtree
//! clashes), never for subtrees as a whole.

use bstr::BString;
use regraft_merge::EntryMerge;
use regraft_object::{FileMode, ObjectId, Tree, TreeEntry};
use regraft_store::{Repository, TreeBuilder};

use crate::blob::merge_commit_blob;
use crate::easy::{easy_merge, EasyMerge};
use crate::item::differing_pairs;
use crate::iter::MultiTreeWalk;
use crate::meta::CommitMetadata;
use crate::{Conflict, RebaseError};

/// Merge a commit's root tree against its old and new parent trees.
///
/// Returns the resulting tree id, or `None` when the result is empty.
/// Conflicts are appended to `conflicts`; the caller decides whether any
/// were added during this invocation.
pub(crate) fn merge_commit_trees(
    repo: &Repository,
    meta: &CommitMetadata<'_>,
    commit_tree_id: ObjectId,
    old_parent_tree_ids: &[ObjectId],
    new_parent_tree_ids: &[ObjectId],
    conflicts: &mut Vec<Conflict>,
) -> Result<Option<ObjectId>, RebaseError> {
    // Root shortcut: no differing parent pair means the original tree can
    // be taken wholesale.
    let mut differing: Vec<(ObjectId, ObjectId)> = Vec::new();
    for (&old, &new) in old_parent_tree_ids.iter().zip(new_parent_tree_ids) {
        if old != new && !differing.contains(&(old, new)) {
            differing.push((old, new));
        }
    }
    if differing.is_empty() {
        return Ok(Some(commit_tree_id));
    }
    if differing.len() == 1 {
        let (old, new) = differing[0];
        if commit_tree_id == old {
            // The change has not been applied on our side yet.
            return Ok(Some(new));
        }
        if commit_tree_id == new {
            // Already applied over there.
            return Ok(Some(commit_tree_id));
        }
    }

    let commit_tree = repo.find_tree(&commit_tree_id)?;
    let old_trees = load_trees(repo, old_parent_tree_ids)?;
    let new_trees = load_trees(repo, new_parent_tree_ids)?;

    let mut path = Vec::new();
    merge_tree_items(
        repo,
        meta,
        Some(&commit_tree),
        &old_trees,
        &new_trees,
        conflicts,
        &mut path,
    )
}

fn load_trees(repo: &Repository, ids: &[ObjectId]) -> Result<Vec<Option<Tree>>, RebaseError> {
    ids.iter()
        .map(|id| repo.find_tree(id).map(Some).map_err(RebaseError::from))
        .collect()
}

/// Walk the input trees in lockstep and resolve every path.
fn merge_tree_items(
    repo: &Repository,
    meta: &CommitMetadata<'_>,
    commit_tree: Option<&Tree>,
    old_parent_trees: &[Option<Tree>],
    new_parent_trees: &[Option<Tree>],
    conflicts: &mut Vec<Conflict>,
    path: &mut Vec<BString>,
) -> Result<Option<ObjectId>, RebaseError> {
    let mut walk = MultiTreeWalk::new(commit_tree, old_parent_trees, new_parent_trees);
    let mut builder = TreeBuilder::new();

    while let Some(walk_item) = walk.next() {
        let name = walk_item.name();
        let differing = differing_pairs(&walk_item.old_items, &walk_item.new_items);

        if differing.is_empty() {
            // No parent disagrees here; the commit's own item stands.
            if let Some(entry) = walk_item.item {
                builder.insert(entry.name.clone(), entry.oid, entry.mode);
            }
            continue;
        }

        if differing.len() == 1 {
            if let EasyMerge::Solved(result) =
                easy_merge(walk_item.item, differing[0].0, differing[0].1)
            {
                if let Some(entry) = result {
                    builder.insert(entry.name.clone(), entry.oid, entry.mode);
                }
                continue;
            }
        }

        if all_subtrees(walk_item.item, &differing) {
            // Recurse, forwarding only the differing pairs: parents that
            // agree cannot introduce a change below this path.
            let sub_commit = load_subtree(repo, walk_item.item)?;
            let sub_old = load_subtrees(repo, differing.iter().map(|&(old, _)| old))?;
            let sub_new = load_subtrees(repo, differing.iter().map(|&(_, new)| new))?;

            path.push(name.into());
            let result = merge_tree_items(
                repo,
                meta,
                sub_commit.as_ref(),
                &sub_old,
                &sub_new,
                conflicts,
                path,
            )?;
            path.pop();

            // An empty result means the directory is gone; a conflict has
            // already been recorded at the offending leaf.
            if let Some(tree_id) = result {
                builder.insert(name.to_owned(), tree_id, FileMode::Tree);
            }
            continue;
        }

        if all_blobs(walk_item.item, &differing) {
            path.push(name.into());
            let full_path = join_path(path);

            // The multi-parent blob merge reasons about every parent, not
            // only the differing ones.
            let (old_parent_blobs, new_parent_blobs) =
                meta.parent_blobs(full_path.as_ref())?;
            let (old_base_blob, new_base_blob) = meta.base_blobs(full_path.as_ref())?;
            let commit_blob = walk_item.item.map(|e| (e.oid, e.mode));

            let result = merge_commit_blob(
                repo.store(),
                meta.is_merge(),
                commit_blob,
                old_base_blob,
                &old_parent_blobs,
                new_base_blob,
                &new_parent_blobs,
            )?;
            path.pop();

            match result {
                EntryMerge::Resolved(oid, mode) => builder.insert(name.to_owned(), oid, mode),
                EntryMerge::Deleted => {}
                EntryMerge::Conflict => {
                    conflicts.push(record_conflict(full_path, &walk_item));
                }
            }
            continue;
        }

        // A blob on one side, a subtree on another: nothing to merge.
        path.push(name.into());
        let full_path = join_path(path);
        path.pop();
        conflicts.push(record_conflict(full_path, &walk_item));
    }

    if builder.is_empty() {
        Ok(None)
    } else {
        Ok(Some(builder.write(repo.store())?))
    }
}

fn all_subtrees(
    commit_item: Option<&TreeEntry>,
    differing: &[(Option<&TreeEntry>, Option<&TreeEntry>)],
) -> bool {
    let is_tree = |item: Option<&TreeEntry>| item.map(|e| e.mode.is_tree()).unwrap_or(true);
    is_tree(commit_item)
        && differing
            .iter()
            .all(|&(old, new)| is_tree(old) && is_tree(new))
}

fn all_blobs(
    commit_item: Option<&TreeEntry>,
    differing: &[(Option<&TreeEntry>, Option<&TreeEntry>)],
) -> bool {
    let is_blob = |item: Option<&TreeEntry>| item.map(|e| e.mode.is_blob()).unwrap_or(true);
    is_blob(commit_item)
        && differing
            .iter()
            .all(|&(old, new)| is_blob(old) && is_blob(new))
}

fn load_subtree(repo: &Repository, item: Option<&TreeEntry>) -> Result<Option<Tree>, RebaseError> {
    match item {
        Some(entry) => Ok(Some(repo.find_tree(&entry.oid)?)),
        None => Ok(None),
    }
}

fn load_subtrees<'t>(
    repo: &Repository,
    items: impl Iterator<Item = Option<&'t TreeEntry>>,
) -> Result<Vec<Option<Tree>>, RebaseError> {
    items.map(|item| load_subtree(repo, item)).collect()
}

fn join_path(path: &[BString]) -> BString {
    let mut joined = BString::new(Vec::new());
    for (i, component) in path.iter().enumerate() {
        if i > 0 {
            joined.push(b'/');
        }
        joined.extend_from_slice(component);
    }
    joined
}

fn record_conflict(path: BString, walk_item: &crate::iter::WalkItem<'_>) -> Conflict {
    Conflict {
        path,
        item: walk_item.item.cloned(),
        old_parent_items: walk_item.old_items.iter().map(|i| i.cloned()).collect(),
        new_parent_items: walk_item.new_items.iter().map(|i| i.cloned()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_joining() {
        assert_eq!(join_path(&[]), "");
        assert_eq!(join_path(&[BString::from("a")]), "a");
        assert_eq!(
            join_path(&[BString::from("a"), BString::from("b"), BString::from("c.txt")]),
            "a/b/c.txt"
        );
    }

    #[test]
    fn kind_checks_treat_absent_as_compatible() {
        let blob_entry = TreeEntry {
            name: BString::from("x"),
            oid: ObjectId::NULL,
            mode: FileMode::Regular,
        };
        let tree_entry = TreeEntry {
            name: BString::from("x"),
            oid: ObjectId::NULL,
            mode: FileMode::Tree,
        };

        assert!(all_blobs(None, &[(Some(&blob_entry), None)]));
        assert!(all_subtrees(None, &[(Some(&tree_entry), None)]));
        assert!(!all_blobs(Some(&tree_entry), &[(Some(&blob_entry), None)]));
        assert!(!all_subtrees(Some(&blob_entry), &[(Some(&tree_entry), None)]));
        assert!(!all_blobs(None, &[(Some(&blob_entry), Some(&tree_entry))]));
    }

    #[test]
    fn symlinks_count_as_blob_kind() {
        let link = TreeEntry {
            name: BString::from("l"),
            oid: ObjectId::NULL,
            mode: FileMode::Symlink,
        };
        assert!(all_blobs(Some(&link), &[(Some(&link), None)]));
    }
}
