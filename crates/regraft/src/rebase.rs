//! The rebase driver: walk, remap, merge, commit.

use std::collections::HashMap;

use regraft_object::ObjectId;
use regraft_store::{Repository, TreeBuilder};
use regraft_walk::{merge_base, SortOrder, Walk};

use crate::meta::CommitMetadata;
use crate::tree::merge_commit_trees;
use crate::{Conflict, ProgressHook, RebaseAction, RebaseError, RebaseOptions, RebaseOutcome};

/// Replay `upstream..source` onto `onto` (default: `upstream`).
///
/// Walks the range topologically, oldest first. Commits whose parents are
/// untouched by the remap are reused verbatim unless `force_rebase` is
/// set; every other commit gets its tree rebuilt by the tree merger and is
/// rewritten with its original author and message and a fresh committer.
///
/// Conflicts are not errors: they land in `conflicts` and the driver
/// stops, reporting the offending commit and the mapping built so far.
pub fn rebase(
    repo: &Repository,
    mut options: RebaseOptions<'_>,
    conflicts: &mut Vec<Conflict>,
) -> Result<RebaseOutcome, RebaseError> {
    let upstream = options.upstream;
    let source = options.source;
    let onto = options.onto.unwrap_or(upstream);

    // Sourced once per invocation; the author is per-commit.
    let committer = match options.committer.take() {
        Some(signature) => signature,
        None => repo.signature()?,
    };

    let merge_base_id = match merge_base(repo, &source, &upstream)? {
        Some(id) => id,
        None => return Ok(RebaseOutcome::NoMergeBase),
    };

    let mut walk = Walk::new(repo);
    walk.push(source)?;
    walk.hide(merge_base_id)?;
    walk.set_sort(SortOrder::Topological);
    walk.set_reverse(true);
    let commits_to_rebase: Vec<ObjectId> = walk.collect::<Result<_, _>>()?;

    let mut commits_map: HashMap<ObjectId, ObjectId> = HashMap::new();
    commits_map.insert(merge_base_id, onto);

    let total = commits_to_rebase.len();
    for (index, commit_id) in commits_to_rebase.iter().enumerate() {
        let counter = index + 1;
        let commit = repo.find_commit(commit_id)?;

        let new_parent_ids: Vec<ObjectId> = commit
            .parents
            .iter()
            .map(|p| commits_map.get(p).copied().unwrap_or(*p))
            .collect();

        if !options.force_rebase && new_parent_ids == commit.parents {
            // Untouched parents: the commit itself can stand.
            commits_map.insert(*commit_id, *commit_id);
            emit(&mut options.progress, RebaseAction::Reused, counter, total)?;
            continue;
        }

        let old_parent_tree_ids = parent_tree_ids(repo, &commit.parents)?;
        let new_parent_tree_ids = parent_tree_ids(repo, &new_parent_ids)?;

        let meta = CommitMetadata::new(repo, commit.clone(), new_parent_ids.clone())?;

        let recorded = conflicts.len();
        let result_tree = merge_commit_trees(
            repo,
            &meta,
            commit.tree,
            &old_parent_tree_ids,
            &new_parent_tree_ids,
            conflicts,
        )?;

        if conflicts.len() > recorded {
            emit(
                &mut options.progress,
                RebaseAction::Conflicts,
                counter,
                total,
            )?;
            return Ok(RebaseOutcome::Conflicted {
                commit: *commit_id,
                commits_map,
            });
        }

        let result_tree = match result_tree {
            Some(tree_id) => tree_id,
            None => TreeBuilder::new().write(repo.store())?,
        };

        let new_commit = repo.create_commit(
            commit.author.clone(),
            committer.clone(),
            commit.message.clone(),
            result_tree,
            new_parent_ids,
        )?;
        commits_map.insert(*commit_id, new_commit);
        emit(&mut options.progress, RebaseAction::Rebased, counter, total)?;
    }

    // An empty range means the source is the merge base itself, which the
    // seed maps to `onto`.
    let result = commits_map.get(&source).copied().unwrap_or(onto);
    Ok(RebaseOutcome::Completed(result))
}

fn parent_tree_ids(
    repo: &Repository,
    parents: &[ObjectId],
) -> Result<Vec<ObjectId>, RebaseError> {
    parents
        .iter()
        .map(|p| Ok(repo.find_commit(p)?.tree))
        .collect()
}

fn emit(
    hook: &mut Option<ProgressHook<'_>>,
    action: RebaseAction,
    counter: usize,
    total: usize,
) -> Result<(), RebaseError> {
    if let Some(hook) = hook {
        if hook(action, counter, total).is_break() {
            return Err(RebaseError::Interrupted);
        }
    }
    Ok(())
}
