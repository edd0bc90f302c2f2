//! Merge-base computation using the paint algorithm.
//!
//! Commits reachable from each input are painted with a flag; a commit
//! painted with both flags is a common ancestor. Candidates that are
//! ancestors of other candidates are dropped.

use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use regraft_object::ObjectId;
use regraft_store::Repository;

use crate::{read_commit, WalkError};

const PARENT1: u8 = 1;
const PARENT2: u8 = 2;
const STALE: u8 = 4;

struct PaintEntry {
    oid: ObjectId,
    date: i64,
}

impl PartialEq for PaintEntry {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for PaintEntry {}

impl PartialOrd for PaintEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PaintEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Max-heap by date (newest first).
        self.date.cmp(&other.date)
    }
}

/// All lowest common ancestors of two commits.
pub fn merge_bases(
    repo: &Repository,
    a: &ObjectId,
    b: &ObjectId,
) -> Result<Vec<ObjectId>, WalkError> {
    if a == b {
        return Ok(vec![*a]);
    }
    let candidates = paint_down_to_common(repo, a, b)?;
    remove_redundant(repo, candidates)
}

/// The single best merge base of two commits, if any.
pub fn merge_base(
    repo: &Repository,
    a: &ObjectId,
    b: &ObjectId,
) -> Result<Option<ObjectId>, WalkError> {
    Ok(merge_bases(repo, a, b)?.into_iter().next())
}

/// The merge base of a whole set of commits: a left fold of the pairwise
/// base. Returns `None` as soon as any pair is unrelated.
pub fn merge_base_many(
    repo: &Repository,
    ids: &[ObjectId],
) -> Result<Option<ObjectId>, WalkError> {
    let mut ids = ids.iter();
    let mut base = match ids.next() {
        Some(first) => *first,
        None => return Ok(None),
    };
    for next in ids {
        base = match merge_base(repo, &base, next)? {
            Some(b) => b,
            None => return Ok(None),
        };
    }
    Ok(Some(base))
}

/// Whether `ancestor` is an ancestor of (or equal to) `descendant`.
pub fn is_ancestor(
    repo: &Repository,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> Result<bool, WalkError> {
    if ancestor == descendant {
        return Ok(true);
    }
    let bases = merge_bases(repo, ancestor, descendant)?;
    Ok(bases.contains(ancestor))
}

fn paint_down_to_common(
    repo: &Repository,
    a: &ObjectId,
    b: &ObjectId,
) -> Result<Vec<ObjectId>, WalkError> {
    let mut flags: HashMap<ObjectId, u8> = HashMap::new();
    let mut queue: BinaryHeap<PaintEntry> = BinaryHeap::new();
    let mut results: Vec<ObjectId> = Vec::new();

    let commit_a = read_commit(repo, a)?;
    let commit_b = read_commit(repo, b)?;

    flags.insert(*a, PARENT1);
    flags.insert(*b, PARENT2);

    queue.push(PaintEntry {
        oid: *a,
        date: commit_a.committer.when.seconds,
    });
    queue.push(PaintEntry {
        oid: *b,
        date: commit_b.committer.when.seconds,
    });

    while let Some(entry) = queue.pop() {
        let current_flags = *flags.get(&entry.oid).unwrap_or(&0);

        if current_flags & STALE != 0 {
            continue;
        }

        if current_flags & (PARENT1 | PARENT2) == (PARENT1 | PARENT2) {
            flags.insert(entry.oid, current_flags | STALE);
            results.push(entry.oid);

            if !queue_has_nonstale(&queue, &flags) {
                break;
            }
            continue;
        }

        let commit = read_commit(repo, &entry.oid)?;
        for parent in &commit.parents {
            let parent_flags = flags.entry(*parent).or_insert(0);
            let new_flags = *parent_flags | current_flags;
            if new_flags != *parent_flags {
                *parent_flags = new_flags;
                let parent_commit = read_commit(repo, parent)?;
                queue.push(PaintEntry {
                    oid: *parent,
                    date: parent_commit.committer.when.seconds,
                });
            }
        }
    }

    Ok(results)
}

fn queue_has_nonstale(queue: &BinaryHeap<PaintEntry>, flags: &HashMap<ObjectId, u8>) -> bool {
    queue.iter().any(|entry| {
        let f = flags.get(&entry.oid).copied().unwrap_or(0);
        f & STALE == 0
    })
}

/// Drop candidates that are ancestors of other candidates.
fn remove_redundant(
    repo: &Repository,
    bases: Vec<ObjectId>,
) -> Result<Vec<ObjectId>, WalkError> {
    if bases.len() <= 1 {
        return Ok(bases);
    }

    let mut to_remove: HashSet<usize> = HashSet::new();

    for i in 0..bases.len() {
        if to_remove.contains(&i) {
            continue;
        }
        for j in (i + 1)..bases.len() {
            if to_remove.contains(&j) {
                continue;
            }
            if is_ancestor_direct(repo, &bases[i], &bases[j])? {
                to_remove.insert(i);
                break;
            } else if is_ancestor_direct(repo, &bases[j], &bases[i])? {
                to_remove.insert(j);
            }
        }
    }

    Ok(bases
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !to_remove.contains(idx))
        .map(|(_, oid)| oid)
        .collect())
}

/// Plain BFS ancestry check; avoids recursing back into merge_bases.
fn is_ancestor_direct(
    repo: &Repository,
    ancestor: &ObjectId,
    descendant: &ObjectId,
) -> Result<bool, WalkError> {
    if ancestor == descendant {
        return Ok(true);
    }

    let mut queue = VecDeque::new();
    let mut visited = HashSet::new();
    queue.push_back(*descendant);
    visited.insert(*descendant);

    while let Some(current) = queue.pop_front() {
        if current == *ancestor {
            return Ok(true);
        }
        let commit = read_commit(repo, &current)?;
        for parent in &commit.parents {
            if visited.insert(*parent) {
                queue.push_back(*parent);
            }
        }
    }

    Ok(false)
}
