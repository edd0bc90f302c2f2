use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use regraft_object::ObjectId;
use regraft_store::Repository;

use crate::{read_commit, WalkError};

/// Sort order for commit traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// By committer date, newest first (default).
    #[default]
    Chronological,
    /// Topological: children always appear before their parents.
    Topological,
}

/// An entry in the date-ordered walk queue.
struct WalkEntry {
    oid: ObjectId,
    commit_date: i64,
    /// Insertion counter for stable ordering within the same date.
    insertion_ctr: u64,
}

/// State for the topological order (lazily prepared).
struct TopoState {
    /// Number of not-yet-emitted children per commit.
    indegree: HashMap<ObjectId, u32>,
    /// Commits ready to emit (in-degree zero).
    ready: VecDeque<ObjectId>,
    /// Committer dates, for deterministic tie-breaking.
    dates: HashMap<ObjectId, i64>,
}

/// Revision walk over a repository's commit graph.
pub struct Walk<'a> {
    repo: &'a Repository,
    queue: BinaryHeap<WalkEntry>,
    seen: HashSet<ObjectId>,
    hidden: HashSet<ObjectId>,
    sort: SortOrder,
    reverse: bool,
    insertion_ctr: u64,
    topo_state: Option<TopoState>,
    prepared: bool,
    /// For reverse mode: forward-order commits, popped from the end.
    reverse_buffer: Option<Vec<ObjectId>>,
}

impl<'a> Walk<'a> {
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            queue: BinaryHeap::new(),
            seen: HashSet::new(),
            hidden: HashSet::new(),
            sort: SortOrder::default(),
            reverse: false,
            insertion_ctr: 0,
            topo_state: None,
            prepared: false,
            reverse_buffer: None,
        }
    }

    /// Add a starting commit.
    pub fn push(&mut self, oid: ObjectId) -> Result<(), WalkError> {
        if self.seen.contains(&oid) {
            return Ok(());
        }
        let commit = read_commit(self.repo, &oid)?;
        self.seen.insert(oid);
        self.enqueue(oid, commit.committer.when.seconds);
        Ok(())
    }

    /// Exclude a commit and all of its ancestors from the walk.
    pub fn hide(&mut self, oid: ObjectId) -> Result<(), WalkError> {
        let mut stack = vec![oid];
        while let Some(current) = stack.pop() {
            if !self.hidden.insert(current) {
                continue;
            }
            let commit = read_commit(self.repo, &current)?;
            for parent in &commit.parents {
                if !self.hidden.contains(parent) {
                    stack.push(*parent);
                }
            }
        }
        Ok(())
    }

    /// Set the sort order. Must be called before iteration starts.
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Emit commits in the reverse of the chosen order (oldest first).
    pub fn set_reverse(&mut self, reverse: bool) {
        self.reverse = reverse;
    }

    fn enqueue(&mut self, oid: ObjectId, commit_date: i64) {
        let entry = WalkEntry {
            oid,
            commit_date,
            insertion_ctr: self.insertion_ctr,
        };
        self.insertion_ctr += 1;
        self.queue.push(entry);
    }

    /// Collect all reachable, non-hidden commits and compute child counts.
    fn prepare_topo(&mut self) -> Result<(), WalkError> {
        if self.prepared {
            return Ok(());
        }
        self.prepared = true;

        let mut indegree: HashMap<ObjectId, u32> = HashMap::new();
        let mut dates: HashMap<ObjectId, i64> = HashMap::new();
        let mut bfs: VecDeque<ObjectId> = VecDeque::new();
        let mut visited: HashSet<ObjectId> = HashSet::new();
        let mut all: Vec<ObjectId> = Vec::new();

        while let Some(entry) = self.queue.pop() {
            if visited.insert(entry.oid) {
                bfs.push_back(entry.oid);
            }
        }

        while let Some(oid) = bfs.pop_front() {
            if self.hidden.contains(&oid) {
                continue;
            }
            let commit = read_commit(self.repo, &oid)?;
            dates.insert(oid, commit.committer.when.seconds);
            indegree.entry(oid).or_insert(0);

            for parent in &commit.parents {
                if !self.hidden.contains(parent) {
                    *indegree.entry(*parent).or_insert(0) += 1;
                    if visited.insert(*parent) {
                        bfs.push_back(*parent);
                    }
                }
            }
            all.push(oid);
        }

        // Tips (no unemitted children) start the ready queue, newest first.
        let mut tips: Vec<ObjectId> = all
            .iter()
            .filter(|oid| indegree.get(oid).copied().unwrap_or(0) == 0)
            .copied()
            .collect();
        tips.sort_by(|a, b| {
            let da = dates.get(a).copied().unwrap_or(0);
            let db = dates.get(b).copied().unwrap_or(0);
            db.cmp(&da).then_with(|| a.cmp(b))
        });

        self.topo_state = Some(TopoState {
            indegree,
            ready: tips.into_iter().collect(),
            dates,
        });

        Ok(())
    }

    fn next_topo(&mut self) -> Result<Option<ObjectId>, WalkError> {
        if !self.prepared {
            self.prepare_topo()?;
        }

        let oid = match self.topo_state.as_mut() {
            Some(state) => match state.ready.pop_front() {
                Some(oid) => oid,
                None => return Ok(None),
            },
            None => return Ok(None),
        };

        let commit = read_commit(self.repo, &oid)?;
        let parents: Vec<ObjectId> = commit
            .parents
            .iter()
            .filter(|p| !self.hidden.contains(p))
            .copied()
            .collect();

        let state = self.topo_state.as_mut().expect("prepared above");
        let mut newly_ready: Vec<(ObjectId, i64)> = Vec::new();
        for parent in &parents {
            if let Some(deg) = state.indegree.get_mut(parent) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 {
                    let date = state.dates.get(parent).copied().unwrap_or(0);
                    newly_ready.push((*parent, date));
                }
            }
        }

        newly_ready.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        for (parent, _) in newly_ready {
            state.ready.push_back(parent);
        }

        Ok(Some(oid))
    }

    fn next_date_order(&mut self) -> Result<Option<ObjectId>, WalkError> {
        while let Some(entry) = self.queue.pop() {
            let oid = entry.oid;
            if self.hidden.contains(&oid) {
                continue;
            }

            let commit = read_commit(self.repo, &oid)?;
            for parent in commit.parents {
                if self.seen.insert(parent) && !self.hidden.contains(&parent) {
                    let parent_commit = read_commit(self.repo, &parent)?;
                    self.enqueue(parent, parent_commit.committer.when.seconds);
                }
            }

            return Ok(Some(oid));
        }
        Ok(None)
    }

    fn next_forward(&mut self) -> Result<Option<ObjectId>, WalkError> {
        match self.sort {
            SortOrder::Topological => self.next_topo(),
            SortOrder::Chronological => self.next_date_order(),
        }
    }

    fn next_raw(&mut self) -> Result<Option<ObjectId>, WalkError> {
        if !self.reverse {
            return self.next_forward();
        }

        if self.reverse_buffer.is_none() {
            let mut buffer = Vec::new();
            while let Some(oid) = self.next_forward()? {
                buffer.push(oid);
            }
            self.reverse_buffer = Some(buffer);
        }
        Ok(self.reverse_buffer.as_mut().and_then(|b| b.pop()))
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<ObjectId, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_raw().transpose()
    }
}

// --- Priority queue ordering ---

impl PartialEq for WalkEntry {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
    }
}

impl Eq for WalkEntry {}

impl PartialOrd for WalkEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WalkEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max-heap: newest commit date first; ties broken by insertion
        // order (earlier insertion wins).
        self.commit_date
            .cmp(&other.commit_date)
            .then_with(|| other.insertion_ctr.cmp(&self.insertion_ctr))
    }
}
