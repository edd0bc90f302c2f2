//! Synchronized in-order walk across the original tree and both parent
//! tree vectors.

use bstr::BStr;
use regraft_object::{Tree, TreeEntry};

/// One emitted path: the smallest not-yet-consumed name across all input
/// trees, with per-input presence.
pub(crate) struct WalkItem<'t> {
    pub item: Option<&'t TreeEntry>,
    pub old_items: Vec<Option<&'t TreeEntry>>,
    pub new_items: Vec<Option<&'t TreeEntry>>,
}

impl<'t> WalkItem<'t> {
    /// The name all present items share.
    pub fn name(&self) -> &'t BStr {
        self.item
            .into_iter()
            .chain(self.old_items.iter().copied().flatten())
            .chain(self.new_items.iter().copied().flatten())
            .map(|e| e.name.as_ref())
            .next()
            .expect("an emitted item has at least one present entry")
    }
}

struct Cursor<'t> {
    entries: &'t [TreeEntry],
    pos: usize,
}

impl<'t> Cursor<'t> {
    fn new(tree: Option<&'t Tree>) -> Self {
        Self {
            entries: tree.map(|t| t.entries.as_slice()).unwrap_or(&[]),
            pos: 0,
        }
    }

    fn current(&self) -> Option<&'t TreeEntry> {
        self.entries.get(self.pos)
    }

    /// Take the current entry if its name matches, advancing the cursor.
    fn take_if(&mut self, name: &BStr) -> Option<&'t TreeEntry> {
        match self.current() {
            Some(entry) if entry.name == name => {
                self.pos += 1;
                Some(entry)
            }
            _ => None,
        }
    }
}

/// Lazy synchronized walk. Relies on every input tree being ordered by
/// name in byte order; at each step the smallest live name is emitted and
/// exactly the cursors holding it advance. Finite and non-restartable.
pub(crate) struct MultiTreeWalk<'t> {
    commit: Cursor<'t>,
    old_parents: Vec<Cursor<'t>>,
    new_parents: Vec<Cursor<'t>>,
}

impl<'t> MultiTreeWalk<'t> {
    pub fn new(
        commit_tree: Option<&'t Tree>,
        old_parent_trees: &'t [Option<Tree>],
        new_parent_trees: &'t [Option<Tree>],
    ) -> Self {
        Self {
            commit: Cursor::new(commit_tree),
            old_parents: old_parent_trees
                .iter()
                .map(|t| Cursor::new(t.as_ref()))
                .collect(),
            new_parents: new_parent_trees
                .iter()
                .map(|t| Cursor::new(t.as_ref()))
                .collect(),
        }
    }

    fn next_name(&self) -> Option<&'t BStr> {
        let mut smallest: Option<&'t BStr> = None;
        let candidates = self
            .commit
            .current()
            .into_iter()
            .chain(self.old_parents.iter().filter_map(Cursor::current))
            .chain(self.new_parents.iter().filter_map(Cursor::current));
        for entry in candidates {
            let name = entry.name.as_ref();
            smallest = match smallest {
                Some(current) if current <= name => Some(current),
                _ => Some(name),
            };
        }
        smallest
    }

    pub fn next(&mut self) -> Option<WalkItem<'t>> {
        let name = self.next_name()?;

        let item = self.commit.take_if(name);
        let old_items = self
            .old_parents
            .iter_mut()
            .map(|cursor| cursor.take_if(name))
            .collect();
        let new_items = self
            .new_parents
            .iter_mut()
            .map(|cursor| cursor.take_if(name))
            .collect();

        Some(WalkItem {
            item,
            old_items,
            new_items,
        })
    }
}
