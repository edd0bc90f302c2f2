//! Shared scaffolding for the rebase scenario tests: build bare
//! repositories in temp directories from nested tree descriptions.
#![allow(dead_code)]

use std::collections::BTreeMap;

use bstr::ByteSlice;
use regraft_object::{FileMode, ObjectId, Signature, Timestamp, TreeEntry};
use regraft_store::{Repository, TreeBuilder};

pub const USER_NAME: &str = "Fulanito D'Tal";
pub const USER_EMAIL: &str = "fulanito@foo.bar";

pub fn create_repository() -> (tempfile::TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = Repository::init(dir.path().join("repo.git")).unwrap();
    repo.config_mut().set("user.name", USER_NAME);
    repo.config_mut().set("user.email", USER_EMAIL);
    repo.config().save().unwrap();
    (dir, repo)
}

pub fn signature(ts: i64) -> Signature {
    Signature::new(USER_NAME, USER_EMAIL, Timestamp::new(ts, 0))
}

#[derive(Clone)]
enum Item {
    Blob(FileMode, String),
    Dir(TestTree),
}

/// A tree described as nested maps, written to the store on demand.
/// Empty subtrees are skipped on write, as no tool ever records them.
#[derive(Clone, Default)]
pub struct TestTree {
    items: BTreeMap<String, Item>,
}

impl TestTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a regular-mode blob.
    pub fn blob(&mut self, name: &str, content: &str) {
        self.blob_with_mode(name, FileMode::Regular, content);
    }

    pub fn blob_with_mode(&mut self, name: &str, mode: FileMode, content: &str) {
        assert!(!name.contains('/'), "one path component at a time");
        assert!(mode.is_blob());
        self.items
            .insert(name.to_string(), Item::Blob(mode, content.to_string()));
    }

    /// Add (or get) a subtree.
    pub fn dir(&mut self, name: &str) -> &mut TestTree {
        assert!(!name.contains('/'), "one path component at a time");
        let item = self
            .items
            .entry(name.to_string())
            .or_insert_with(|| Item::Dir(TestTree::new()));
        match item {
            Item::Dir(sub) => sub,
            Item::Blob(..) => panic!("{name} is a blob, not a directory"),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.items.remove(name);
    }

    /// Write the tree (root trees are written even when empty).
    pub fn write(&self, repo: &Repository) -> ObjectId {
        self.write_inner(repo, true)
            .expect("the root tree is always written")
    }

    fn write_inner(&self, repo: &Repository, root: bool) -> Option<ObjectId> {
        let mut builder = TreeBuilder::new();
        for (name, item) in &self.items {
            match item {
                Item::Blob(mode, content) => {
                    let oid = repo.create_blob(content.as_bytes()).unwrap();
                    builder.insert(name.as_str(), oid, *mode);
                }
                Item::Dir(sub) => {
                    if let Some(oid) = sub.write_inner(repo, false) {
                        builder.insert(name.as_str(), oid, FileMode::Tree);
                    }
                }
            }
        }
        if !root && builder.is_empty() {
            return None;
        }
        Some(builder.write(repo.store()).unwrap())
    }
}

/// Write `tree` and commit it.
pub fn commit_tree(
    repo: &Repository,
    tree: &TestTree,
    message: &str,
    parents: Vec<ObjectId>,
    ts: i64,
) -> ObjectId {
    let tree_id = tree.write(repo);
    repo.create_commit(signature(ts), signature(ts), message, tree_id, parents)
        .unwrap()
}

/// The entry at a `/`-separated path of a commit's tree.
pub fn entry_at(repo: &Repository, commit: &ObjectId, path: &str) -> Option<TreeEntry> {
    let commit = repo.find_commit(commit).unwrap();
    let tree = repo.find_tree(&commit.tree).unwrap();
    repo.entry_at_path(&tree, path.as_bytes().as_bstr())
        .unwrap()
}

/// The text of the blob at a path of a commit's tree.
pub fn blob_text(repo: &Repository, commit: &ObjectId, path: &str) -> String {
    let entry =
        entry_at(repo, commit, path).unwrap_or_else(|| panic!("no entry at {path}"));
    String::from_utf8(repo.find_blob(&entry.oid).unwrap().data).unwrap()
}

/// Number of entries in a commit's root tree.
pub fn root_len(repo: &Repository, commit: &ObjectId) -> usize {
    let commit = repo.find_commit(commit).unwrap();
    repo.find_tree(&commit.tree).unwrap().len()
}
