use std::fs;
use std::path::{Path, PathBuf};

use bstr::{BStr, ByteSlice};
use regraft_object::{
    Blob, Commit, Object, ObjectId, Signature, Timestamp, Tree, TreeEntry,
};

use crate::{Config, Store, StoreError};

/// A bare repository: an object store plus a config file under one
/// directory.
///
/// There are no refs and no working directory; callers hold on to commit
/// ids themselves. All writes are additive.
pub struct Repository {
    path: PathBuf,
    store: Store,
    config: Config,
}

impl Repository {
    /// Create a new repository at `path` (an `objects/` directory and an
    /// empty `config`).
    pub fn init(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        fs::create_dir_all(path.join("objects"))?;
        let config = Config::load(path.join("config"))?;
        config.save()?;
        Ok(Self {
            store: Store::open(path.join("objects")),
            config,
            path,
        })
    }

    /// Open an existing repository at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if !path.join("objects").is_dir() {
            return Err(StoreError::NotARepository(path));
        }
        let config = Config::load(path.join("config"))?;
        Ok(Self {
            store: Store::open(path.join("objects")),
            config,
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Read a commit by id.
    pub fn find_commit(&self, oid: &ObjectId) -> Result<Commit, StoreError> {
        self.store.read_commit(oid)
    }

    /// Read a tree by id.
    pub fn find_tree(&self, oid: &ObjectId) -> Result<Tree, StoreError> {
        self.store.read_tree(oid)
    }

    /// Read a blob by id.
    pub fn find_blob(&self, oid: &ObjectId) -> Result<Blob, StoreError> {
        self.store.read_blob(oid)
    }

    /// Write a blob and return its id.
    pub fn create_blob(&self, data: &[u8]) -> Result<ObjectId, StoreError> {
        self.store.write(&Object::Blob(Blob::new(data.to_vec())))
    }

    /// Write a commit and return its id.
    pub fn create_commit(
        &self,
        author: Signature,
        committer: Signature,
        message: impl Into<bstr::BString>,
        tree: ObjectId,
        parents: Vec<ObjectId>,
    ) -> Result<ObjectId, StoreError> {
        let commit = Commit {
            tree,
            parents,
            author,
            committer,
            message: message.into(),
        };
        self.store.write(&Object::Commit(commit))
    }

    /// Look up the entry at a `/`-separated path below `root`.
    ///
    /// Returns `None` when any component is missing, or when a non-final
    /// component is not a subtree.
    pub fn entry_at_path(
        &self,
        root: &Tree,
        path: &BStr,
    ) -> Result<Option<TreeEntry>, StoreError> {
        let mut components = path.split_str("/").peekable();
        let mut current = root.clone();

        while let Some(component) = components.next() {
            let entry = match current.find(component.as_bstr()) {
                Some(entry) => entry.clone(),
                None => return Ok(None),
            };
            if components.peek().is_none() {
                return Ok(Some(entry));
            }
            if !entry.mode.is_tree() {
                return Ok(None);
            }
            current = self.find_tree(&entry.oid)?;
        }

        Ok(None)
    }

    /// Build a signature from the configured identity, stamped "now".
    pub fn signature(&self) -> Result<Signature, StoreError> {
        let name = self
            .config
            .get("user.name")
            .ok_or(StoreError::MissingIdentity)?;
        let email = self
            .config
            .get("user.email")
            .ok_or(StoreError::MissingIdentity)?;
        Ok(Signature::new(name, email, Timestamp::now()))
    }
}
