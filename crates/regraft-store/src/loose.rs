use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use regraft_object::hash::Hasher;
use regraft_object::{header, Blob, Commit, Object, ObjectId, Tree};

use crate::StoreError;

/// Loose object database rooted at an objects directory.
///
/// Objects live at `<objects_dir>/xx/xxxx...` as zlib-compressed
/// `"<type> <len>\0<content>"` files.
pub struct Store {
    objects_dir: PathBuf,
}

impl Store {
    /// Open a store over the given objects directory. The directory is not
    /// required to exist yet; the first write creates it.
    pub fn open(objects_dir: impl Into<PathBuf>) -> Self {
        Self {
            objects_dir: objects_dir.into(),
        }
    }

    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn object_path(&self, oid: &ObjectId) -> PathBuf {
        self.objects_dir.join(oid.loose_path())
    }

    /// Check whether an object exists.
    pub fn contains(&self, oid: &ObjectId) -> bool {
        self.object_path(oid).is_file()
    }

    /// Read an object by id.
    ///
    /// Returns `Ok(None)` if the object does not exist; an object that
    /// exists but cannot be decompressed or parsed is an error.
    pub fn read(&self, oid: &ObjectId) -> Result<Option<Object>, StoreError> {
        let path = self.object_path(oid);
        let compressed = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut decoder = ZlibDecoder::new(compressed.as_slice());
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| StoreError::Corrupt {
                oid: *oid,
                reason: format!("zlib: {e}"),
            })?;

        Ok(Some(Object::parse(&decompressed)?))
    }

    /// Read an object that must exist.
    pub fn read_existing(&self, oid: &ObjectId) -> Result<Object, StoreError> {
        self.read(oid)?.ok_or(StoreError::NotFound(*oid))
    }

    /// Read a commit, erroring on a different object kind.
    pub fn read_commit(&self, oid: &ObjectId) -> Result<Commit, StoreError> {
        match self.read_existing(oid)? {
            Object::Commit(c) => Ok(c),
            other => Err(StoreError::UnexpectedType {
                oid: *oid,
                expected: "commit",
                actual: other.object_type().as_str(),
            }),
        }
    }

    /// Read a tree, erroring on a different object kind.
    pub fn read_tree(&self, oid: &ObjectId) -> Result<Tree, StoreError> {
        match self.read_existing(oid)? {
            Object::Tree(t) => Ok(t),
            other => Err(StoreError::UnexpectedType {
                oid: *oid,
                expected: "tree",
                actual: other.object_type().as_str(),
            }),
        }
    }

    /// Read a blob, erroring on a different object kind.
    pub fn read_blob(&self, oid: &ObjectId) -> Result<Blob, StoreError> {
        match self.read_existing(oid)? {
            Object::Blob(b) => Ok(b),
            other => Err(StoreError::UnexpectedType {
                oid: *oid,
                expected: "blob",
                actual: other.object_type().as_str(),
            }),
        }
    }

    /// Write an object. Returns its id.
    ///
    /// Content-addressed and idempotent: writing an object that already
    /// exists is a no-op. The file is written atomically (temp file +
    /// rename); losing a rename race to another writer counts as success.
    pub fn write(&self, obj: &Object) -> Result<ObjectId, StoreError> {
        let content = obj.serialize_content();
        let hdr = header::write_header(obj.object_type(), content.len());

        let oid = {
            let mut hasher = Hasher::new();
            hasher.update(&hdr);
            hasher.update(&content);
            hasher.finalize()?
        };

        if self.contains(&oid) {
            return Ok(oid);
        }

        let final_path = self.object_path(&oid);
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.write_to_temp(&hdr, &content)?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => {}
            Err(_) if final_path.exists() => {
                let _ = fs::remove_file(&tmp_path);
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(StoreError::Io(e));
            }
        }

        Ok(oid)
    }

    /// Compress header + content into a temp file inside the objects
    /// directory (same filesystem, so the rename stays atomic).
    fn write_to_temp(&self, hdr: &[u8], content: &[u8]) -> Result<PathBuf, StoreError> {
        fs::create_dir_all(&self.objects_dir)?;
        let tmp_path = self.objects_dir.join(format!(
            "tmp_obj_{}",
            std::process::id()
                ^ std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .subsec_nanos()
        ));

        let file = fs::File::create(&tmp_path)?;
        let mut encoder = ZlibEncoder::new(file, flate2::Compression::default());
        encoder.write_all(hdr)?;
        encoder.write_all(content)?;
        encoder.finish()?;

        Ok(tmp_path)
    }
}
