//! Streaming SHA-1 hashing with collision detection.

use digest::Digest;

use crate::{ObjectError, ObjectId, ObjectType};

/// Streaming hash computation for object ids.
///
/// Data can be fed incrementally with [`update`](Hasher::update) or through
/// the [`std::io::Write`] implementation, then finalised into an [`ObjectId`].
/// A detected SHA-1 collision is reported as an error rather than silently
/// producing an id.
pub struct Hasher {
    inner: Box<sha1_checked::Sha1>,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            inner: Box::new(sha1_checked::Sha1::new()),
        }
    }

    /// Feed data into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalize and return the id.
    pub fn finalize(self) -> Result<ObjectId, ObjectError> {
        let result = self.inner.try_finalize();
        if result.has_collision() {
            return Err(ObjectError::HashCollision);
        }
        ObjectId::from_bytes(result.hash().as_slice())
    }

    /// Convenience: hash a byte slice in one call.
    pub fn digest(data: &[u8]) -> Result<ObjectId, ObjectError> {
        let mut h = Self::new();
        h.update(data);
        h.finalize()
    }

    /// Hash an object: `"<type> <len>\0<content>"`.
    pub fn hash_object(obj_type: ObjectType, content: &[u8]) -> Result<ObjectId, ObjectError> {
        let header = format!("{} {}\0", obj_type, content.len());
        let mut h = Self::new();
        h.update(header.as_bytes());
        h.update(content);
        h.finalize()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::io::Write for Hasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_matches_known_digest() {
        let oid = Hasher::digest(b"").unwrap();
        assert_eq!(oid.to_hex(), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }

    #[test]
    fn incremental_matches_one_shot() {
        let mut h = Hasher::new();
        h.update(b"hello ");
        h.update(b"world");
        assert_eq!(
            h.finalize().unwrap(),
            Hasher::digest(b"hello world").unwrap()
        );
    }

    #[test]
    fn object_hash_matches_git() {
        // `echo -n 'hello world' | git hash-object --stdin`
        let oid = Hasher::hash_object(ObjectType::Blob, b"hello world").unwrap();
        assert_eq!(oid.to_hex(), "95d09f2b10159347eece71399a7e2e907ea3df4f");
    }

    #[test]
    fn write_impl_feeds_hasher() {
        use std::io::Write;
        let mut h = Hasher::new();
        h.write_all(b"hello world").unwrap();
        assert_eq!(
            h.finalize().unwrap(),
            Hasher::digest(b"hello world").unwrap()
        );
    }
}
