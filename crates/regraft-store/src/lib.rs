//! Object storage for regraft.
//!
//! A loose-object database (zlib-compressed files fanned out by id prefix),
//! a scratch tree builder, a minimal config file, and a [`Repository`]
//! facade tying them together under one directory. Writes are purely
//! additive and content-addressed; there are no refs, no index, and no
//! working directory.

mod builder;
mod config;
mod loose;
mod repo;

pub use builder::TreeBuilder;
pub use config::Config;
pub use loose::Store;
pub use repo::Repository;

use regraft_object::{ObjectError, ObjectId};

/// Errors produced by the object store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    #[error("corrupt object {oid}: {reason}")]
    Corrupt { oid: ObjectId, reason: String },

    #[error("expected {expected} object, got {actual} for {oid}")]
    UnexpectedType {
        oid: ObjectId,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("not a repository: {0}")]
    NotARepository(std::path::PathBuf),

    #[error("config parse error at line {line}: {reason}")]
    ConfigParse { line: usize, reason: String },

    #[error("identity not configured: set user.name and user.email")]
    MissingIdentity,

    #[error(transparent)]
    Object(#[from] ObjectError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
