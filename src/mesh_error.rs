//! MeshCombineError: unified error type for the combine pipeline.
//!
//! Every fallible stage of a job reports through this enum; [`ErrorKind`]
//! classifies a failure independently of the file it came from.

use serde::Serialize;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for mesh-combine operations.
#[derive(Debug, Error)]
pub enum MeshCombineError {
    /// The index (`.pvtu`) file could not be opened or read.
    #[error("cannot read index file `{}`: {source}", path.display())]
    IndexRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A piece-reference marker was found without a quoted path after it.
    #[error("malformed piece reference in `{}` at line {line}", path.display())]
    MalformedReference { path: PathBuf, line: usize },
    /// A partition file is missing or unreadable.
    #[error("cannot read partition `{}`: {source}", path.display())]
    PartitionRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A partition file was readable but its content is not a valid grid.
    #[error("malformed partition `{}`: {reason}", path.display())]
    PartitionFormat { path: PathBuf, reason: String },
    /// A partition's attribute arrays disagree with earlier partitions.
    #[error("schema mismatch in `{}`: {detail}", path.display())]
    SchemaMismatch { path: PathBuf, detail: String },
    /// The combined grid could not be written.
    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A source file could not be removed after a successful stage.
    #[error("cannot remove `{}`: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The worker pool could not be built.
    #[error("worker pool: {0}")]
    Pool(String),
    /// A job panicked; the payload message is kept.
    #[error("job panicked: {0}")]
    Panicked(String),
}

/// Classification of a [`MeshCombineError`], independent of the file involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Parse,
    Read,
    SchemaMismatch,
    Write,
    Delete,
    Pool,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::Read => "ReadError",
            ErrorKind::SchemaMismatch => "SchemaMismatch",
            ErrorKind::Write => "WriteError",
            ErrorKind::Delete => "DeleteError",
            ErrorKind::Pool => "PoolError",
            ErrorKind::Internal => "InternalError",
        };
        f.write_str(name)
    }
}

impl MeshCombineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MeshCombineError::IndexRead { .. } | MeshCombineError::MalformedReference { .. } => {
                ErrorKind::Parse
            }
            MeshCombineError::PartitionRead { .. } | MeshCombineError::PartitionFormat { .. } => {
                ErrorKind::Read
            }
            MeshCombineError::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            MeshCombineError::Write { .. } => ErrorKind::Write,
            MeshCombineError::Delete { .. } => ErrorKind::Delete,
            MeshCombineError::Pool(_) => ErrorKind::Pool,
            MeshCombineError::Panicked(_) => ErrorKind::Internal,
        }
    }

    /// The file the error originated from, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            MeshCombineError::IndexRead { path, .. }
            | MeshCombineError::MalformedReference { path, .. }
            | MeshCombineError::PartitionRead { path, .. }
            | MeshCombineError::PartitionFormat { path, .. }
            | MeshCombineError::SchemaMismatch { path, .. }
            | MeshCombineError::Write { path, .. }
            | MeshCombineError::Delete { path, .. } => Some(path),
            MeshCombineError::Pool(_) | MeshCombineError::Panicked(_) => None,
        }
    }
}

/// Codec-level error raised while decoding or validating a `.vtu` document.
///
/// The reader entry points attach the file path and convert this into
/// [`MeshCombineError::PartitionFormat`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VtuError {
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("missing element <{0}>")]
    MissingElement(&'static str),
    #[error("missing attribute `{attribute}` on <{element}>")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("invalid data array `{name}`: {reason}")]
    InvalidArray { name: String, reason: String },
    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

impl VtuError {
    pub(crate) fn array(name: &str, reason: impl Into<String>) -> Self {
        VtuError::InvalidArray {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
