//! Failures when persisting or restoring a run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("I/O failure: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value could not be encoded for writing.
    #[error("cannot encode {0}")]
    Encoding(String),

    /// Population checkpoint could not be written, validated or decoded.
    #[error("checkpoint: {0}")]
    Checkpoint(String),

    /// Gzip stream of a run archive is broken.
    #[error("run archive: {0}")]
    Archive(String),

    #[error("archive hash mismatch: expected {expected}, found {found}")]
    HashMismatch { expected: String, found: String },

    /// Well-formed data that cannot describe a run.
    #[error("invalid data: {0}")]
    Invalid(String),

    #[error("{} does not exist", .0.display())]
    Missing(PathBuf),

    #[error("while {action}: {source}")]
    Context {
        action: String,
        source: Box<IoError>,
    },
}

pub type Result<T> = std::result::Result<T, IoError>;

impl IoError {
    #[must_use]
    pub fn encoding<S: Into<String>>(what: S) -> Self {
        Self::Encoding(what.into())
    }

    #[must_use]
    pub fn checkpoint<S: Into<String>>(msg: S) -> Self {
        Self::Checkpoint(msg.into())
    }

    #[must_use]
    pub fn archive<S: Into<String>>(msg: S) -> Self {
        Self::Archive(msg.into())
    }

    #[must_use]
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::Invalid(msg.into())
    }

    #[must_use]
    pub fn missing<P: Into<PathBuf>>(path: P) -> Self {
        Self::Missing(path.into())
    }

    /// Names what was being attempted when `self` happened.
    #[must_use]
    pub fn during<S: Into<String>>(self, action: S) -> Self {
        Self::Context {
            action: action.into(),
            source: Box::new(self),
        }
    }

    /// True when the root cause is a file that is not there.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        match self {
            Self::Missing(_) => true,
            Self::FileSystem(e) => e.kind() == std::io::ErrorKind::NotFound,
            Self::Context { source, .. } => source.is_missing(),
            _ => false,
        }
    }
}
