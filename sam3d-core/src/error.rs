//! Error types for the sam3d-core crate.
//!
//! Absent checkpoint files are never errors here: they surface as a failing
//! [`Verdict`](crate::discovery::Verdict) on the discovery result. Only real I/O
//! failures, unreadable configuration and contract violations toward the loader
//! are represented.

use crate::discovery::Verdict;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for checkpoint resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A directory exists but could not be read or enumerated.
    #[error("cannot read {}: {source}", .path.display())]
    Access {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A discovery result that did not pass was offered to a loader.
    #[error("checkpoints at {} are not loadable: {verdict}", .root.display())]
    NotLoadable { root: PathBuf, verdict: Verdict },

    /// Configuration files could not be parsed or merged.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    pub fn access(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Access {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error came from the filesystem refusing access.
    pub fn is_access(&self) -> bool {
        matches!(self, Self::Access { .. })
    }
}

impl From<walkdir::Error> for ResolveError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::other("filesystem loop detected"));
        Self::Access { path, source }
    }
}

/// Failure while handing a discovery result to a [`CheckpointLoader`](crate::loader::CheckpointLoader).
#[derive(Debug, Error)]
pub enum LoadError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    NotLoadable(ResolveError),

    #[error("loader failed: {0}")]
    Loader(#[source] E),
}
