use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a scan. Nothing is renamed once one of these is raised.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("The provided root path doesn't exist: {0:?}")]
    RootNotFound(PathBuf),

    #[error("Season folder {folder:?} does not end in a season number")]
    InvalidSeasonFolder { folder: String },

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid episode pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Per-file rename failures. These are collected, never raised.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("target {0:?} already exists")]
    AlreadyExists(PathBuf),

    #[error("no permission to rename {0:?}")]
    PermissionDenied(PathBuf),

    #[error("source {0:?} not found")]
    SourceNotFound(PathBuf),

    #[error("{0}")]
    Io(#[from] io::Error),
}

impl RenameError {
    /// Classify an OS error raised while renaming `source`.
    pub fn from_io(source: PathBuf, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(source),
            io::ErrorKind::NotFound => Self::SourceNotFound(source),
            _ => Self::Io(err),
        }
    }
}
