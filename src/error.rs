//! Error types for smartsave.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by scene-file naming, discovery and saving.
#[derive(Debug, Error)]
pub enum SmartSaveError {
    /// The save target's directory does not exist. The only error that
    /// `SceneFile::save` recovers from (by creating it once).
    #[error("directory does not exist: {0}")]
    DirectoryMissing(PathBuf),

    /// Exclusive save refused to overwrite an existing file.
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    /// The highest version on disk cannot be advanced.
    #[error("version {0} is the highest representable version")]
    VersionOverflow(u32),

    #[error("no save directory set")]
    NoSaveTarget,

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("not a versioned scene name: {0}")]
    UnparseableName(PathBuf),

    #[error("failed to list {path}: {source}")]
    ListFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to save {path}: {source}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read source scene {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SmartSaveError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        SmartSaveError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SmartSaveError>;
