//! Local filesystem store.
//!
//! Writes scene payloads with std::fs. The payload is either empty or the
//! bytes of an existing scene (the file currently open in the host).

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::FileStore;
use crate::error::{Result, SmartSaveError};

/// What gets written by [`LocalFileStore::save_as`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SceneSource {
    /// Create an empty file.
    #[default]
    Empty,
    /// Copy the bytes of an existing scene.
    CopyFrom(PathBuf),
}

/// Store backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore {
    source: SceneSource,
    /// Refuse to overwrite existing files.
    create_new: bool,
}

impl LocalFileStore {
    pub fn new(source: SceneSource) -> Self {
        Self {
            source,
            create_new: false,
        }
    }

    /// Fail with `AlreadyExists` instead of overwriting. Closes the gap
    /// between scanning a directory and saving into it.
    pub fn create_new(mut self, create_new: bool) -> Self {
        self.create_new = create_new;
        self
    }

    pub fn source(&self) -> &SceneSource {
        &self.source
    }

    fn payload(&self) -> Result<Vec<u8>> {
        match &self.source {
            SceneSource::Empty => Ok(Vec::new()),
            SceneSource::CopyFrom(path) => fs::read(path).map_err(|e| SmartSaveError::SourceUnreadable {
                path: path.clone(),
                source: e,
            }),
        }
    }
}

impl FileStore for LocalFileStore {
    fn list_entries(&self, directory: &Path) -> Result<Vec<String>> {
        let read_dir = fs::read_dir(directory).map_err(|e| SmartSaveError::ListFailed {
            path: directory.to_path_buf(),
            source: e,
        })?;

        let mut names = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| SmartSaveError::ListFailed {
                path: directory.to_path_buf(),
                source: e,
            })?;
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!(entry = ?raw, "skipping non UTF-8 entry"),
            }
        }
        Ok(names)
    }

    fn make_directories(&self, directory: &Path) -> Result<()> {
        if !directory.exists() {
            fs::create_dir_all(directory)?;
        }
        Ok(())
    }

    fn save_as(&self, path: &Path) -> Result<()> {
        // Read the source before touching the target so a missing source is
        // never mistaken for a missing target directory.
        let bytes = self.payload()?;

        let mut options = OpenOptions::new();
        options.write(true);
        if self.create_new {
            options.create_new(true);
        } else {
            options.create(true).truncate(true);
        }

        let mut file = options.open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => {
                SmartSaveError::DirectoryMissing(path.parent().map(Path::to_path_buf).unwrap_or_default())
            }
            ErrorKind::AlreadyExists => SmartSaveError::AlreadyExists(path.to_path_buf()),
            _ => SmartSaveError::SaveFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        file.write_all(&bytes)
            .and_then(|_| file.sync_all())
            .map_err(|e| SmartSaveError::SaveFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        debug!(path = %path.display(), bytes = bytes.len(), "scene written");
        Ok(())
    }
}
