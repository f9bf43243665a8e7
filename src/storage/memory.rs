//! In-memory store for dry runs and tests.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use super::FileStore;
use crate::error::{Result, SmartSaveError};

/// A [`FileStore`] that keeps directories and file paths in memory.
///
/// Saves can be made to fail with a given I/O error kind, and directory
/// creation can be disabled, to exercise the retry path.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    directories: RefCell<BTreeSet<PathBuf>>,
    files: RefCell<BTreeSet<PathBuf>>,
    fail_saves: Cell<Option<io::ErrorKind>>,
    inert_make_directories: Cell<bool>,
    save_attempts: Cell<usize>,
    make_directories_calls: Cell<usize>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `directory` and its ancestors.
    pub fn with_directory(self, directory: impl AsRef<Path>) -> Self {
        self.insert_directory_chain(directory.as_ref());
        self
    }

    /// Register a file, creating its parent chain.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.insert_directory_chain(parent);
        }
        self.files.borrow_mut().insert(path.to_path_buf());
        self
    }

    /// Make every subsequent `save_as` fail with `kind`.
    pub fn fail_saves_with(&self, kind: io::ErrorKind) {
        self.fail_saves.set(Some(kind));
    }

    /// Make `make_directories` succeed without creating anything.
    pub fn inert_make_directories(&self) {
        self.inert_make_directories.set(true);
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.files.borrow().contains(path.as_ref())
    }

    pub fn has_directory(&self, path: impl AsRef<Path>) -> bool {
        self.directories.borrow().contains(path.as_ref())
    }

    /// All file paths, sorted.
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.borrow().iter().cloned().collect()
    }

    pub fn save_attempts(&self) -> usize {
        self.save_attempts.get()
    }

    pub fn make_directories_calls(&self) -> usize {
        self.make_directories_calls.get()
    }

    fn insert_directory_chain(&self, directory: &Path) {
        let mut directories = self.directories.borrow_mut();
        for ancestor in directory.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            directories.insert(ancestor.to_path_buf());
        }
    }
}

impl FileStore for MemoryFileStore {
    fn list_entries(&self, directory: &Path) -> Result<Vec<String>> {
        if !self.has_directory(directory) {
            return Err(SmartSaveError::ListFailed {
                path: directory.to_path_buf(),
                source: io::Error::from(io::ErrorKind::NotFound),
            });
        }

        let files = self.files.borrow();
        let directories = self.directories.borrow();
        let names = files
            .iter()
            .chain(directories.iter())
            .filter(|p| p.parent() == Some(directory))
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        Ok(names)
    }

    fn make_directories(&self, directory: &Path) -> Result<()> {
        self.make_directories_calls.set(self.make_directories_calls.get() + 1);
        if !self.inert_make_directories.get() {
            self.insert_directory_chain(directory);
        }
        Ok(())
    }

    fn save_as(&self, path: &Path) -> Result<()> {
        self.save_attempts.set(self.save_attempts.get() + 1);

        if let Some(kind) = self.fail_saves.get() {
            return Err(SmartSaveError::SaveFailed {
                path: path.to_path_buf(),
                source: io::Error::from(kind),
            });
        }

        let parent = path.parent().unwrap_or_else(|| Path::new(""));
        if !parent.as_os_str().is_empty() && !self.has_directory(parent) {
            return Err(SmartSaveError::DirectoryMissing(parent.to_path_buf()));
        }

        self.files.borrow_mut().insert(path.to_path_buf());
        Ok(())
    }
}
