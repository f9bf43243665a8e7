//! Storage module — the narrow file interface the versioning logic needs.
//!
//! ## Contract
//!
//! ```ignore
//! store.list_entries(dir)      // names in dir, non-recursive
//! store.make_directories(dir)  // create the full chain, ok if present
//! store.save_as(path)          // DirectoryMissing when the parent is absent
//! ```
//!
//! `save_as` must report a missing parent directory as
//! [`SmartSaveError::DirectoryMissing`](crate::SmartSaveError::DirectoryMissing)
//! and nothing else, since that is the one failure `SceneFile::save`
//! recovers from.

pub mod fs;
pub mod memory;

use std::path::Path;

use crate::error::Result;

pub use fs::{LocalFileStore, SceneSource};
pub use memory::MemoryFileStore;

/// File operations performed on behalf of a [`SceneFile`](crate::SceneFile).
pub trait FileStore {
    /// List entry names in `directory` (current level only).
    fn list_entries(&self, directory: &Path) -> Result<Vec<String>>;

    /// Create `directory` and all of its parents. No error if it exists.
    fn make_directories(&self, directory: &Path) -> Result<()>;

    /// Write the current scene to `path`.
    fn save_as(&self, path: &Path) -> Result<()>;
}

impl<T: FileStore + ?Sized> FileStore for &T {
    fn list_entries(&self, directory: &Path) -> Result<Vec<String>> {
        (**self).list_entries(directory)
    }

    fn make_directories(&self, directory: &Path) -> Result<()> {
        (**self).make_directories(directory)
    }

    fn save_as(&self, path: &Path) -> Result<()> {
        (**self).save_as(path)
    }
}
