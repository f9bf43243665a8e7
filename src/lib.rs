//! # smartsave
//!
//! Versioned scene files for DCC tools.
//!
//! A scene file is named `<descriptor>_<version>.<extension>` with the
//! version zero-padded to three digits (`ship_001.ma`). smartsave composes
//! those names, saves them (creating missing directories), and finds the
//! highest version in a directory to save the next one.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smartsave::{IncrementOutcome, LocalFileStore, MatchPolicy, SceneFile};
//!
//! let store = LocalFileStore::default();
//! let mut scene = SceneFile::new("scenes", "ship", 1, "ma")?;
//!
//! // scenes/ship_001.ma
//! scene.save(&store)?;
//!
//! // scenes/ship_002.ma
//! match scene.increment_save(&store, MatchPolicy::Exact)? {
//!     IncrementOutcome::Saved { path, .. } => println!("saved {}", path.display()),
//!     IncrementOutcome::NoPriorVersion => println!("nothing to increment"),
//! }
//! # Ok::<(), smartsave::SmartSaveError>(())
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod host;
pub mod naming;
pub mod scene;
pub mod storage;

// Re-exports for convenience
pub use config::Config;
pub use discovery::{MatchPolicy, VersionEntry, VersionScan};
pub use error::{Result, SmartSaveError};
pub use host::{HostSceneQuery, OpenScene};
pub use scene::{IncrementOutcome, SceneFile};
pub use storage::{FileStore, LocalFileStore, MemoryFileStore, SceneSource};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_save_then_increment_on_disk() {
        let dir = tempdir().unwrap();
        let scenes = dir.path().join("proj").join("scenes");
        let store = LocalFileStore::default();

        let mut scene = SceneFile::new(&scenes, "ship", 1, "ma").unwrap();

        // Nothing on disk yet: increment is a no-op even after the
        // directory exists.
        fs::create_dir_all(&scenes).unwrap();
        let outcome = scene.increment_save(&store, MatchPolicy::Exact).unwrap();
        assert_eq!(outcome, IncrementOutcome::NoPriorVersion);
        assert!(fs::read_dir(&scenes).unwrap().next().is_none());

        let first = scene.save(&store).unwrap();
        assert_eq!(first, scenes.join("ship_001.ma"));
        assert!(first.exists());

        let outcome = scene.increment_save(&store, MatchPolicy::Exact).unwrap();
        assert_eq!(outcome.saved_path(), Some(scenes.join("ship_002.ma").as_path()));
        assert_eq!(scene.version(), 2);
    }

    #[test]
    fn test_open_scene_to_next_version() {
        let dir = tempdir().unwrap();
        let open_path = dir.path().join("car_004.hip");
        fs::write(&open_path, b"scene data").unwrap();
        fs::write(dir.path().join("car_007.hip"), b"").unwrap();

        let host = OpenScene::new(Some(open_path.clone()));
        let mut scene = SceneFile::from_host(&host);
        assert_eq!(scene.version(), 4);

        let store = LocalFileStore::new(SceneSource::CopyFrom(open_path));
        let outcome = scene.increment_save(&store, MatchPolicy::Exact).unwrap();

        let written = dir.path().join("car_008.hip");
        assert_eq!(outcome.saved_path(), Some(written.as_path()));
        assert_eq!(fs::read(&written).unwrap(), b"scene data");
    }

    #[test]
    fn test_config_drives_scene_defaults() {
        let config = Config::from_toml("descriptor = \"env\"\nextension = \"mb\"").unwrap();
        let scene = SceneFile::new("/proj", config.descriptor, config.version, config.extension).unwrap();
        assert_eq!(scene.compose_name(), "env_001.mb");
    }
}
