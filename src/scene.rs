//! Versioned scene file — naming fields plus direct and increment saves.
//!
//! ```ignore
//! let mut scene = SceneFile::new("/proj/scenes", "ship", 1, "ma")?;
//! scene.save(&store)?;                                  // ship_001.ma
//! scene.increment_save(&store, MatchPolicy::Exact)?;    // ship_002.ma
//! ```
//!
//! `increment_save` scans the directory and then saves. Another process may
//! write the same name in between; use an exclusive store
//! (`LocalFileStore::create_new`) when that matters.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::discovery::{self, MatchPolicy, VersionScan};
use crate::error::{Result, SmartSaveError};
use crate::host::HostSceneQuery;
use crate::naming::{self, SEPARATOR};
use crate::storage::FileStore;

pub const DEFAULT_DESCRIPTOR: &str = "main";
pub const DEFAULT_VERSION: u32 = 1;
pub const DEFAULT_EXTENSION: &str = "ma";

/// A scene file identified by directory, descriptor, version and extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SceneFields")]
pub struct SceneFile {
    directory: PathBuf,
    descriptor: String,
    version: u32,
    extension: String,
}

/// Unvalidated fields, checked by `SceneFile::new` on deserialize.
#[derive(Deserialize)]
struct SceneFields {
    #[serde(default)]
    directory: PathBuf,
    descriptor: String,
    version: u32,
    extension: String,
}

impl TryFrom<SceneFields> for SceneFile {
    type Error = SmartSaveError;

    fn try_from(fields: SceneFields) -> Result<Self> {
        Self::new(fields.directory, fields.descriptor, fields.version, fields.extension)
    }
}

/// Outcome of [`SceneFile::increment_save`]. Failures are the `Err` side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IncrementOutcome {
    /// A new version was written.
    Saved { path: PathBuf, version: u32 },
    /// Nothing to increment from; nothing was written.
    NoPriorVersion,
}

impl IncrementOutcome {
    pub fn saved_path(&self) -> Option<&Path> {
        match self {
            IncrementOutcome::Saved { path, .. } => Some(path.as_path()),
            IncrementOutcome::NoPriorVersion => None,
        }
    }
}

impl Default for SceneFile {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(),
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            version: DEFAULT_VERSION,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl SceneFile {
    pub fn new(
        directory: impl Into<PathBuf>,
        descriptor: impl Into<String>,
        version: u32,
        extension: impl Into<String>,
    ) -> Result<Self> {
        let descriptor = descriptor.into();
        let extension = extension.into();
        validate_descriptor(&descriptor)?;
        validate_version(version)?;
        validate_extension(&extension)?;
        Ok(Self {
            directory: directory.into(),
            descriptor,
            version,
            extension,
        })
    }

    /// Parse a path like `/proj/scenes/ship_004.ma` back into its fields.
    ///
    /// Uses the same split rule as the directory scan with
    /// [`MatchPolicy::Exact`], so `ship_002_final.ma` is rejected. A `_000`
    /// version is clamped to 1.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unparseable = || SmartSaveError::UnparseableName(path.to_path_buf());

        let name = path.file_name().and_then(|n| n.to_str()).ok_or_else(unparseable)?;
        let (stem, extension) = name.rsplit_once('.').ok_or_else(unparseable)?;
        let parts = naming::split_stem(stem)
            .filter(|parts| parts.extra_segments == 0)
            .ok_or_else(unparseable)?;
        let version = naming::parse_version(parts.version).ok_or_else(unparseable)?;

        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::new(directory, parts.descriptor, version.max(1), extension)
    }

    /// Pre-fill from the scene currently open in the host.
    pub fn from_host(host: &dyn HostSceneQuery) -> Self {
        let mut scene = Self::default();
        scene.prefill_from(host);
        scene
    }

    /// Overwrite fields from the host's open scene.
    ///
    /// When the open file does not follow the naming convention only the
    /// directory is taken. Returns `false` if no scene is open.
    pub fn prefill_from(&mut self, host: &dyn HostSceneQuery) -> bool {
        let Some(path) = host.current_scene() else {
            return false;
        };
        match Self::from_path(&path) {
            Ok(scene) => *self = scene,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "open scene is not versioned");
                self.directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
            }
        }
        true
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn set_directory(&mut self, directory: impl Into<PathBuf>) {
        self.directory = directory.into();
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn set_descriptor(&mut self, descriptor: impl Into<String>) -> Result<()> {
        let descriptor = descriptor.into();
        validate_descriptor(&descriptor)?;
        self.descriptor = descriptor;
        Ok(())
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) -> Result<()> {
        validate_version(version)?;
        self.version = version;
        Ok(())
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn set_extension(&mut self, extension: impl Into<String>) -> Result<()> {
        let extension = extension.into();
        validate_extension(&extension)?;
        self.extension = extension;
        Ok(())
    }

    /// File name, e.g. `ship_001.ma`.
    pub fn compose_name(&self) -> String {
        naming::compose_name(&self.descriptor, self.version, &self.extension)
    }

    /// Directory joined with [`compose_name`](Self::compose_name). No I/O.
    pub fn compose_path(&self) -> PathBuf {
        self.directory.join(self.compose_name())
    }

    /// Save at [`compose_path`](Self::compose_path).
    ///
    /// A missing directory is created and the save retried once. Every other
    /// failure, including a failed retry, is returned as is.
    pub fn save<S: FileStore + ?Sized>(&self, store: &S) -> Result<PathBuf> {
        if self.directory.as_os_str().is_empty() {
            return Err(SmartSaveError::NoSaveTarget);
        }

        let path = self.compose_path();
        match store.save_as(&path) {
            Ok(()) => {}
            Err(SmartSaveError::DirectoryMissing(missing)) => {
                warn!(directory = %missing.display(), "missing directories, creating them now");
                store.make_directories(&self.directory)?;
                store.save_as(&path)?;
            }
            Err(e) => return Err(e),
        }

        info!(path = %path.display(), "scene saved");
        Ok(path)
    }

    /// Scan the directory for versions of this descriptor and extension.
    pub fn scan<S: FileStore + ?Sized>(&self, store: &S, policy: MatchPolicy) -> Result<VersionScan> {
        if self.directory.as_os_str().is_empty() {
            return Err(SmartSaveError::NoSaveTarget);
        }
        let entries = store.list_entries(&self.directory)?;
        Ok(discovery::scan(entries, &self.descriptor, &self.extension, policy))
    }

    /// Highest version on disk, `None` when there is none above zero.
    pub fn latest_version<S: FileStore + ?Sized>(&self, store: &S, policy: MatchPolicy) -> Result<Option<u32>> {
        let highest = self.scan(store, policy)?.highest();
        Ok((highest > 0).then_some(highest))
    }

    /// Save one version above the highest found on disk.
    ///
    /// With no prior version nothing is written and `version` is untouched.
    /// A highest version of `u32::MAX` is `VersionOverflow`, not a no-op.
    /// `version` is only advanced once the save succeeds. Calling this twice
    /// writes two new versions.
    pub fn increment_save<S: FileStore + ?Sized>(&mut self, store: &S, policy: MatchPolicy) -> Result<IncrementOutcome> {
        let scan = self.scan(store, policy)?;
        let Some(next) = scan.next_version()? else {
            info!(
                directory = %self.directory.display(),
                descriptor = %self.descriptor,
                "no prior version to increment"
            );
            return Ok(IncrementOutcome::NoPriorVersion);
        };

        let candidate = Self {
            version: next,
            ..self.clone()
        };
        let path = candidate.save(store)?;
        self.version = next;

        Ok(IncrementOutcome::Saved { path, version: next })
    }
}

fn validate_descriptor(descriptor: &str) -> Result<()> {
    if descriptor.is_empty() {
        return Err(SmartSaveError::invalid("descriptor", "must not be empty"));
    }
    if descriptor.contains(SEPARATOR) {
        return Err(SmartSaveError::invalid(
            "descriptor",
            format!("'{}' contains the separator '{}'", descriptor, SEPARATOR),
        ));
    }
    if descriptor.contains(std::path::is_separator) {
        return Err(SmartSaveError::invalid(
            "descriptor",
            format!("'{}' contains a path separator", descriptor),
        ));
    }
    Ok(())
}

fn validate_version(version: u32) -> Result<()> {
    if version == 0 {
        return Err(SmartSaveError::invalid("version", "must be at least 1"));
    }
    Ok(())
}

fn validate_extension(extension: &str) -> Result<()> {
    if extension.is_empty() {
        return Err(SmartSaveError::invalid("extension", "must not be empty"));
    }
    if extension.starts_with('.') {
        return Err(SmartSaveError::invalid(
            "extension",
            format!("'{}' must not start with '.'", extension),
        ));
    }
    if extension.contains(std::path::is_separator) {
        return Err(SmartSaveError::invalid(
            "extension",
            format!("'{}' contains a path separator", extension),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::OpenScene;
    use crate::storage::MemoryFileStore;
    use std::io;

    fn ship(dir: &str) -> SceneFile {
        SceneFile::new(dir, "ship", 1, "ma").unwrap()
    }

    #[test]
    fn test_defaults() {
        let scene = SceneFile::default();
        assert_eq!(scene.descriptor(), "main");
        assert_eq!(scene.version(), 1);
        assert_eq!(scene.extension(), "ma");
        assert_eq!(scene.directory(), Path::new(""));
        assert_eq!(scene.compose_name(), "main_001.ma");
    }

    #[test]
    fn test_compose_path() {
        let mut scene = SceneFile::new("/proj/scenes", "foo", 7, "ma").unwrap();
        assert_eq!(scene.compose_path(), PathBuf::from("/proj/scenes/foo_007.ma"));

        scene.set_version(1532).unwrap();
        assert_eq!(scene.compose_name(), "foo_1532.ma");
    }

    #[test]
    fn test_field_validation() {
        assert!(SceneFile::new("/p", "", 1, "ma").is_err());
        assert!(SceneFile::new("/p", "my_ship", 1, "ma").is_err());
        assert!(SceneFile::new("/p", "ship", 0, "ma").is_err());
        assert!(SceneFile::new("/p", "ship", 1, ".ma").is_err());
        assert!(SceneFile::new("/p", "ship", 1, "").is_err());

        let mut scene = ship("/p");
        let err = scene.set_descriptor("a_b").unwrap_err();
        assert!(matches!(err, SmartSaveError::InvalidField { field: "descriptor", .. }));
        assert_eq!(scene.descriptor(), "ship");
        assert!(scene.set_version(0).is_err());
        assert_eq!(scene.version(), 1);
    }

    #[test]
    fn test_from_path_round_trip() {
        let original = SceneFile::new("/proj/scenes", "ship", 42, "mb").unwrap();
        let parsed = SceneFile::from_path(original.compose_path()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_from_path_rejects_unversioned_names() {
        for path in [
            "/proj/untitled.ma",
            "/proj/ship_abc.ma",
            "/proj/ship_001",
            "/proj/ship_002_final.ma",
            "/",
        ] {
            let err = SceneFile::from_path(path).unwrap_err();
            assert!(
                matches!(err, SmartSaveError::UnparseableName(_)),
                "{}: got {:?}",
                path,
                err
            );
        }
    }

    #[test]
    fn test_from_path_clamps_zero_version() {
        let scene = SceneFile::from_path("/proj/ship_000.ma").unwrap();
        assert_eq!(scene.version(), 1);
    }

    #[test]
    fn test_from_host() {
        let open = OpenScene::new(Some(PathBuf::from("/proj/scenes/car_005.hip")));
        let scene = SceneFile::from_host(&open);
        assert_eq!(scene.directory(), Path::new("/proj/scenes"));
        assert_eq!(scene.descriptor(), "car");
        assert_eq!(scene.version(), 5);
        assert_eq!(scene.extension(), "hip");

        let unsaved = OpenScene::new(None);
        assert_eq!(SceneFile::from_host(&unsaved), SceneFile::default());

        let untitled = OpenScene::new(Some(PathBuf::from("/proj/untitled.ma")));
        let scene = SceneFile::from_host(&untitled);
        assert_eq!(scene.directory(), Path::new("/proj"));
        assert_eq!(scene.descriptor(), "main");
    }

    #[test]
    fn test_prefill_keeps_fields_when_nothing_open() {
        let mut scene = SceneFile::new("/proj", "env", 9, "mb").unwrap();
        assert!(!scene.prefill_from(&OpenScene::new(None)));
        assert_eq!(scene.compose_name(), "env_009.mb");

        assert!(scene.prefill_from(&OpenScene::new(Some(PathBuf::from("/other/untitled.ma")))));
        assert_eq!(scene.directory(), Path::new("/other"));
        assert_eq!(scene.compose_name(), "env_009.mb");
    }

    #[test]
    fn test_save_existing_directory() {
        let store = MemoryFileStore::new().with_directory("/proj");
        let path = ship("/proj").save(&store).unwrap();
        assert_eq!(path, PathBuf::from("/proj/ship_001.ma"));
        assert!(store.contains("/proj/ship_001.ma"));
        assert_eq!(store.save_attempts(), 1);
        assert_eq!(store.make_directories_calls(), 0);
    }

    #[test]
    fn test_save_creates_missing_directory_once() {
        let store = MemoryFileStore::new();
        let scene = ship("/proj/scenes/shots");

        scene.save(&store).unwrap();
        assert!(store.has_directory("/proj/scenes/shots"));
        assert!(store.contains("/proj/scenes/shots/ship_001.ma"));
        assert_eq!(store.save_attempts(), 2);
        assert_eq!(store.make_directories_calls(), 1);
        assert_eq!(scene.version(), 1);
    }

    #[test]
    fn test_failed_retry_is_surfaced() {
        let store = MemoryFileStore::new();
        store.inert_make_directories();

        let err = ship("/proj").save(&store).unwrap_err();
        assert!(matches!(err, SmartSaveError::DirectoryMissing(_)));
        assert_eq!(store.save_attempts(), 2);
        assert_eq!(store.make_directories_calls(), 1);
    }

    #[test]
    fn test_other_failures_are_not_retried() {
        let store = MemoryFileStore::new().with_directory("/proj");
        store.fail_saves_with(io::ErrorKind::PermissionDenied);

        let err = ship("/proj").save(&store).unwrap_err();
        assert!(matches!(err, SmartSaveError::SaveFailed { .. }));
        assert_eq!(store.save_attempts(), 1);
        assert_eq!(store.make_directories_calls(), 0);
    }

    #[test]
    fn test_save_without_directory() {
        let store = MemoryFileStore::new();
        let err = SceneFile::default().save(&store).unwrap_err();
        assert!(matches!(err, SmartSaveError::NoSaveTarget));
        assert_eq!(store.save_attempts(), 0);
    }

    #[test]
    fn test_increment_save_from_highest() {
        let store = MemoryFileStore::new()
            .with_file("/proj/ship_001.ma")
            .with_file("/proj/ship_002.ma")
            .with_file("/proj/ship_010.ma")
            .with_file("/proj/other_099.ma");
        let mut scene = ship("/proj");

        let outcome = scene.increment_save(&store, MatchPolicy::Exact).unwrap();
        assert_eq!(
            outcome,
            IncrementOutcome::Saved {
                path: PathBuf::from("/proj/ship_011.ma"),
                version: 11
            }
        );
        assert_eq!(scene.version(), 11);
        assert!(store.contains("/proj/ship_011.ma"));

        // Not idempotent: the file just written is found next time.
        scene.increment_save(&store, MatchPolicy::Exact).unwrap();
        assert_eq!(scene.version(), 12);
        assert!(store.contains("/proj/ship_012.ma"));
    }

    #[test]
    fn test_increment_save_without_prior_version_is_noop() {
        let store = MemoryFileStore::new()
            .with_directory("/proj")
            .with_file("/proj/other_004.ma");
        let mut scene = SceneFile::new("/proj", "ship", 3, "ma").unwrap();

        let outcome = scene.increment_save(&store, MatchPolicy::Exact).unwrap();
        assert_eq!(outcome, IncrementOutcome::NoPriorVersion);
        assert!(outcome.saved_path().is_none());
        assert_eq!(scene.version(), 3);
        assert_eq!(store.save_attempts(), 0);
    }

    #[test]
    fn test_increment_save_all_zero_is_noop() {
        let store = MemoryFileStore::new().with_file("/proj/ship_000.ma");
        let mut scene = ship("/proj");

        let outcome = scene.increment_save(&store, MatchPolicy::Exact).unwrap();
        assert_eq!(outcome, IncrementOutcome::NoPriorVersion);
        assert_eq!(scene.version(), 1);
        assert_eq!(store.save_attempts(), 0);
    }

    #[test]
    fn test_increment_save_failure_keeps_version() {
        let store = MemoryFileStore::new().with_file("/proj/ship_004.ma");
        store.fail_saves_with(io::ErrorKind::PermissionDenied);
        let mut scene = ship("/proj");

        assert!(scene.increment_save(&store, MatchPolicy::Exact).is_err());
        assert_eq!(scene.version(), 1);
    }

    #[test]
    fn test_increment_save_missing_directory_fails_listing() {
        let store = MemoryFileStore::new();
        let mut scene = ship("/proj");
        let err = scene.increment_save(&store, MatchPolicy::Exact).unwrap_err();
        assert!(matches!(err, SmartSaveError::ListFailed { .. }));
    }

    #[test]
    fn test_increment_save_past_max_version_fails() {
        let store = MemoryFileStore::new().with_file("/proj/ship_4294967295.ma");
        let mut scene = ship("/proj");

        assert_eq!(scene.latest_version(&store, MatchPolicy::Exact).unwrap(), Some(u32::MAX));
        let err = scene.increment_save(&store, MatchPolicy::Exact).unwrap_err();
        assert!(matches!(err, SmartSaveError::VersionOverflow(u32::MAX)));
        assert_eq!(scene.version(), 1);
        assert_eq!(store.save_attempts(), 0);
    }

    #[test]
    fn test_from_path_agrees_with_exact_scan() {
        let name = "ship_002_final.ma";
        assert!(SceneFile::from_path(Path::new("/proj").join(name)).is_err());
        assert_eq!(discovery::match_entry(name, "ship", "ma", MatchPolicy::Exact), None);
    }

    #[test]
    fn test_deserialize_validates_fields() {
        let scene: SceneFile = serde_json::from_str(
            r#"{"directory": "/proj", "descriptor": "ship", "version": 4, "extension": "ma"}"#,
        )
        .unwrap();
        assert_eq!(scene.compose_path(), PathBuf::from("/proj/ship_004.ma"));

        let json = serde_json::to_string(&scene).unwrap();
        assert_eq!(serde_json::from_str::<SceneFile>(&json).unwrap(), scene);

        let bad = r#"{"directory": "/proj", "descriptor": "my_ship", "version": 4, "extension": "ma"}"#;
        assert!(serde_json::from_str::<SceneFile>(bad).is_err());
        let zero = r#"{"directory": "/proj", "descriptor": "ship", "version": 0, "extension": "ma"}"#;
        assert!(serde_json::from_str::<SceneFile>(zero).is_err());
    }

    #[test]
    fn test_latest_version() {
        let store = MemoryFileStore::new()
            .with_file("/proj/car_002.ma")
            .with_file("/proj/carpet_004.ma");
        let scene = SceneFile::new("/proj", "car", 1, "ma").unwrap();

        assert_eq!(scene.latest_version(&store, MatchPolicy::Exact).unwrap(), Some(2));
        assert_eq!(scene.latest_version(&store, MatchPolicy::Prefix).unwrap(), Some(4));

        let empty = MemoryFileStore::new().with_directory("/proj");
        assert_eq!(scene.latest_version(&empty, MatchPolicy::Exact).unwrap(), None);
    }
}
