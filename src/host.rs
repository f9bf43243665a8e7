//! Host application queries.

use std::path::{Path, PathBuf};

/// What the host application knows about its open scene.
pub trait HostSceneQuery {
    /// Path of the open scene, `None` if it has never been saved.
    fn current_scene(&self) -> Option<PathBuf>;
}

/// A host whose open scene is known up front.
#[derive(Debug, Clone, Default)]
pub struct OpenScene {
    path: Option<PathBuf>,
}

impl OpenScene {
    pub fn new(path: Option<PathBuf>) -> Self {
        // An empty path means an unsaved scene.
        let path = path.filter(|p| !p.as_os_str().is_empty());
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl HostSceneQuery for OpenScene {
    fn current_scene(&self) -> Option<PathBuf> {
        self.path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_is_unsaved() {
        assert!(OpenScene::new(Some(PathBuf::new())).current_scene().is_none());
        assert!(OpenScene::default().current_scene().is_none());
        assert_eq!(
            OpenScene::new(Some(PathBuf::from("/proj/ship_001.ma"))).path(),
            Some(Path::new("/proj/ship_001.ma"))
        );
    }
}
