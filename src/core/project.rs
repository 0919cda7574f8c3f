//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Marker directory holding project configuration and state
pub const STASH_DIR: &str = ".stash";

/// File suffix for entity files
pub const ENTITY_SUFFIX: &str = ".stash.yaml";

/// Represents a stash project
#[derive(Debug, Clone)]
pub struct Project {
    /// Root directory of the project (parent of .stash/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current = std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(STASH_DIR).is_dir() {
                tracing::debug!(root = %current.display(), "found project");
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Open the project at `path`, or discover one from the current directory
    pub fn open(path: Option<&Path>) -> Result<Self, ProjectError> {
        match path {
            Some(path) => Self::discover_from(path),
            None => Self::discover(),
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(STASH_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_structure(root)
    }

    /// Force initialization even if .stash/ exists. Existing entity files are kept.
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_structure(root)
    }

    fn create_structure(root: PathBuf) -> Result<Self, ProjectError> {
        let stash_dir = root.join(STASH_DIR);
        std::fs::create_dir_all(&stash_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(stash_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(Self::entity_directory(*prefix)))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        tracing::info!(root = %root.display(), "initialized project");
        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# Stash Project Configuration

# Editor to use for `stash wish edit` / `stash bin edit` (default: $EDITOR)
# editor: ""

# Default output format (auto, yaml, tsv, json, csv, md, id)
# default_format: auto

# Optional sync to a remote directory (e.g. a cloud-synced folder)
# sync:
#   enabled: false
#   remote: ""
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .stash configuration directory
    pub fn stash_dir(&self) -> PathBuf {
        self.root.join(STASH_DIR)
    }

    /// Get the directory for a given entity prefix, relative to the root
    pub fn entity_directory(prefix: EntityPrefix) -> &'static str {
        match prefix {
            EntityPrefix::Wish => "wishlist",
            EntityPrefix::Bin => "bins",
        }
    }

    /// Absolute directory for a given entity prefix
    pub fn entity_dir(&self, prefix: EntityPrefix) -> PathBuf {
        self.root.join(Self::entity_directory(prefix))
    }

    /// Get the path for an entity file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.entity_dir(id.prefix())
            .join(format!("{}{}", id, ENTITY_SUFFIX))
    }

    /// Iterate all entity files of a given prefix type
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        walkdir::WalkDir::new(self.entity_dir(prefix))
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(ENTITY_SUFFIX))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a stash project (searched from {searched_from:?}). Run 'stash init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("stash project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.stash_dir().join("config.yaml").exists());
        assert!(project.root().join("wishlist").is_dir());
        assert!(project.root().join("bins").is_dir());
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));
    }

    #[test]
    fn test_project_discover_from_subdirectory() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_stash_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_entity_path() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let id = EntityId::new(EntityPrefix::Bin);
        let path = project.entity_path(&id);
        assert!(path.starts_with(project.root().join("bins")));
        assert!(path.to_string_lossy().ends_with(".stash.yaml"));
    }
}
