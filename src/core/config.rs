//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::Project;

/// Stash configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Editor command for `edit` subcommands
    pub editor: Option<String>,

    /// Default output format
    pub default_format: Option<String>,

    /// Remote sync settings
    pub sync: SyncConfig,
}

/// Remote sync settings
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub enabled: Option<bool>,

    /// Directory the project is mirrored into
    pub remote: Option<PathBuf>,
}

impl SyncConfig {
    /// The remote directory, if sync is switched on and configured
    pub fn active_remote(&self) -> Option<&Path> {
        if self.enabled.unwrap_or(false) {
            self.remote.as_deref()
        } else {
            None
        }
    }
}

/// Errors writing configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("invalid config at {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(project: Option<&Project>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/stash/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 2. Project config (.stash/config.yaml)
        if let Some(project) = project {
            if let Some(project_config) = Self::read_file(&Self::project_config_path(project)) {
                config.merge(project_config);
            }
        }

        // 3. Environment variables
        if let Ok(editor) = std::env::var("STASH_EDITOR") {
            config.editor = Some(editor);
        }
        if let Ok(remote) = std::env::var("STASH_SYNC_REMOTE") {
            config.sync.remote = Some(PathBuf::from(remote));
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Option<Config>>(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable config");
                None
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "stash")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Get the path to a project's config file
    pub fn project_config_path(project: &Project) -> PathBuf {
        project.stash_dir().join("config.yaml")
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.editor.is_some() {
            self.editor = other.editor;
        }
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.sync.enabled.is_some() {
            self.sync.enabled = other.sync.enabled;
        }
        if other.sync.remote.is_some() {
            self.sync.remote = other.sync.remote;
        }
    }

    /// Get the editor command
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .or_else(|| std::env::var("VISUAL").ok())
            .unwrap_or_else(|| "vi".to_string())
    }

    /// Run the editor on a file, properly handling commands with arguments
    /// (e.g., "emacsclient -nw" or "code --wait")
    pub fn run_editor(&self, file_path: &Path) -> std::io::Result<std::process::ExitStatus> {
        let editor = self.editor();
        let mut parts = editor.split_whitespace();

        match parts.next() {
            Some(cmd) => std::process::Command::new(cmd)
                .args(parts)
                .arg(file_path)
                .status(),
            None => std::process::Command::new("vi").arg(file_path).status(),
        }
    }

    /// Write the `sync` section of a project's config, keeping other keys
    pub fn write_project_sync(
        project: &Project,
        enabled: bool,
        remote: Option<&Path>,
    ) -> Result<(), ConfigError> {
        use serde_yml::{Mapping, Value};

        let path = Self::project_config_path(project);
        let io_err = |e: std::io::Error| ConfigError::Io {
            path: path.clone(),
            message: e.to_string(),
        };

        let mut root = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(io_err)?;
            serde_yml::from_str::<Value>(&content).map_err(|e| ConfigError::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?
        } else {
            Value::Null
        };
        if !root.is_mapping() {
            root = Value::Mapping(Mapping::new());
        }

        if let Value::Mapping(map) = &mut root {
            let key = Value::String("sync".to_string());
            let mut sync = match map.remove(&key) {
                Some(Value::Mapping(existing)) => existing,
                _ => Mapping::new(),
            };
            sync.insert(Value::String("enabled".to_string()), Value::Bool(enabled));
            if let Some(remote) = remote {
                sync.insert(
                    Value::String("remote".to_string()),
                    Value::String(remote.to_string_lossy().into_owned()),
                );
            }
            map.insert(key, Value::Mapping(sync));
        }

        let yaml = serde_yml::to_string(&root).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, yaml).map_err(io_err)
    }
}
