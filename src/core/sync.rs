//! Optional sync of the project to a remote location
//!
//! Sync progress is an explicit state machine held in a [`SyncContext`]
//! that callers pass around and persist in `.stash/sync.json`:
//!
//! ```text
//! Idle ──begin──▶ Syncing ──succeed──▶ Success
//!   ▲                 │                   │
//!   │                 └──fail──▶ Error    │
//!   └────reset────────────────────┴───────┘
//! ```
//!
//! `begin` is also allowed from `Success` and `Error`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::EntityPrefix;
use crate::core::project::{Project, ENTITY_SUFFIX};

const STATE_FILE: &str = "sync.json";

/// Where a sync currently stands
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SyncState {
    #[default]
    Idle,
    Syncing {
        started: DateTime<Utc>,
    },
    Success {
        at: DateTime<Utc>,
    },
    Error {
        message: String,
        at: DateTime<Utc>,
    },
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Idle => write!(f, "Ready"),
            SyncState::Syncing { .. } => write!(f, "Syncing..."),
            SyncState::Success { .. } => write!(f, "Synced"),
            SyncState::Error { message, .. } => write!(f, "Error: {}", message),
        }
    }
}

/// Errors from sync transitions and remotes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("a sync is already in progress (started {0})")]
    AlreadySyncing(DateTime<Utc>),

    #[error("no sync in progress (current state: {0})")]
    NotSyncing(String),

    #[error("sync is not configured. Run 'stash sync enable --remote <DIR>' first.")]
    NotConfigured,

    #[error("remote {remote}: {message}")]
    Remote { remote: String, message: String },

    #[error("could not save sync state: {0}")]
    State(String),
}

/// Sync state plus the time of the last successful sync
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncContext {
    state: SyncState,
    last_sync: Option<DateTime<Utc>>,
}

impl SyncContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    /// Enter `Syncing`. Rejected while a sync is already running.
    pub fn begin(&mut self) -> Result<(), SyncError> {
        if let SyncState::Syncing { started } = self.state {
            return Err(SyncError::AlreadySyncing(started));
        }
        self.transition(SyncState::Syncing { started: Utc::now() });
        Ok(())
    }

    /// Finish the running sync successfully and record `last_sync`
    pub fn succeed(&mut self) -> Result<(), SyncError> {
        self.require_syncing()?;
        let now = Utc::now();
        self.transition(SyncState::Success { at: now });
        self.last_sync = Some(now);
        Ok(())
    }

    /// Finish the running sync with an error
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SyncError> {
        self.require_syncing()?;
        self.transition(SyncState::Error {
            message: message.into(),
            at: Utc::now(),
        });
        Ok(())
    }

    /// Return to `Idle`, keeping `last_sync`
    pub fn reset(&mut self) -> Result<(), SyncError> {
        if let SyncState::Syncing { started } = self.state {
            return Err(SyncError::AlreadySyncing(started));
        }
        self.transition(SyncState::Idle);
        Ok(())
    }

    fn require_syncing(&self) -> Result<(), SyncError> {
        match self.state {
            SyncState::Syncing { .. } => Ok(()),
            ref other => Err(SyncError::NotSyncing(other.to_string())),
        }
    }

    fn transition(&mut self, next: SyncState) {
        tracing::debug!(from = %self.state, to = %next, "sync state change");
        self.state = next;
    }

    /// Load the persisted context.
    ///
    /// A persisted `Syncing` state belongs to a run that never finished and
    /// is turned into an error.
    pub fn load(project: &Project) -> Self {
        let path = project.stash_dir().join(STATE_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };

        let mut ctx: SyncContext = match serde_json::from_str(&content) {
            Ok(ctx) => ctx,
            Err(e) => {
                tracing::warn!(error = %e, "sync state unreadable, starting idle");
                return Self::new();
            }
        };

        if let SyncState::Syncing { started } = ctx.state {
            ctx.state = SyncState::Error {
                message: format!("sync started {} was interrupted", started.format("%Y-%m-%d %H:%M")),
                at: Utc::now(),
            };
        }
        ctx
    }

    pub fn save(&self, project: &Project) -> Result<(), SyncError> {
        let path = project.stash_dir().join(STATE_FILE);
        let content =
            serde_json::to_string_pretty(self).map_err(|e| SyncError::State(e.to_string()))?;
        fs::write(path, content).map_err(|e| SyncError::State(e.to_string()))
    }
}

/// Counts from one push
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    pub copied: usize,
    pub unchanged: usize,
    pub removed: usize,
}

/// Somewhere the project's entity files can be pushed to
pub trait Remote {
    /// Human-readable location for messages
    fn describe(&self) -> String;

    /// Make the remote match the project's entity files
    fn push(&self, project: &Project) -> Result<SyncReport, SyncError>;
}

/// Mirrors entity files into a directory, such as a cloud-synced folder
#[derive(Debug, Clone)]
pub struct DirectoryRemote {
    root: PathBuf,
}

impl DirectoryRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn error(&self, message: impl fmt::Display) -> SyncError {
        SyncError::Remote {
            remote: self.describe(),
            message: message.to_string(),
        }
    }

    fn push_prefix(
        &self,
        project: &Project,
        prefix: EntityPrefix,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let subdir = Project::entity_directory(prefix);
        let target_dir = self.root.join(subdir);
        fs::create_dir_all(&target_dir).map_err(|e| self.error(e))?;

        let mut local_names = HashSet::new();
        for source in project.iter_entity_files(prefix) {
            let Some(name) = source.file_name().map(|n| n.to_os_string()) else {
                continue;
            };
            let target = target_dir.join(&name);
            local_names.insert(name);

            let content = fs::read(&source).map_err(|e| self.error(e))?;
            if file_digest(&target).as_ref() == Some(&digest(&content)) {
                report.unchanged += 1;
                continue;
            }
            fs::write(&target, &content).map_err(|e| self.error(e))?;
            report.copied += 1;
        }

        for entry in fs::read_dir(&target_dir).map_err(|e| self.error(e))? {
            let path = entry.map_err(|e| self.error(e))?.path();
            let is_entity = path.to_string_lossy().ends_with(ENTITY_SUFFIX);
            let known = path
                .file_name()
                .is_some_and(|name| local_names.contains(name));
            if path.is_file() && is_entity && !known {
                fs::remove_file(&path).map_err(|e| self.error(e))?;
                report.removed += 1;
            }
        }

        Ok(())
    }
}

impl Remote for DirectoryRemote {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn push(&self, project: &Project) -> Result<SyncReport, SyncError> {
        if same_location(&self.root, project.root()) {
            return Err(self.error("remote must not be the project itself"));
        }

        let mut report = SyncReport::default();
        for prefix in EntityPrefix::all() {
            self.push_prefix(project, *prefix, &mut report)?;
        }
        Ok(report)
    }
}

fn same_location(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn digest(content: &[u8]) -> Vec<u8> {
    Sha256::digest(content).to_vec()
}

fn file_digest(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).ok().map(|content| digest(&content))
}

/// Run one sync: `begin`, push, then `succeed` or `fail`.
///
/// The context is saved before the push and again after it.
pub fn sync_now(
    ctx: &mut SyncContext,
    remote: &dyn Remote,
    project: &Project,
) -> Result<SyncReport, SyncError> {
    ctx.begin()?;
    ctx.save(project)?;
    tracing::info!(remote = %remote.describe(), "sync started");

    let result = remote.push(project);
    match &result {
        Ok(report) => {
            ctx.succeed()?;
            tracing::info!(
                copied = report.copied,
                unchanged = report.unchanged,
                removed = report.removed,
                "sync finished"
            );
        }
        Err(e) => {
            ctx.fail(e.to_string())?;
            tracing::warn!(error = %e, "sync failed");
        }
    }
    ctx.save(project)?;
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loader;
    use crate::entities::{Bin, BinType, WishItem};
    use tempfile::tempdir;

    #[test]
    fn test_happy_path_transitions() {
        let mut ctx = SyncContext::new();
        assert_eq!(ctx.state(), &SyncState::Idle);

        ctx.begin().unwrap();
        assert!(matches!(ctx.state(), SyncState::Syncing { .. }));
        ctx.succeed().unwrap();
        assert!(matches!(ctx.state(), SyncState::Success { .. }));
        assert!(ctx.last_sync().is_some());

        ctx.begin().unwrap();
        ctx.fail("offline").unwrap();
        assert_eq!(ctx.state().to_string(), "Error: offline");
        assert!(ctx.last_sync().is_some());
    }

    #[test]
    fn test_invalid_transitions_are_rejected() {
        let mut ctx = SyncContext::new();
        assert!(matches!(ctx.succeed(), Err(SyncError::NotSyncing(_))));
        assert!(matches!(ctx.fail("x"), Err(SyncError::NotSyncing(_))));

        ctx.begin().unwrap();
        assert!(matches!(ctx.begin(), Err(SyncError::AlreadySyncing(_))));
        assert!(matches!(ctx.reset(), Err(SyncError::AlreadySyncing(_))));
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(SyncState::Idle.to_string(), "Ready");
        assert_eq!(
            SyncState::Syncing { started: Utc::now() }.to_string(),
            "Syncing..."
        );
        assert_eq!(SyncState::Success { at: Utc::now() }.to_string(), "Synced");
    }

    #[test]
    fn test_interrupted_sync_loads_as_error() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let mut ctx = SyncContext::new();
        ctx.begin().unwrap();
        ctx.save(&project).unwrap();

        let loaded = SyncContext::load(&project);
        assert!(matches!(loaded.state(), SyncState::Error { .. }));
    }

    #[test]
    fn test_directory_remote_mirrors_files() {
        let tmp = tempdir().unwrap();
        let project_dir = tmp.path().join("project");
        fs::create_dir_all(&project_dir).unwrap();
        let project = Project::init(&project_dir).unwrap();
        let remote_dir = tmp.path().join("remote");
        let remote = DirectoryRemote::new(&remote_dir);

        let item = WishItem::new("Lamp", None, vec![]).unwrap();
        let bin = Bin::new(BinType::Set, "Castle", None).unwrap();
        loader::save(&project, &item).unwrap();
        let bin_path = loader::save(&project, &bin).unwrap();

        let mut ctx = SyncContext::new();
        let report = sync_now(&mut ctx, &remote, &project).unwrap();
        assert_eq!(report.copied, 2);
        assert!(remote_dir.join("wishlist").join(format!("{}.stash.yaml", item.id)).exists());
        assert!(matches!(ctx.state(), SyncState::Success { .. }));

        let report = sync_now(&mut ctx, &remote, &project).unwrap();
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.copied, 0);

        loader::delete(&bin_path).unwrap();
        let report = sync_now(&mut ctx, &remote, &project).unwrap();
        assert_eq!(report.removed, 1);
        assert!(!remote_dir.join("bins").join(format!("{}.stash.yaml", bin.id)).exists());

        assert_eq!(SyncContext::load(&project), ctx);
    }

    #[test]
    fn test_failed_push_records_error() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let remote = DirectoryRemote::new(project.root());

        let mut ctx = SyncContext::new();
        let err = sync_now(&mut ctx, &remote, &project).unwrap_err();
        assert!(matches!(err, SyncError::Remote { .. }));
        assert!(matches!(ctx.state(), SyncState::Error { .. }));
        assert!(ctx.last_sync().is_none());
    }
}
