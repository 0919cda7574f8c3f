//! Core module - fundamental types and utilities

pub mod config;
pub mod csv_import;
pub mod entity;
pub mod identity;
pub mod loader;
pub mod project;
pub mod qr;
pub mod shortid;
pub mod sync;

pub use config::Config;
pub use csv_import::ImportError;
pub use entity::{Entity, FieldError};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use project::{Project, ProjectError};
pub use shortid::ShortIdIndex;
pub use sync::{SyncContext, SyncError, SyncState};
