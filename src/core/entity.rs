//! Entity trait - common interface for all entity types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all stash entities
pub trait Entity: Serialize + DeserializeOwned {
    /// The entity type prefix
    const PREFIX: EntityPrefix;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get the entity's display title (item name, bin description)
    fn title(&self) -> &str;

    /// Get the creation timestamp
    fn created(&self) -> DateTime<Utc>;
}

/// Field-level validation failure raised while constructing a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Missing required column: '{0}'")]
    MissingRequiredColumn(String),

    #[error("Required field '{0}' cannot be empty.")]
    EmptyRequiredField(String),
}

/// Trim a required field, failing if nothing is left
pub fn require_non_empty(field: &str, value: &str) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::EmptyRequiredField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional field, mapping blank input to `None`
pub fn optional_field(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
