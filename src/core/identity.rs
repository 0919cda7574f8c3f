//! Record identifiers: `WISH-<ULID>` and `BIN-<ULID>`
//!
//! A bin's id is also the payload of its QR label, so the text form is
//! stable and round-trips through [`EntityId::parse`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use ulid::Ulid;

/// Which kind of record an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityPrefix {
    Wish,
    Bin,
}

impl EntityPrefix {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Wish => "WISH",
            EntityPrefix::Bin => "BIN",
        }
    }

    pub fn all() -> &'static [EntityPrefix] {
        &[EntityPrefix::Wish, EntityPrefix::Bin]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|prefix| prefix.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| IdParseError::InvalidPrefix(s.to_string()))
    }
}

/// A record id. Serialized as its text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Fresh id; ULIDs sort by creation time
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    pub fn parse(s: &str) -> Result<Self, IdParseError> {
        s.parse()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((prefix, ulid)) = s.split_once('-') else {
            return Err(IdParseError::MissingDelimiter(s.to_string()));
        };
        Ok(Self {
            prefix: prefix.parse()?,
            ulid: Ulid::from_string(ulid)
                .map_err(|e| IdParseError::InvalidUlid(ulid.to_string(), e.to_string()))?,
        })
    }
}

impl TryFrom<String> for EntityId {
    type Error = IdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.to_string()
    }
}

#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("unknown id prefix '{0}' (expected WISH or BIN)")]
    InvalidPrefix(String),

    #[error("'{0}' is not an id: expected PREFIX-ULID")]
    MissingDelimiter(String),

    #[error("bad ULID '{0}': {1}")]
    InvalidUlid(String, String),
}
