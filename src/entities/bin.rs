//! Storage bin entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{optional_field, require_non_empty, Entity, FieldError};
use crate::core::identity::{EntityId, EntityPrefix};

/// What a bin holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BinType {
    /// A complete set, usually with building instructions
    #[default]
    Set,
    /// Loose parts
    Loose,
}

impl std::fmt::Display for BinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinType::Set => write!(f, "Set"),
            BinType::Loose => write!(f, "Loose"),
        }
    }
}

impl std::str::FromStr for BinType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "set" => Ok(BinType::Set),
            "loose" => Ok(BinType::Loose),
            _ => Err(format!("Unknown bin type: {} (expected Set or Loose)", s)),
        }
    }
}

/// A physical storage bin, labelled with a QR code of its id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bin {
    /// Unique identifier, also the QR payload
    pub id: EntityId,

    #[serde(rename = "type")]
    pub bin_type: BinType,

    /// What is in the bin (never empty)
    pub description: String,

    /// Building instructions, only kept for `Set` bins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction_link: Option<String>,

    pub created: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated: DateTime<Utc>,
}

impl Entity for Bin {
    const PREFIX: EntityPrefix = EntityPrefix::Bin;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.description
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

impl Bin {
    /// Create a new bin with a fresh id
    pub fn new(
        bin_type: BinType,
        description: &str,
        instruction_link: Option<&str>,
    ) -> Result<Self, FieldError> {
        let description = require_non_empty("description", description)?;
        let now = Utc::now();
        Ok(Self {
            id: EntityId::new(EntityPrefix::Bin),
            bin_type,
            description,
            instruction_link: link_for(bin_type, instruction_link),
            created: now,
            updated: now,
        })
    }

    /// Edit the bin in place. The id never changes so printed labels stay valid.
    ///
    /// `instruction_link` is `None` to keep the link, `Some(None)` to clear it.
    pub fn update(
        &mut self,
        bin_type: Option<BinType>,
        description: Option<&str>,
        instruction_link: Option<Option<&str>>,
    ) -> Result<(), FieldError> {
        let description = description
            .map(|d| require_non_empty("description", d))
            .transpose()?;

        if let Some(bin_type) = bin_type {
            self.bin_type = bin_type;
        }
        if let Some(description) = description {
            self.description = description;
        }
        let link = instruction_link.unwrap_or(self.instruction_link.as_deref());
        self.instruction_link = link_for(self.bin_type, link);
        self.updated = Utc::now().max(self.created);
        Ok(())
    }
}

fn link_for(bin_type: BinType, link: Option<&str>) -> Option<String> {
    match bin_type {
        BinType::Set => optional_field(link),
        BinType::Loose => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_set_keeps_link() {
        let bin = Bin::new(BinType::Set, "Castle 10305", Some("https://example.com/i.pdf")).unwrap();
        assert_eq!(bin.instruction_link.as_deref(), Some("https://example.com/i.pdf"));
        assert!(bin.id.to_string().starts_with("BIN-"));
    }

    #[test]
    fn test_new_loose_drops_link() {
        let bin = Bin::new(BinType::Loose, "2x4 bricks", Some("https://x")).unwrap();
        assert!(bin.instruction_link.is_none());
    }

    #[test]
    fn test_new_requires_description() {
        let err = Bin::new(BinType::Set, "  ", None).unwrap_err();
        assert_eq!(err, FieldError::EmptyRequiredField("description".to_string()));
    }

    #[test]
    fn test_update_keeps_id() {
        let mut bin = Bin::new(BinType::Set, "Castle", Some("https://x")).unwrap();
        let id = bin.id.clone();
        bin.update(Some(BinType::Loose), Some("Mixed"), None).unwrap();
        assert_eq!(bin.id, id);
        assert_eq!(bin.bin_type, BinType::Loose);
        assert_eq!(bin.description, "Mixed");
        assert!(bin.instruction_link.is_none());
    }

    #[test]
    fn test_update_clears_link() {
        let mut bin = Bin::new(BinType::Set, "Castle", Some("https://x")).unwrap();
        bin.update(None, None, None).unwrap();
        assert_eq!(bin.instruction_link.as_deref(), Some("https://x"));

        bin.update(None, None, Some(None)).unwrap();
        assert!(bin.instruction_link.is_none());
        assert_eq!(bin.bin_type, BinType::Set);

        bin.update(None, None, Some(Some("https://y"))).unwrap();
        assert_eq!(bin.instruction_link.as_deref(), Some("https://y"));
    }

    #[test]
    fn test_bin_type_parse() {
        assert_eq!("set".parse::<BinType>().unwrap(), BinType::Set);
        assert_eq!("LOOSE".parse::<BinType>().unwrap(), BinType::Loose);
        assert!("box".parse::<BinType>().is_err());
    }

    #[test]
    fn test_yaml_uses_type_key() {
        let bin = Bin::new(BinType::Loose, "Plates", None).unwrap();
        let yaml = serde_yml::to_string(&bin).unwrap();
        assert!(yaml.contains("type: Loose"));
    }
}
