//! Wish list item entity type

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{optional_field, require_non_empty, Entity, FieldError};
use crate::core::identity::{EntityId, EntityPrefix};

/// An item on the wish list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishItem {
    /// Unique identifier
    pub id: EntityId,

    /// Item name (never empty)
    pub name: String,

    /// Where to find or buy the item
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Local or remote image references
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_paths: Vec<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Last modification timestamp
    pub updated: DateTime<Utc>,
}

impl Entity for WishItem {
    const PREFIX: EntityPrefix = EntityPrefix::Wish;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }
}

/// Field changes applied by [`WishItem::update`]
#[derive(Debug, Default, Clone)]
pub struct WishItemChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the url
    pub url: Option<Option<String>>,
    pub image_paths: Option<Vec<String>>,
}

impl WishItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.url.is_none() && self.image_paths.is_none()
    }
}

impl WishItem {
    /// Create a new wish list item, validating that the name is present
    pub fn new(
        name: &str,
        url: Option<&str>,
        image_paths: Vec<String>,
    ) -> Result<Self, FieldError> {
        let name = require_non_empty("name", name)?;
        let now = Utc::now();
        Ok(Self {
            id: EntityId::new(EntityPrefix::Wish),
            name,
            url: optional_field(url),
            image_paths,
            created: now,
            updated: now,
        })
    }

    /// Apply changes and refresh the `updated` timestamp.
    ///
    /// Nothing is modified if the new name is blank.
    pub fn update(&mut self, changes: WishItemChanges) -> Result<(), FieldError> {
        let name = changes
            .name
            .as_deref()
            .map(|n| require_non_empty("name", n))
            .transpose()?;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(url) = changes.url {
            self.url = optional_field(url.as_deref());
        }
        if let Some(paths) = changes.image_paths {
            self.image_paths = paths;
        }
        self.updated = Utc::now().max(self.created);
        Ok(())
    }

    /// Whether the item has been modified since creation
    pub fn was_updated(&self) -> bool {
        self.updated > self.created
    }
}

/// Split `;`-separated image paths, trimming and dropping empty segments
pub fn split_image_paths(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_and_normalizes() {
        let item = WishItem::new("  Desk lamp ", Some("  "), vec![]).unwrap();
        assert_eq!(item.name, "Desk lamp");
        assert!(item.url.is_none());
        assert_eq!(item.created, item.updated);
        assert!(item.id.to_string().starts_with("WISH-"));
    }

    #[test]
    fn test_new_rejects_blank_name() {
        let err = WishItem::new(" ", None, vec![]).unwrap_err();
        assert_eq!(err, FieldError::EmptyRequiredField("name".to_string()));
    }

    #[test]
    fn test_update_refreshes_timestamp() {
        let mut item = WishItem::new("Lamp", None, vec![]).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        item.update(WishItemChanges {
            url: Some(Some("https://example.com/lamp".to_string())),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(item.url.as_deref(), Some("https://example.com/lamp"));
        assert!(item.was_updated());
    }

    #[test]
    fn test_update_blank_name_leaves_item_untouched() {
        let mut item = WishItem::new("Lamp", Some("https://x"), vec![]).unwrap();
        let before = item.updated;
        let err = item
            .update(WishItemChanges {
                name: Some("".to_string()),
                url: Some(None),
                ..Default::default()
            })
            .unwrap_err();
        assert_eq!(err, FieldError::EmptyRequiredField("name".to_string()));
        assert_eq!(item.name, "Lamp");
        assert_eq!(item.url.as_deref(), Some("https://x"));
        assert_eq!(item.updated, before);
    }

    #[test]
    fn test_split_image_paths() {
        assert_eq!(
            split_image_paths(" a.png ; ;b.jpg;"),
            vec!["a.png".to_string(), "b.jpg".to_string()]
        );
        assert!(split_image_paths("").is_empty());
    }

    #[test]
    fn test_yaml_omits_empty_optionals() {
        let item = WishItem::new("Lamp", None, vec![]).unwrap();
        let yaml = serde_yml::to_string(&item).unwrap();
        assert!(!yaml.contains("url"));
        assert!(!yaml.contains("image_paths"));
        let parsed: WishItem = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(parsed.id, item.id);
    }
}
