//! Short ID system for easier entity selection
//!
//! Listing entities assigns aliases like `WISH@1` or `BIN@2` that can be
//! used in place of the full ID until the next listing reassigns them.

use std::collections::HashMap;
use std::fs;

use crate::core::identity::EntityPrefix;
use crate::core::project::Project;

/// Index file location within the .stash directory
const INDEX_FILE: &str = "shortids.json";

/// A mapping of short IDs (PREFIX@N) to full entity IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Maps "PREFIX@N" to full entity ID string
    entries: HashMap<String, String>,
    /// Maps full entity ID to short ID (reverse lookup)
    #[serde(skip)]
    reverse: HashMap<String, String>,
    /// Next available number per prefix
    next: HashMap<String, u32>,
}

impl ShortIdIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.stash_dir().join(INDEX_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };

        match serde_json::from_str::<ShortIdIndex>(&content) {
            Ok(mut index) => {
                index.reverse = index
                    .entries
                    .iter()
                    .map(|(short, full)| (full.clone(), short.clone()))
                    .collect();
                index
            }
            Err(e) => {
                tracing::warn!(error = %e, "short ID index unreadable, starting fresh");
                Self::new()
            }
        }
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.stash_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Forget aliases for one prefix and number the given IDs from 1
    pub fn rebuild(&mut self, prefix: EntityPrefix, entity_ids: impl IntoIterator<Item = String>) {
        let tag = format!("{}@", prefix.as_str());
        self.entries.retain(|short, _| !short.starts_with(&tag));
        self.reverse.retain(|_, short| !short.starts_with(&tag));
        self.next.remove(prefix.as_str());

        for id in entity_ids {
            self.add(prefix, id);
        }
    }

    /// Add an entity ID and return its short ID
    pub fn add(&mut self, prefix: EntityPrefix, entity_id: String) -> String {
        if let Some(short_id) = self.reverse.get(&entity_id) {
            return short_id.clone();
        }

        let next = self.next.entry(prefix.as_str().to_string()).or_insert(1);
        let short_id = format!("{}@{}", prefix.as_str(), next);
        *next += 1;

        self.entries.insert(short_id.clone(), entity_id.clone());
        self.reverse.insert(entity_id, short_id.clone());
        short_id
    }

    /// Resolve a reference to a full entity ID
    ///
    /// Accepts `PREFIX@N` (case-insensitive) and passes anything else
    /// through for partial matching. Unknown short IDs resolve to `None`.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        if !reference.contains('@') {
            return Some(reference.to_string());
        }
        self.entries.get(&reference.to_uppercase()).cloned()
    }

    /// Get the short ID for a full entity ID
    pub fn get_short_id(&self, entity_id: &str) -> Option<String> {
        self.reverse.get(entity_id).cloned()
    }

    /// Number of entries in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_add_and_resolve() {
        let mut index = ShortIdIndex::new();

        assert_eq!(index.add(EntityPrefix::Bin, "BIN-01ABC".to_string()), "BIN@1");
        assert_eq!(index.add(EntityPrefix::Bin, "BIN-02DEF".to_string()), "BIN@2");
        assert_eq!(index.add(EntityPrefix::Wish, "WISH-03GHI".to_string()), "WISH@1");

        assert_eq!(index.resolve("BIN@2"), Some("BIN-02DEF".to_string()));
        assert_eq!(index.resolve("wish@1"), Some("WISH-03GHI".to_string()));
        assert_eq!(index.resolve("BIN@99"), None);
    }

    #[test]
    fn test_short_id_passthrough() {
        let index = ShortIdIndex::new();
        assert_eq!(index.resolve("01ABC"), Some("01ABC".to_string()));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut index = ShortIdIndex::new();
        let first = index.add(EntityPrefix::Wish, "WISH-01".to_string());
        let again = index.add(EntityPrefix::Wish, "WISH-01".to_string());
        assert_eq!(first, again);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_rebuild_only_touches_one_prefix() {
        let mut index = ShortIdIndex::new();
        index.add(EntityPrefix::Bin, "BIN-A".to_string());
        index.add(EntityPrefix::Wish, "WISH-A".to_string());

        index.rebuild(EntityPrefix::Bin, vec!["BIN-B".to_string(), "BIN-C".to_string()]);
        assert_eq!(index.resolve("BIN@1"), Some("BIN-B".to_string()));
        assert_eq!(index.get_short_id("BIN-A"), None);
        assert_eq!(index.resolve("WISH@1"), Some("WISH-A".to_string()));
    }

    #[test]
    fn test_save_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let mut index = ShortIdIndex::new();
        index.add(EntityPrefix::Bin, "BIN-A".to_string());
        index.save(&project).unwrap();

        let loaded = ShortIdIndex::load(&project);
        assert_eq!(loaded.get_short_id("BIN-A"), Some("BIN@1".to_string()));
    }
}
