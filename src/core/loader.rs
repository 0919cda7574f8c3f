//! Entity loading and saving
//!
//! Entities live one per YAML file under the project's entity directories.
//! These helpers keep the file handling out of the command implementations.

use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::entity::Entity;
use crate::core::project::{Project, ENTITY_SUFFIX};

/// Load all entities of type T from the project.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_all<T: Entity>(project: &Project) -> Result<Vec<T>> {
    let mut entities = Vec::new();

    for path in project.iter_entity_files(T::PREFIX) {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        match serde_yml::from_str::<T>(&content) {
            Ok(entity) => entities.push(entity),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unparsable entity file");
            }
        }
    }

    Ok(entities)
}

/// Find an entity file by full or partial ID.
///
/// Fails if the partial ID matches more than one file.
pub fn find_entity_file(dir: &Path, id: &str) -> Result<Option<PathBuf>> {
    if !dir.exists() || id.is_empty() {
        return Ok(None);
    }

    let needle = id.to_uppercase();
    let mut matches = Vec::new();
    for entry in fs::read_dir(dir).into_diagnostic()? {
        let path = entry.into_diagnostic()?.path();
        let Some(filename) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(stem) = filename.strip_suffix(ENTITY_SUFFIX) {
            if stem == id {
                return Ok(Some(path));
            }
            if stem.to_uppercase().contains(&needle) {
                matches.push(path);
            }
        }
    }

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        n => Err(miette::miette!(
            "'{}' matches {} entities; use a longer ID",
            id,
            n
        )),
    }
}

/// Load a single entity by full or partial ID
pub fn load_entity<T: Entity>(project: &Project, id: &str) -> Result<Option<(PathBuf, T)>> {
    if let Some(path) = find_entity_file(&project.entity_dir(T::PREFIX), id)? {
        let content = fs::read_to_string(&path).into_diagnostic()?;
        let entity: T = serde_yml::from_str(&content).into_diagnostic()?;
        return Ok(Some((path, entity)));
    }
    Ok(None)
}

/// Write an entity to its file, creating the directory if needed
pub fn save<T: Entity>(project: &Project, entity: &T) -> Result<PathBuf> {
    let path = project.entity_path(entity.id());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }

    let yaml = serde_yml::to_string(entity).into_diagnostic()?;
    fs::write(&path, yaml).into_diagnostic()?;
    tracing::debug!(id = %entity.id(), path = %path.display(), "saved entity");
    Ok(path)
}

/// Write every entity or none of them.
///
/// If a write fails, files already written by this call are removed before
/// the error is returned.
pub fn save_all<T: Entity>(project: &Project, entities: &[T]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(entities.len());

    for entity in entities {
        match save(project, entity) {
            Ok(path) => written.push(path),
            Err(e) => {
                tracing::warn!(
                    written = written.len(),
                    error = %e,
                    "save failed, rolling back"
                );
                for path in &written {
                    let _ = fs::remove_file(path);
                }
                return Err(e);
            }
        }
    }

    Ok(written)
}

/// Remove an entity file
pub fn delete(path: &Path) -> Result<()> {
    fs::remove_file(path).into_diagnostic()?;
    tracing::debug!(path = %path.display(), "deleted entity");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Bin, BinType, WishItem};
    use tempfile::tempdir;

    fn project() -> (tempfile::TempDir, Project) {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        (tmp, project)
    }

    #[test]
    fn test_load_all_empty() {
        let (_tmp, project) = project();
        let items: Vec<WishItem> = load_all(&project).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let (_tmp, project) = project();
        let item = WishItem::new("Lamp", Some("http://x"), vec![]).unwrap();
        save(&project, &item).unwrap();

        let items: Vec<WishItem> = load_all(&project).unwrap();
        assert_eq!(items, vec![item.clone()]);

        let (_, loaded) = load_entity::<WishItem>(&project, &item.id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(loaded, item);
    }

    #[test]
    fn test_load_all_skips_bad_files() {
        let (_tmp, project) = project();
        let bin = Bin::new(BinType::Set, "Castle", None).unwrap();
        save(&project, &bin).unwrap();
        fs::write(
            project.entity_dir(Bin::PREFIX).join("BIN-broken.stash.yaml"),
            "not: [valid",
        )
        .unwrap();

        let bins: Vec<Bin> = load_all(&project).unwrap();
        assert_eq!(bins.len(), 1);
    }

    #[test]
    fn test_find_entity_file_partial_and_ambiguous() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("BIN-01AAA.stash.yaml"), "").unwrap();
        fs::write(dir.path().join("BIN-01AAB.stash.yaml"), "").unwrap();

        let found = find_entity_file(dir.path(), "01aaa").unwrap();
        assert_eq!(found, Some(dir.path().join("BIN-01AAA.stash.yaml")));
        assert!(find_entity_file(dir.path(), "01AA").is_err());
        assert_eq!(find_entity_file(dir.path(), "ZZZ").unwrap(), None);
    }

    #[test]
    fn test_find_entity_file_nonexistent_dir() {
        let result = find_entity_file(Path::new("/nonexistent/path"), "BIN-123").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_save_all_rolls_back_on_failure() {
        let (_tmp, project) = project();
        let items = vec![
            WishItem::new("One", None, vec![]).unwrap(),
            WishItem::new("Two", None, vec![]).unwrap(),
        ];
        // A directory where the second file should go makes its write fail.
        fs::create_dir_all(project.entity_path(&items[1].id)).unwrap();

        assert!(save_all(&project, &items).is_err());
        assert!(!project.entity_path(&items[0].id).exists());
    }
}
