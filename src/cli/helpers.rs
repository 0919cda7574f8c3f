//! Shared helper functions for CLI commands

use clap::ValueEnum;
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::{Entity, FieldError};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;

/// Open the project named by `--project`, or discover it from the current directory
pub fn open_project(global: &GlobalOpts) -> Result<Project> {
    Project::open(global.project.as_deref()).map_err(|e| miette::miette!("{}", e))
}

/// Pick the output format: explicit flag, then config default, then `fallback`
pub fn resolve_format(global: &GlobalOpts, config: &Config, fallback: OutputFormat) -> OutputFormat {
    if global.format != OutputFormat::Auto {
        return global.format;
    }
    config
        .default_format
        .as_deref()
        .and_then(|f| OutputFormat::from_str(f, true).ok())
        .filter(|f| *f != OutputFormat::Auto)
        .unwrap_or(fallback)
}

/// Human name for an entity type
pub fn noun(prefix: EntityPrefix) -> &'static str {
    match prefix {
        EntityPrefix::Wish => "wish list item",
        EntityPrefix::Bin => "bin",
    }
}

/// Resolve a short ID, full ID or partial ID to an entity and its file
pub fn resolve_entity<T: Entity>(project: &Project, reference: &str) -> Result<(PathBuf, T)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids.resolve(reference).ok_or_else(|| {
        miette::miette!(
            "Unknown short ID '{}'. List {}s again to refresh short IDs.",
            reference,
            noun(T::PREFIX)
        )
    })?;

    loader::load_entity::<T>(project, &resolved)?
        .ok_or_else(|| miette::miette!("No {} found matching '{}'", noun(T::PREFIX), reference))
}

/// Open an entity file in the editor and re-validate what comes back.
///
/// On any failure the file is restored to its previous content.
pub fn edit_in_editor<T, F>(
    config: &Config,
    path: &Path,
    original: &T,
    global: &GlobalOpts,
    validate: F,
) -> Result<T>
where
    T: Entity,
    F: FnOnce(&mut T) -> std::result::Result<(), FieldError>,
{
    let before = fs::read_to_string(path).into_diagnostic()?;
    if !global.quiet {
        println!(
            "Opening {} in {}...",
            style(path.display()).cyan(),
            style(config.editor()).yellow()
        );
    }

    let edited = config
        .run_editor(path)
        .into_diagnostic()
        .and_then(|status| {
            if status.success() {
                Ok(())
            } else {
                Err(miette::miette!("Editor exited with {}", status))
            }
        })
        .and_then(|()| fs::read_to_string(path).into_diagnostic())
        .and_then(|content| serde_yml::from_str::<T>(&content).into_diagnostic())
        .and_then(|mut entity| {
            if entity.id() != original.id() {
                return Err(miette::miette!(
                    "The id of a {} cannot be changed",
                    noun(T::PREFIX)
                ));
            }
            validate(&mut entity).map_err(|e| miette::miette!("{}", e))?;
            Ok(entity)
        });

    if edited.is_err() {
        tracing::debug!(path = %path.display(), "restoring file after failed edit");
        fs::write(path, before).into_diagnostic()?;
    }
    edited
}

/// Ask before a destructive action. `assume_yes` skips the prompt.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !console::Term::stdout().is_term() {
        return Err(miette::miette!(
            "Not running in a terminal; pass --yes to confirm"
        ));
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Print a success line unless quiet
pub fn success(global: &GlobalOpts, message: impl std::fmt::Display) {
    if !global.quiet {
        println!("{} {}", style("✓").green(), message);
    }
}

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    truncate_str(&id.to_string(), 16)
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(format: OutputFormat) -> GlobalOpts {
        GlobalOpts {
            format,
            quiet: false,
            verbose: false,
            project: None,
        }
    }

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Wish);
        let formatted = format_short_id(&id);
        assert_eq!(formatted.chars().count(), 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ñandú rojo", 6), "ñan...");
    }

    #[test]
    fn test_resolve_format() {
        let config = Config {
            default_format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &config, OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Csv), &config, OutputFormat::Tsv),
            OutputFormat::Csv
        );
        assert_eq!(
            resolve_format(&global(OutputFormat::Auto), &Config::default(), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
    }
}
