//! `stash wish` command - Wish list management and CSV import

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::io;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::sync::auto_sync;
use crate::cli::helpers::{
    confirm, edit_in_editor, format_short_id, open_project, resolve_entity, resolve_format,
    success, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::csv_import;
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::wish_item::split_image_paths;
use crate::entities::{WishItem, WishItemChanges};

#[derive(Subcommand, Debug)]
pub enum WishCommands {
    /// List wish list items
    List(ListArgs),

    /// Add an item to the wish list
    New(NewArgs),

    /// Show an item's details
    Show(ShowArgs),

    /// Change an item (opens the editor when no field flags are given)
    Edit(EditArgs),

    /// Remove an item from the wish list
    Delete(DeleteArgs),

    /// Import wish list items from a CSV file
    Import(ImportArgs),
}

/// Sort order for list output
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum SortField {
    Name,
    #[default]
    Created,
    Updated,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Search in name and url (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Sort by field
    #[arg(long, default_value = "created")]
    pub sort: SortField,

    /// Reverse sort order
    #[arg(long, short = 'r')]
    pub reverse: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item name (required)
    #[arg(long, short = 'n')]
    pub name: String,

    /// Where to find or buy it
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// Image paths separated by ';'
    #[arg(long)]
    pub images: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Item ID or short ID (WISH@N)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Item ID or short ID (WISH@N)
    pub id: String,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New url
    #[arg(long, short = 'u')]
    pub url: Option<String>,

    /// Remove the url
    #[arg(long, conflicts_with = "url")]
    pub clear_url: bool,

    /// Replace image paths (';'-separated, empty string clears)
    #[arg(long)]
    pub images: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Item ID or short ID (WISH@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// CSV file with a header row (name required; url and imagePaths optional)
    #[arg(required_unless_present = "template")]
    pub file: Option<PathBuf>,

    /// Validate and preview without creating files
    #[arg(long)]
    pub dry_run: bool,

    /// Print a CSV template and exit
    #[arg(long, conflicts_with_all = ["file", "dry_run"])]
    pub template: bool,
}

/// Run a wish list subcommand
pub fn run(cmd: WishCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        WishCommands::List(args) => run_list(args, global),
        WishCommands::New(args) => run_new(args, global),
        WishCommands::Show(args) => run_show(args, global),
        WishCommands::Edit(args) => run_edit(args, global),
        WishCommands::Delete(args) => run_delete(args, global),
        WishCommands::Import(args) => run_import(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let mut items: Vec<WishItem> = loader::load_all(&project)?;

    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        items.retain(|item| {
            item.name.to_lowercase().contains(&needle)
                || item
                    .url
                    .as_ref()
                    .is_some_and(|u| u.to_lowercase().contains(&needle))
        });
    }

    match args.sort {
        SortField::Name => items.sort_by_key(|item| item.name.to_lowercase()),
        SortField::Created => items.sort_by(|a, b| a.created.cmp(&b.created)),
        SortField::Updated => items.sort_by(|a, b| a.updated.cmp(&b.updated)),
    }
    if args.reverse {
        items.reverse();
    }
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if items.is_empty() && matches!(format, OutputFormat::Tsv | OutputFormat::Md) {
        println!("No wish list items found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.rebuild(EntityPrefix::Wish, items.iter().map(|i| i.id.to_string()));
    if let Err(e) = short_ids.save(&project) {
        tracing::warn!(error = %e, "could not save short IDs");
    }
    let short_of = |item: &WishItem| short_ids.get_short_id(&item.id.to_string()).unwrap_or_default();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&items).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&items).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            // Same columns the importer reads, so the output can be imported again
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer.write_record(csv_import::COLUMNS).into_diagnostic()?;
            for item in &items {
                writer
                    .write_record([
                        item.name.as_str(),
                        item.url.as_deref().unwrap_or(""),
                        item.image_paths.join(";").as_str(),
                    ])
                    .into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Id => {
            for item in &items {
                println!("{}", item.id);
            }
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(["Short", "ID", "Name", "URL", "Images"]);
            for item in &items {
                builder.push_record([
                    short_of(item),
                    format_short_id(&item.id),
                    item.name.clone(),
                    item.url.clone().unwrap_or_else(|| "-".to_string()),
                    item.image_paths.len().to_string(),
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<8} {:<17} {:<30} {:<35} {:<10}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("NAME").bold(),
                style("URL").bold(),
                style("UPDATED").bold()
            );
            println!("{}", "-".repeat(104));
            for item in &items {
                println!(
                    "{:<8} {:<17} {:<30} {:<35} {:<10}",
                    style(short_of(item)).cyan(),
                    format_short_id(&item.id),
                    truncate_str(&item.name, 28),
                    truncate_str(item.url.as_deref().unwrap_or("-"), 33),
                    item.updated.format("%Y-%m-%d")
                );
            }
            println!();
            println!(
                "{} item(s) found. Use {} to reference by short ID.",
                style(items.len()).cyan(),
                style("WISH@N").cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let images = args
        .images
        .as_deref()
        .map(split_image_paths)
        .unwrap_or_default();

    let item = WishItem::new(&args.name, args.url.as_deref(), images)
        .map_err(|e| miette::miette!("{}", e))?;
    let path = loader::save(&project, &item)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(EntityPrefix::Wish, item.id.to_string());
    if let Err(e) = short_ids.save(&project) {
        tracing::warn!(error = %e, "could not save short IDs");
    }

    if global.format == OutputFormat::Id {
        println!("{}", item.id);
    } else {
        success(
            global,
            format!("Created wish list item {}", style(&short_id).cyan()),
        );
        if !global.quiet {
            println!("   {}", style(path.display()).dim());
            println!("   Name: {}", style(&item.name).yellow());
        }
    }

    auto_sync(&project, global);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let (path, item) = resolve_entity::<WishItem>(&project, &args.id)?;

    match resolve_format(global, &config, OutputFormat::Auto) {
        OutputFormat::Yaml => {
            let content = fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&item).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            println!("{}", item.id);
        }
        _ => print_item(&item),
    }

    Ok(())
}

fn print_item(item: &WishItem) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("ID").bold(),
        style(item.id.to_string()).cyan()
    );
    println!("{}: {}", style("Name").bold(), style(&item.name).yellow());
    if let Some(ref url) = item.url {
        println!("{}: {}", style("URL").bold(), url);
    }
    if !item.image_paths.is_empty() {
        println!("{}:", style("Images").bold());
        for path in &item.image_paths {
            println!("  • {}", path);
        }
    }
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("Created").dim(),
        item.created.format("%Y-%m-%d %H:%M")
    );
    if item.was_updated() {
        println!(
            "{}: {}",
            style("Updated").dim(),
            item.updated.format("%Y-%m-%d %H:%M")
        );
    }
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let (path, mut item) = resolve_entity::<WishItem>(&project, &args.id)?;

    let changes = WishItemChanges {
        name: args.name,
        url: if args.clear_url {
            Some(None)
        } else {
            args.url.map(Some)
        },
        image_paths: args.images.as_deref().map(split_image_paths),
    };

    if changes.is_empty() {
        item = edit_in_editor(&config, &path, &item, global, |edited: &mut WishItem| {
            let name = edited.name.clone();
            edited.update(WishItemChanges {
                name: Some(name),
                ..Default::default()
            })
        })?;
    } else {
        item.update(changes).map_err(|e| miette::miette!("{}", e))?;
    }

    loader::save(&project, &item)?;
    success(
        global,
        format!("Updated {}", style(truncate_str(&item.name, 40)).yellow()),
    );

    auto_sync(&project, global);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (path, item) = resolve_entity::<WishItem>(&project, &args.id)?;

    if !confirm(&format!("Delete '{}' from the wish list?", item.name), args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    loader::delete(&path)?;
    success(
        global,
        format!("Deleted {}", style(truncate_str(&item.name, 40)).yellow()),
    );

    auto_sync(&project, global);
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    if args.template {
        print!("{}", csv_import::template());
        return Ok(());
    }

    let file_path = args
        .file
        .ok_or_else(|| miette::miette!("CSV file required. Usage: stash wish import <FILE>"))?;
    let project = open_project(global)?;

    if !global.quiet {
        println!(
            "{} Importing wish list from {}{}",
            style("→").blue(),
            style(file_path.display()).yellow(),
            if args.dry_run {
                style(" (dry run)").dim().to_string()
            } else {
                String::new()
            }
        );
        println!();
    }

    // Parsing either yields every row or nothing; no file is touched before this point.
    let items = csv_import::import_file(&file_path)?;
    tracing::debug!(rows = items.len(), path = %file_path.display(), "parsed wish list CSV");

    if args.dry_run {
        if !global.quiet {
            for (row, item) in items.iter().enumerate() {
                println!(
                    "{} Row {}: Would create {}",
                    style("○").dim(),
                    row + 1,
                    truncate_str(&item.name, 40)
                );
            }
        }
    } else {
        loader::save_all(&project, &items).map_err(|e| {
            miette::miette!("Could not save imported items, nothing was imported: {}", e)
        })?;

        let mut short_ids = ShortIdIndex::load(&project);
        for (row, item) in items.iter().enumerate() {
            let short_id = short_ids.add(EntityPrefix::Wish, item.id.to_string());
            if !global.quiet {
                println!(
                    "{} Row {}: Created {} - {}",
                    style("✓").green(),
                    row + 1,
                    style(short_id).cyan(),
                    truncate_str(&item.name, 40)
                );
            }
        }
        if let Err(e) = short_ids.save(&project) {
            tracing::warn!(error = %e, "could not save short IDs");
        }
    }

    if !global.quiet {
        println!();
        println!("{}", style("─".repeat(50)).dim());
        println!("{}", style("Import Summary").bold());
        println!("{}", style("─".repeat(50)).dim());
        println!("  Rows processed:   {}", style(items.len()).cyan());
        let created = if args.dry_run { 0 } else { items.len() };
        println!("  Items created:    {}", style(created).green());

        if args.dry_run {
            println!();
            println!(
                "{}",
                style("Dry run complete. No files were created.").yellow()
            );
        }
    }

    if !args.dry_run {
        auto_sync(&project, global);
    }
    Ok(())
}
