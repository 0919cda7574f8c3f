//! `stash bin` command - Storage bins and their QR labels

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::sync::auto_sync;
use crate::cli::helpers::{
    confirm, edit_in_editor, format_short_id, open_project, resolve_entity, resolve_format,
    success, truncate_str,
};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::EntityPrefix;
use crate::core::loader;
use crate::core::qr;
use crate::core::shortid::ShortIdIndex;
use crate::core::Config;
use crate::entities::{Bin, BinType};

/// Pixels per QR module in SVG labels
const DEFAULT_MODULE_PX: u32 = 8;

#[derive(Subcommand, Debug)]
pub enum BinCommands {
    /// List bins
    List(ListArgs),

    /// Register a new bin and print its QR label
    New(NewArgs),

    /// Show a bin's details
    Show(ShowArgs),

    /// Change a bin (opens the editor when no field flags are given)
    Edit(EditArgs),

    /// Remove a bin
    Delete(DeleteArgs),

    /// Print or save a bin's QR label
    Qr(QrArgs),

    /// Find the bin a scanned QR payload belongs to
    Lookup(LookupArgs),
}

/// Bin type filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TypeFilter {
    Set,
    Loose,
    /// All types
    All,
}

impl TypeFilter {
    fn matches(self, bin_type: BinType) -> bool {
        match self {
            TypeFilter::Set => bin_type == BinType::Set,
            TypeFilter::Loose => bin_type == BinType::Loose,
            TypeFilter::All => true,
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by type
    #[arg(long = "type", short = 't', default_value = "all")]
    pub bin_type: TypeFilter,

    /// Search in description (case-insensitive)
    #[arg(long)]
    pub search: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Bin type: set or loose
    #[arg(long = "type", short = 't', default_value = "set")]
    pub bin_type: BinType,

    /// What is in the bin (required)
    #[arg(long, short = 'd')]
    pub description: String,

    /// Building instructions link (ignored for loose bins)
    #[arg(long, short = 'l')]
    pub link: Option<String>,

    /// Also write the QR label to this SVG file
    #[arg(long, value_name = "FILE")]
    pub qr: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Bin ID or short ID (BIN@N)
    pub id: String,

    /// Print the QR label below the details
    #[arg(long)]
    pub qr: bool,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Bin ID or short ID (BIN@N)
    pub id: String,

    /// New type
    #[arg(long = "type", short = 't')]
    pub bin_type: Option<BinType>,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// New building instructions link
    #[arg(long, short = 'l')]
    pub link: Option<String>,

    /// Remove the building instructions link
    #[arg(long, conflicts_with = "link")]
    pub clear_link: bool,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Bin ID or short ID (BIN@N)
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct QrArgs {
    /// Bin ID or short ID (BIN@N)
    pub id: String,

    /// Write an SVG label instead of printing to the terminal
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Pixels per QR module in the SVG
    #[arg(long, default_value_t = DEFAULT_MODULE_PX, value_parser = clap::value_parser!(u32).range(1..=64))]
    pub size: u32,
}

#[derive(clap::Args, Debug)]
pub struct LookupArgs {
    /// Text read from the QR code
    pub payload: String,
}

/// Run a bin subcommand
pub fn run(cmd: BinCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BinCommands::List(args) => run_list(args, global),
        BinCommands::New(args) => run_new(args, global),
        BinCommands::Show(args) => run_show(args, global),
        BinCommands::Edit(args) => run_edit(args, global),
        BinCommands::Delete(args) => run_delete(args, global),
        BinCommands::Qr(args) => run_qr(args, global),
        BinCommands::Lookup(args) => run_lookup(args, global),
    }
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let mut bins: Vec<Bin> = loader::load_all(&project)?;

    bins.retain(|bin| args.bin_type.matches(bin.bin_type));
    if let Some(ref search) = args.search {
        let needle = search.to_lowercase();
        bins.retain(|bin| bin.description.to_lowercase().contains(&needle));
    }
    bins.sort_by(|a, b| a.created.cmp(&b.created));

    if args.count {
        println!("{}", bins.len());
        return Ok(());
    }

    let format = resolve_format(global, &config, OutputFormat::Tsv);
    if bins.is_empty() && matches!(format, OutputFormat::Tsv | OutputFormat::Md) {
        println!("No bins found.");
        return Ok(());
    }

    let mut short_ids = ShortIdIndex::load(&project);
    short_ids.rebuild(EntityPrefix::Bin, bins.iter().map(|b| b.id.to_string()));
    if let Err(e) = short_ids.save(&project) {
        tracing::warn!(error = %e, "could not save short IDs");
    }
    let short_of = |bin: &Bin| short_ids.get_short_id(&bin.id.to_string()).unwrap_or_default();

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&bins).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&bins).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            writer
                .write_record(["short_id", "id", "type", "description", "instruction_link"])
                .into_diagnostic()?;
            for bin in &bins {
                writer
                    .write_record([
                        short_of(bin),
                        bin.id.to_string(),
                        bin.bin_type.to_string(),
                        bin.description.clone(),
                        bin.instruction_link.clone().unwrap_or_default(),
                    ])
                    .into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Id => {
            for bin in &bins {
                println!("{}", bin.id);
            }
        }
        OutputFormat::Md => {
            let mut builder = Builder::default();
            builder.push_record(["Short", "ID", "Type", "Description", "Instructions"]);
            for bin in &bins {
                builder.push_record([
                    short_of(bin),
                    format_short_id(&bin.id),
                    bin.bin_type.to_string(),
                    bin.description.clone(),
                    bin.instruction_link.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            println!(
                "{:<8} {:<17} {:<6} {:<35} {:<30}",
                style("SHORT").bold().dim(),
                style("ID").bold(),
                style("TYPE").bold(),
                style("DESCRIPTION").bold(),
                style("INSTRUCTIONS").bold()
            );
            println!("{}", "-".repeat(100));
            for bin in &bins {
                println!(
                    "{:<8} {:<17} {:<6} {:<35} {:<30}",
                    style(short_of(bin)).cyan(),
                    format_short_id(&bin.id),
                    bin.bin_type,
                    truncate_str(&bin.description, 33),
                    truncate_str(bin.instruction_link.as_deref().unwrap_or("-"), 28)
                );
            }
            println!();
            println!(
                "{} bin(s) found. Use {} to reference by short ID.",
                style(bins.len()).cyan(),
                style("BIN@N").cyan()
            );
        }
    }

    Ok(())
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;

    if args.bin_type == BinType::Loose && args.link.is_some() {
        tracing::warn!("instruction link ignored for loose bin");
    }
    let bin = Bin::new(args.bin_type, &args.description, args.link.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;
    let path = loader::save(&project, &bin)?;

    let mut short_ids = ShortIdIndex::load(&project);
    let short_id = short_ids.add(EntityPrefix::Bin, bin.id.to_string());
    if let Err(e) = short_ids.save(&project) {
        tracing::warn!(error = %e, "could not save short IDs");
    }

    if let Some(ref svg_path) = args.qr {
        write_svg(&bin, svg_path, DEFAULT_MODULE_PX)?;
    }

    if global.format == OutputFormat::Id {
        println!("{}", bin.id);
    } else {
        success(
            global,
            format!("Created {} bin {}", bin.bin_type, style(&short_id).cyan()),
        );
        if !global.quiet {
            println!("   {}", style(path.display()).dim());
            println!("   Description: {}", style(&bin.description).yellow());
            if let Some(ref svg_path) = args.qr {
                println!("   QR label: {}", style(svg_path.display()).cyan());
            } else {
                println!();
                print!("{}", terminal_label(&bin)?);
            }
        }
    }

    auto_sync(&project, global);
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let (path, bin) = resolve_entity::<Bin>(&project, &args.id)?;

    match resolve_format(global, &config, OutputFormat::Auto) {
        OutputFormat::Yaml => {
            let content = fs::read_to_string(&path).into_diagnostic()?;
            print!("{}", content);
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&bin).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Id => {
            println!("{}", bin.id);
        }
        _ => {
            print_bin(&bin);
            if args.qr {
                println!();
                print!("{}", terminal_label(&bin)?);
            }
        }
    }

    Ok(())
}

fn print_bin(bin: &Bin) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("ID").bold(),
        style(bin.id.to_string()).cyan()
    );
    println!("{}: {}", style("Type").bold(), bin.bin_type);
    println!(
        "{}: {}",
        style("Description").bold(),
        style(&bin.description).yellow()
    );
    if let Some(ref link) = bin.instruction_link {
        println!("{}: {}", style("Instructions").bold(), link);
    }
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("Created").dim(),
        bin.created.format("%Y-%m-%d %H:%M")
    );
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let (path, mut bin) = resolve_entity::<Bin>(&project, &args.id)?;

    let no_flags = args.bin_type.is_none()
        && args.description.is_none()
        && args.link.is_none()
        && !args.clear_link;
    if no_flags {
        bin = edit_in_editor(&config, &path, &bin, global, |edited: &mut Bin| {
            let description = edited.description.clone();
            edited.update(None, Some(&description), None)
        })?;
    } else {
        let link = if args.clear_link {
            Some(None)
        } else {
            args.link.as_deref().map(Some)
        };
        bin.update(args.bin_type, args.description.as_deref(), link)
            .map_err(|e| miette::miette!("{}", e))?;
    }

    loader::save(&project, &bin)?;
    success(
        global,
        format!("Updated bin {}", style(truncate_str(&bin.description, 40)).yellow()),
    );

    auto_sync(&project, global);
    Ok(())
}

fn run_delete(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (path, bin) = resolve_entity::<Bin>(&project, &args.id)?;

    let prompt = format!(
        "Delete bin '{}'? Its printed QR label will stop working.",
        bin.description
    );
    if !confirm(&prompt, args.yes)? {
        println!("Cancelled.");
        return Ok(());
    }

    loader::delete(&path)?;
    success(
        global,
        format!("Deleted bin {}", style(truncate_str(&bin.description, 40)).yellow()),
    );

    auto_sync(&project, global);
    Ok(())
}

fn run_qr(args: QrArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let (_, bin) = resolve_entity::<Bin>(&project, &args.id)?;

    match args.output {
        Some(ref svg_path) => {
            write_svg(&bin, svg_path, args.size)?;
            success(
                global,
                format!("Wrote QR label to {}", style(svg_path.display()).cyan()),
            );
        }
        None => print!("{}", terminal_label(&bin)?),
    }
    Ok(())
}

fn run_lookup(args: LookupArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let bins: Vec<Bin> = loader::load_all(&project)?;

    let bin = qr::lookup(&bins, &args.payload).map_err(|e| miette::miette!("{}", e))?;
    tracing::debug!(id = %bin.id, "QR payload resolved");

    match resolve_format(global, &config, OutputFormat::Auto) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(bin).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(bin).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => println!("{}", bin.id),
        _ => print_bin(bin),
    }
    Ok(())
}

fn terminal_label(bin: &Bin) -> Result<String> {
    let text = qr::render_terminal(&bin.id.to_string()).map_err(|e| miette::miette!("{}", e))?;
    Ok(format!("{}\n{}\n", text, style(bin.id.to_string()).dim()))
}

fn write_svg(bin: &Bin, path: &Path, module_px: u32) -> Result<()> {
    let svg = qr::render_svg(&bin.id.to_string(), module_px).map_err(|e| miette::miette!("{}", e))?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    fs::write(path, svg).into_diagnostic()?;
    tracing::debug!(path = %path.display(), "wrote QR label");
    Ok(())
}
