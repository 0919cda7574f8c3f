//! `stash sync` command - Mirror the project into a remote directory

use chrono::{DateTime, Utc};
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{open_project, resolve_format, success};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::project::Project;
use crate::core::sync::{sync_now, DirectoryRemote, Remote, SyncContext, SyncError, SyncState};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Show whether sync is enabled and how the last run went
    Status,

    /// Push all entity files to the remote now
    Now,

    /// Turn sync on (remote is required the first time)
    Enable(EnableArgs),

    /// Turn sync off, keeping the configured remote
    Disable,
}

#[derive(clap::Args, Debug)]
pub struct EnableArgs {
    /// Directory to mirror the project into (e.g. a cloud-synced folder).
    /// A relative path is resolved against the current directory.
    #[arg(long, short = 'r')]
    pub remote: Option<PathBuf>,
}

pub fn run(cmd: SyncCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SyncCommands::Status => run_status(global),
        SyncCommands::Now => run_now(global),
        SyncCommands::Enable(args) => run_enable(args, global),
        SyncCommands::Disable => run_disable(global),
    }
}

/// The configured remote, relative paths taken from the project root
fn configured_remote(project: &Project, config: &Config) -> Option<DirectoryRemote> {
    config
        .sync
        .active_remote()
        .map(|remote| DirectoryRemote::new(project.root().join(remote)))
}

/// Push to the remote after a local change, when sync is enabled.
///
/// A failed push is reported as a warning. The local change stands.
pub fn auto_sync(project: &Project, global: &GlobalOpts) {
    let config = Config::load(Some(project));
    let Some(remote) = configured_remote(project, &config) else {
        return;
    };

    let mut ctx = SyncContext::load(project);
    match sync_now(&mut ctx, &remote, project) {
        Ok(report) => {
            let silent = global.quiet || global.format == OutputFormat::Id;
            if !silent && report.copied + report.removed > 0 {
                println!(
                    "{} Synced to {}",
                    style("↻").blue(),
                    style(remote.describe()).dim()
                );
            }
        }
        Err(e) => {
            eprintln!("{} Sync failed: {}", style("!").yellow(), e);
        }
    }
}

#[derive(Serialize)]
struct StatusReport<'a> {
    enabled: bool,
    remote: Option<String>,
    #[serde(flatten)]
    state: &'a SyncState,
    last_sync: Option<DateTime<Utc>>,
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let ctx = SyncContext::load(&project);

    let report = StatusReport {
        enabled: config.sync.enabled.unwrap_or(false),
        remote: config
            .sync
            .remote
            .as_ref()
            .map(|r| r.display().to_string()),
        state: ctx.state(),
        last_sync: ctx.last_sync(),
    };

    match resolve_format(global, &config, OutputFormat::Auto) {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&report).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let enabled = if report.enabled {
                style("enabled").green()
            } else {
                style("disabled").dim()
            };
            println!("{}: {}", style("Sync").bold(), enabled);
            println!(
                "{}: {}",
                style("Remote").bold(),
                report.remote.as_deref().unwrap_or("-")
            );
            let state = match ctx.state() {
                SyncState::Error { .. } => style(ctx.state().to_string()).red(),
                SyncState::Success { .. } => style(ctx.state().to_string()).green(),
                _ => style(ctx.state().to_string()).cyan(),
            };
            println!("{}: {}", style("State").bold(), state);
            match ctx.last_sync() {
                Some(at) => println!(
                    "{}: {}",
                    style("Last sync").bold(),
                    at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
                None => println!("{}: never", style("Last sync").bold()),
            }
        }
    }

    Ok(())
}

fn run_now(global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));
    let remote = configured_remote(&project, &config)
        .ok_or_else(|| miette::miette!("{}", SyncError::NotConfigured))?;

    if !global.quiet {
        println!(
            "{} Syncing to {}",
            style("→").blue(),
            style(remote.describe()).yellow()
        );
    }

    let mut ctx = SyncContext::load(&project);
    let report = sync_now(&mut ctx, &remote, &project).map_err(|e| miette::miette!("{}", e))?;

    success(
        global,
        format!(
            "{} ({} copied, {} unchanged, {} removed)",
            ctx.state(),
            style(report.copied).green(),
            report.unchanged,
            style(report.removed).yellow()
        ),
    );
    Ok(())
}

fn run_enable(args: EnableArgs, global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    let config = Config::load(Some(&project));

    if args.remote.is_none() && config.sync.remote.is_none() {
        return Err(miette::miette!(
            "A remote directory is required. Usage: stash sync enable --remote <DIR>"
        ));
    }

    // Stored paths are read back relative to the project root, not the cwd
    let remote = match args.remote {
        Some(path) if path.is_relative() => {
            Some(std::env::current_dir().into_diagnostic()?.join(path))
        }
        other => other,
    };

    Config::write_project_sync(&project, true, remote.as_deref())
        .map_err(|e| miette::miette!("{}", e))?;

    let mut ctx = SyncContext::load(&project);
    ctx.reset().map_err(|e| miette::miette!("{}", e))?;
    ctx.save(&project).map_err(|e| miette::miette!("{}", e))?;

    let remote = remote
        .or(config.sync.remote)
        .map(|r| r.display().to_string())
        .unwrap_or_default();
    success(global, format!("Sync enabled to {}", style(remote).cyan()));
    if !global.quiet {
        println!("   Run {} to push now", style("stash sync now").yellow());
    }
    Ok(())
}

fn run_disable(global: &GlobalOpts) -> Result<()> {
    let project = open_project(global)?;
    Config::write_project_sync(&project, false, None).map_err(|e| miette::miette!("{}", e))?;

    let mut ctx = SyncContext::load(&project);
    ctx.reset().map_err(|e| miette::miette!("{}", e))?;
    ctx.save(&project).map_err(|e| miette::miette!("{}", e))?;

    success(global, "Sync disabled");
    Ok(())
}
