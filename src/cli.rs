//! Command-line interface: argument parsing and run orchestration.
//!
//! One-shot runs organize the directory once and emit the final report;
//! `--watch` keeps the process resident and organizes files as they appear.
//! Per-file errors never fail the process — only a root that cannot be
//! opened does.

use crate::config::OrganizeConfig;
use crate::engine::{OrganizationEngine, OrganizeOptions};
use crate::file_category::Mode;
use crate::output::OutputFormatter;
use crate::watch::DirectoryWatcher;
use clap::Parser;
use std::path::PathBuf;

/// Organize a directory into category subfolders.
#[derive(Debug, Parser)]
#[command(name = "dirsort", version, about)]
pub struct Cli {
    /// Directory to organize.
    pub path: PathBuf,

    /// Organizing mode.
    #[arg(long, value_enum, default_value_t = Mode::Type)]
    pub mode: Mode,

    /// Remove duplicate files before organizing.
    #[arg(long)]
    pub remove_duplicates: bool,

    /// Show what would happen without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Stay resident and organize files as they appear.
    #[arg(long)]
    pub watch: bool,

    /// Path to a configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Run the application for parsed arguments.
///
/// Returns `Err` only for fatal conditions (bad configuration, inaccessible
/// root); the caller maps that to a non-zero exit status. A completed run
/// with per-file errors is still `Ok`.
pub fn run_cli(cli: &Cli) -> Result<(), String> {
    let config = OrganizeConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let compiled = config
        .compile()
        .map_err(|e| format!("Error compiling configuration: {}", e))?;
    for warning in &compiled.warnings {
        OutputFormatter::warning(warning);
    }

    let options = OrganizeOptions {
        mode: cli.mode,
        remove_duplicates: cli.remove_duplicates,
        dry_run: cli.dry_run,
    };

    OutputFormatter::plain(&format!("Directory: {}", cli.path.display()));
    OutputFormatter::plain(&format!("Mode: {}", cli.mode));
    OutputFormatter::plain(&format!("Remove duplicates: {}", cli.remove_duplicates));

    if cli.watch {
        return DirectoryWatcher::run_blocking(&cli.path, options, compiled)
            .map_err(|e| e.to_string());
    }

    let engine = OrganizationEngine::new(options, &compiled);
    let report = engine.organize(&cli.path).map_err(|e| e.to_string())?;

    for error in &report.errors {
        OutputFormatter::error(error);
    }
    if !report.category_counts.is_empty() {
        OutputFormatter::summary_table(&report.category_counts, report.files_organized as usize);
    }
    OutputFormatter::emit_report(&report);

    if report.errors.is_empty() {
        OutputFormatter::success("All tasks completed");
    } else {
        OutputFormatter::warning(&format!(
            "Completed with {} error(s); see above",
            report.errors.len()
        ));
    }

    Ok(())
}
