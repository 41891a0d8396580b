//! The organization engine: one full pass over a directory.
//!
//! A run walks the phases `Scanning -> Classifying -> (Deduplicating) ->
//! Moving -> Reporting`. Per-file failures are recorded in the run report
//! and never abort the batch; the only fatal condition is a root that is
//! missing or not a directory.
//!
//! The scan is non-recursive: organizing a folder means its immediate
//! files, and category subdirectories are never descended into. The
//! `.tags.json` sidecar, if present, is left untouched.

use crate::config::CompiledConfig;
use crate::dedupe::DuplicateResolver;
use crate::file_category::{Category, Classifier, Mode};
use crate::file_organizer::{OrganizeError, OrganizeResult, Reorganizer};
use crate::output::{OutputFormatter, format_size};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Sidecar file mapping relative paths to display tags. Owned by callers;
/// the engine never moves, deletes, or interprets it.
pub const TAGS_SIDECAR: &str = ".tags.json";

/// Snapshot of one on-disk file at scan time.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
    /// Lowercased extension without the dot, if the name has one.
    pub extension: Option<String>,
    /// Extension sniffed from content for extensionless files.
    pub sniffed_extension: Option<String>,
}

/// Options for one organize run.
#[derive(Debug, Clone, Copy)]
pub struct OrganizeOptions {
    pub mode: Mode,
    pub remove_duplicates: bool,
    pub dry_run: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Type,
            remove_duplicates: false,
            dry_run: false,
        }
    }
}

/// Aggregate statistics for one run. Serialized to the wire as exactly
/// `files_organized`, `duplicates_removed`, and `space_saved`; the error
/// list stays report-local.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files_organized: u64,
    pub duplicates_removed: u64,
    pub space_saved: u64,
    #[serde(skip)]
    pub errors: Vec<String>,
    /// Successful moves per category, for the end-of-run summary.
    #[serde(skip)]
    pub category_counts: HashMap<String, usize>,
}

/// Phases of a run, in order. A root-level error aborts the run with an
/// `Err` from whichever phase detected it; per-file errors do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Scanning,
    Classifying,
    Deduplicating,
    Moving,
    Reporting,
    Done,
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunPhase::Scanning => "Scanning",
            RunPhase::Classifying => "Classifying",
            RunPhase::Deduplicating => "Deduplicating",
            RunPhase::Moving => "Moving",
            RunPhase::Reporting => "Reporting",
            RunPhase::Done => "Done",
        };
        write!(f, "{}", name)
    }
}

/// Orchestrates a single organize pass.
pub struct OrganizationEngine<'a> {
    options: OrganizeOptions,
    config: &'a CompiledConfig,
}

impl<'a> OrganizationEngine<'a> {
    pub fn new(options: OrganizeOptions, config: &'a CompiledConfig) -> Self {
        Self { options, config }
    }

    /// Run one full pass over the immediate files of `root`.
    ///
    /// # Errors
    ///
    /// Fails only when `root` is missing, unreadable, or not a directory.
    /// Every per-file problem is recorded in the returned report instead.
    pub fn organize(&self, root: &Path) -> OrganizeResult<RunReport> {
        self.organize_scoped(root, None)
    }

    /// Run a pass restricted to the given paths (used by the watcher for
    /// incremental runs). `None` means all immediate files.
    pub fn organize_scoped(
        &self,
        root: &Path,
        scope: Option<&[PathBuf]>,
    ) -> OrganizeResult<RunReport> {
        let root_meta = fs::metadata(root).map_err(|e| OrganizeError::InvalidRoot {
            path: root.to_path_buf(),
            source: e,
        })?;
        if !root_meta.is_dir() {
            return Err(OrganizeError::InvalidRoot {
                path: root.to_path_buf(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let mut report = RunReport::default();

        self.enter(RunPhase::Scanning);
        let records = self.scan(root, scope, &mut report)?;

        self.enter(RunPhase::Classifying);
        let classifier = Classifier::new(self.options.mode, self.config.categories.clone());

        let mut removed: HashSet<PathBuf> = HashSet::new();
        if self.options.remove_duplicates {
            self.enter(RunPhase::Deduplicating);
            self.remove_duplicates(&records, &mut removed, &mut report);
        }

        self.enter(RunPhase::Moving);
        let assignments: Vec<(FileRecord, Category)> = records
            .into_iter()
            .filter(|record| !removed.contains(&record.path))
            .map(|record| {
                let category = classifier.classify(&record);
                (record, category)
            })
            .collect();

        self.execute_moves(root, &assignments, &mut report);

        self.enter(RunPhase::Reporting);
        Ok(report)
    }

    /// Enumerate immediate files into records. Skips directories, the tags
    /// sidecar, and anything the filter rules exclude. A file that cannot be
    /// statted is recorded as an error and skipped.
    fn scan(
        &self,
        root: &Path,
        scope: Option<&[PathBuf]>,
        report: &mut RunReport,
    ) -> OrganizeResult<Vec<FileRecord>> {
        let entries = fs::read_dir(root).map_err(|e| OrganizeError::InvalidRoot {
            path: root.to_path_buf(),
            source: e,
        })?;

        let scope_set: Option<HashSet<&Path>> =
            scope.map(|paths| paths.iter().map(PathBuf::as_path).collect());

        let mut records = Vec::new();
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if !file_type.is_file() {
                continue;
            }

            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if name == TAGS_SIDECAR {
                continue;
            }
            if !self.config.filters.should_include(&path) {
                continue;
            }
            if let Some(set) = &scope_set
                && !set.contains(path.as_path())
            {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    report.errors.push(
                        OrganizeError::UnreadableFile {
                            path: path.clone(),
                            source: e,
                        }
                        .to_string(),
                    );
                    continue;
                }
            };

            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());
            let sniffed_extension = if extension.is_none() {
                sniff_extension(&path)
            } else {
                None
            };

            records.push(FileRecord {
                path,
                name,
                size: metadata.len(),
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                extension,
                sniffed_extension,
            });
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    fn remove_duplicates(
        &self,
        records: &[FileRecord],
        removed: &mut HashSet<PathBuf>,
        report: &mut RunReport,
    ) {
        let resolution = DuplicateResolver::resolve(records);

        for (path, reason) in &resolution.skipped {
            report
                .errors
                .push(format!("Skipped unreadable file {}: {}", path.display(), reason));
        }

        for group in &resolution.groups {
            for duplicate in &group.duplicates {
                if self.options.dry_run {
                    OutputFormatter::dry_run_notice(&format!(
                        "Would remove duplicate: {} ({})",
                        duplicate.name,
                        format_size(duplicate.size)
                    ));
                } else if let Err(e) = fs::remove_file(&duplicate.path) {
                    report.errors.push(format!(
                        "Failed to remove duplicate {}: {}",
                        duplicate.path.display(),
                        e
                    ));
                    continue;
                } else {
                    OutputFormatter::plain(&format!(
                        "Removed duplicate: {} ({})",
                        duplicate.name,
                        format_size(duplicate.size)
                    ));
                }

                removed.insert(duplicate.path.clone());
                report.duplicates_removed += 1;
                report.space_saved += duplicate.size;
            }
        }
    }

    fn execute_moves(
        &self,
        root: &Path,
        assignments: &[(FileRecord, Category)],
        report: &mut RunReport,
    ) {
        let operations = Reorganizer::plan(root, assignments);
        let total = operations.len();
        let bar = OutputFormatter::create_progress_bar(total as u64);

        for (index, operation) in operations.iter().enumerate() {
            let category_dir = operation
                .destination
                .parent()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            OutputFormatter::progress(
                index + 1,
                total,
                &format!("Moving {} to {}/", operation.record.name, category_dir),
            );

            if self.options.dry_run {
                OutputFormatter::dry_run_notice(&format!(
                    "Would move {} to {}/",
                    operation.record.name, category_dir
                ));
                report.files_organized += 1;
                *report.category_counts.entry(category_dir).or_insert(0) += 1;
            } else {
                match Reorganizer::execute(operation) {
                    Ok(_) => {
                        report.files_organized += 1;
                        *report.category_counts.entry(category_dir).or_insert(0) += 1;
                    }
                    Err(e) => report.errors.push(e.to_string()),
                }
            }
            bar.inc(1);
        }

        bar.finish_and_clear();
    }

    fn enter(&self, phase: RunPhase) {
        if phase != RunPhase::Done {
            OutputFormatter::info(&format!("{}...", phase));
        }
    }
}

/// Best-effort content sniff for files without an extension. Reads at most
/// one header block; any IO problem just yields `None`.
fn sniff_extension(path: &Path) -> Option<String> {
    let mut file = fs::File::open(path).ok()?;
    let mut header = [0u8; 8192];
    let n = file.read(&mut header).ok()?;
    infer::get(&header[..n]).map(|kind| kind.extension().to_string())
}
