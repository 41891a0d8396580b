//! Console output and the line-oriented report protocol.
//!
//! Everything written to stdout is either a human-readable progress line or
//! the single JSON report object emitted at the end of a run. Callers that
//! drive this tool programmatically parse only lines that start with `{` and
//! end with `}`; lines containing an `NN%` token act as coarse progress.
//! Interactive progress bars are drawn on stderr so they never pollute the
//! protocol stream.

use crate::engine::RunReport;
use colored::*;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;

/// Manages all CLI output with consistent styling.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Prints a coarse progress line: `[ 42%] message`.
    ///
    /// The percent token is part of the wire contract; keep it even when the
    /// message changes.
    pub fn progress(current: usize, total: usize, message: &str) {
        let percent = if total == 0 {
            100
        } else {
            (current * 100) / total
        };
        println!("[{:>3}%] {}", percent, message);
    }

    /// Emits the run report as a single self-delimited JSON line on stdout.
    /// This is the one machine-readable line of a run.
    pub fn emit_report(report: &RunReport) {
        if let Ok(line) = serde_json::to_string(report) {
            println!("{}", line);
        }
    }

    /// Creates a progress bar for file operations, drawn on stderr.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr());
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints a summary table of files per category.
    pub fn summary_table(category_counts: &HashMap<String, usize>, total_files: usize) {
        Self::header("SUMMARY");

        let mut categories: Vec<_> = category_counts.iter().collect();
        categories.sort_by_key(|&(name, _)| name);

        let max_category_len = categories
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max(8);

        println!(
            "{:<width$} | {}",
            "Category".bold(),
            "Files".bold(),
            width = max_category_len
        );
        println!("{}", "-".repeat(max_category_len + 10));

        for (category, count) in &categories {
            let file_word = if **count == 1 { "file" } else { "files" };
            println!(
                "{:<width$} | {} {}",
                category,
                count.to_string().green(),
                file_word,
                width = max_category_len
            );
        }

        println!("{}", "-".repeat(max_category_len + 10));
        println!(
            "{:<width$} | {} {}",
            "Total".bold(),
            total_files.to_string().green().bold(),
            if total_files == 1 { "file" } else { "files" },
            width = max_category_len
        );
    }
}

/// Human-readable byte count: B, KB, MB, or GB with two decimals.
pub fn format_size(size_bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let size = size_bytes as f64;
    if size < KB {
        format!("{} B", size_bytes)
    } else if size < MB {
        format!("{:.2} KB", size / KB)
    } else if size < GB {
        format!("{:.2} MB", size / MB)
    } else {
        format!("{:.2} GB", size / GB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_bands() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
    }

    #[test]
    fn test_report_serializes_to_wire_shape() {
        let report = RunReport {
            files_organized: 2,
            duplicates_removed: 1,
            space_saved: 10,
            errors: vec!["ignored on the wire".to_string()],
            ..RunReport::default()
        };
        let line = serde_json::to_string(&report).unwrap();

        assert!(line.starts_with('{') && line.ends_with('}'));
        assert!(line.contains("\"files_organized\":2"));
        assert!(line.contains("\"duplicates_removed\":1"));
        assert!(line.contains("\"space_saved\":10"));
        assert!(!line.contains("errors"));
    }
}
