//! File classification for the three organizing modes.
//!
//! A [`Classifier`] maps a scanned [`FileRecord`](crate::engine::FileRecord)
//! to exactly one [`Category`]. Classification is pure (no filesystem access)
//! and total: any record that matches no rule lands in the `Other` bucket.

use crate::config::CategoryRule;
use crate::engine::FileRecord;
use chrono::{DateTime, Datelike, Local};
use clap::ValueEnum;
use std::time::SystemTime;

/// The fallback bucket for anything no rule claims.
pub const OTHER_CATEGORY: &str = "Other";

const KIB: u64 = 1024;
const MIB: u64 = 1024 * KIB;
const GIB: u64 = 1024 * MIB;

/// Organizing mode, as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Group by file type, using the configured extension rules.
    Type,
    /// Group by modification month (e.g. "2026-08 (August)").
    Date,
    /// Group by size band (Tiny/Small/Medium/Large/Huge).
    Size,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Type => write!(f, "type"),
            Mode::Date => write!(f, "date"),
            Mode::Size => write!(f, "size"),
        }
    }
}

/// A named bucket a file is sorted into. The name doubles as the destination
/// directory name under the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Category(name.into())
    }

    /// The fallback bucket.
    pub fn other() -> Self {
        Category(OTHER_CATEGORY.to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolves records to categories for one run.
///
/// The reference time is captured at construction so repeated calls within a
/// run are deterministic; modification times after it (clock skew, files from
/// the future) fall back to `Other` in date mode.
pub struct Classifier {
    mode: Mode,
    rules: Vec<CategoryRule>,
    now: SystemTime,
}

impl Classifier {
    pub fn new(mode: Mode, rules: Vec<CategoryRule>) -> Self {
        Self {
            mode,
            rules,
            now: SystemTime::now(),
        }
    }

    /// Map a record to its category under this classifier's mode.
    ///
    /// Total: every well-formed record resolves to exactly one category.
    pub fn classify(&self, record: &FileRecord) -> Category {
        match self.mode {
            Mode::Type => self.classify_by_type(record),
            Mode::Date => self.classify_by_date(record),
            Mode::Size => Self::classify_by_size(record.size),
        }
    }

    /// First matching rule wins, in declaration order. Files without an
    /// extension fall back to the extension sniffed from content at scan
    /// time, if any.
    fn classify_by_type(&self, record: &FileRecord) -> Category {
        let ext = record
            .extension
            .as_deref()
            .or(record.sniffed_extension.as_deref());

        if let Some(ext) = ext {
            let ext = ext.to_lowercase();
            for rule in &self.rules {
                if rule.extensions.iter().any(|e| e == &ext) {
                    return Category::new(rule.name.clone());
                }
            }
        }

        Category::other()
    }

    /// Year-month bucket from the modification time, e.g. "2026-08 (August)".
    fn classify_by_date(&self, record: &FileRecord) -> Category {
        if record.modified > self.now {
            return Category::other();
        }

        let modified: DateTime<Local> = record.modified.into();
        Category::new(format!(
            "{:04}-{:02} ({})",
            modified.year(),
            modified.month(),
            month_name(modified.month())
        ))
    }

    /// Fixed half-open bands, lower bound inclusive: Tiny <100KB,
    /// Small <1MB, Medium <100MB, Large <1GB, Huge >=1GB.
    fn classify_by_size(size: u64) -> Category {
        let name = match size {
            s if s < 100 * KIB => "Tiny",
            s if s < MIB => "Small",
            s if s < 100 * MIB => "Medium",
            s if s < GIB => "Large",
            _ => "Huge",
        };
        Category::new(name)
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_categories;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn record(name: &str, size: u64, modified: SystemTime) -> FileRecord {
        let extension = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty());
        FileRecord {
            path: PathBuf::from("/tmp").join(name),
            name: name.to_string(),
            size,
            modified,
            extension,
            sniffed_extension: None,
        }
    }

    fn type_classifier() -> Classifier {
        Classifier::new(Mode::Type, default_categories())
    }

    #[test]
    fn test_type_mode_matches_known_extensions() {
        let classifier = type_classifier();
        let now = SystemTime::now();

        assert_eq!(
            classifier.classify(&record("notes.txt", 10, now)).name(),
            "Documents"
        );
        assert_eq!(
            classifier.classify(&record("photo.jpg", 10, now)).name(),
            "Images"
        );
        assert_eq!(
            classifier.classify(&record("song.mp3", 10, now)).name(),
            "Music"
        );
    }

    #[test]
    fn test_type_mode_is_case_insensitive() {
        let classifier = type_classifier();
        let now = SystemTime::now();

        assert_eq!(
            classifier.classify(&record("REPORT.PDF", 10, now)).name(),
            "Documents"
        );
    }

    #[test]
    fn test_type_mode_unknown_extension_is_other() {
        let classifier = type_classifier();
        let now = SystemTime::now();

        assert_eq!(
            classifier.classify(&record("data.xyz123", 10, now)).name(),
            OTHER_CATEGORY
        );
    }

    #[test]
    fn test_type_mode_no_extension_is_other() {
        let classifier = type_classifier();
        let now = SystemTime::now();

        assert_eq!(
            classifier.classify(&record("README", 10, now)).name(),
            OTHER_CATEGORY
        );
    }

    #[test]
    fn test_type_mode_sniffed_extension_fallback() {
        let classifier = type_classifier();
        let mut rec = record("mystery", 10, SystemTime::now());
        rec.sniffed_extension = Some("png".to_string());

        assert_eq!(classifier.classify(&rec).name(), "Images");
    }

    #[test]
    fn test_type_mode_first_match_wins() {
        let rules = vec![
            CategoryRule::new("Reports", &["pdf"]),
            CategoryRule::new("Documents", &["pdf", "txt"]),
        ];
        let classifier = Classifier::new(Mode::Type, rules);
        let now = SystemTime::now();

        assert_eq!(
            classifier.classify(&record("a.pdf", 10, now)).name(),
            "Reports"
        );
        assert_eq!(
            classifier.classify(&record("a.txt", 10, now)).name(),
            "Documents"
        );
    }

    #[test]
    fn test_size_bands_lower_inclusive() {
        assert_eq!(Classifier::classify_by_size(0).name(), "Tiny");
        assert_eq!(Classifier::classify_by_size(100 * KIB - 1).name(), "Tiny");
        assert_eq!(Classifier::classify_by_size(100 * KIB).name(), "Small");
        assert_eq!(Classifier::classify_by_size(MIB - 1).name(), "Small");
        assert_eq!(Classifier::classify_by_size(MIB).name(), "Medium");
        assert_eq!(Classifier::classify_by_size(100 * MIB).name(), "Large");
        assert_eq!(Classifier::classify_by_size(GIB - 1).name(), "Large");
        assert_eq!(Classifier::classify_by_size(GIB).name(), "Huge");
    }

    #[test]
    fn test_date_mode_buckets_by_month() {
        let classifier = Classifier::new(Mode::Date, Vec::new());
        let hour_ago = SystemTime::now() - Duration::from_secs(3600);
        let category = classifier.classify(&record("a.txt", 10, hour_ago));

        let modified: DateTime<Local> = hour_ago.into();
        assert!(category.name().starts_with(&format!(
            "{:04}-{:02}",
            modified.year(),
            modified.month()
        )));
        assert!(category.name().contains('('));
    }

    #[test]
    fn test_date_mode_future_timestamp_is_other() {
        let classifier = Classifier::new(Mode::Date, Vec::new());
        let future = SystemTime::now() + Duration::from_secs(86_400);

        assert_eq!(
            classifier.classify(&record("a.txt", 10, future)).name(),
            OTHER_CATEGORY
        );
    }

    #[test]
    fn test_classification_total_for_all_modes() {
        let now = SystemTime::now();
        let records = [
            record("a.txt", 10, now),
            record("weird", 0, now),
            record("huge.bin", 5 * GIB, now),
        ];

        for mode in [Mode::Type, Mode::Date, Mode::Size] {
            let classifier = Classifier::new(mode, default_categories());
            for rec in &records {
                let category = classifier.classify(rec);
                assert!(!category.name().is_empty());
            }
        }
    }
}
