//! Duplicate detection over scanned file records.
//!
//! Records are grouped by size first; fingerprints are computed only inside
//! size-collision groups, so unique-sized files are never hashed. Within a
//! fingerprint group the survivor is chosen deterministically: earliest
//! modification time, ties broken by lexicographically smallest path.
//! Repeated runs over the same file set always keep the same file.

use crate::engine::FileRecord;
use crate::hasher::{ContentHasher, Fingerprint};
use std::collections::HashMap;
use std::path::PathBuf;

/// Files sharing identical size and content fingerprint.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub fingerprint: Fingerprint,
    /// The member kept on disk.
    pub keep: FileRecord,
    /// Members flagged for removal.
    pub duplicates: Vec<FileRecord>,
}

/// Outcome of duplicate resolution.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Groups with at least one flagged duplicate.
    pub groups: Vec<DuplicateGroup>,
    /// Files that could not be hashed, with the failure reason. These are
    /// excluded from their group, never silently dropped.
    pub skipped: Vec<(PathBuf, String)>,
}

impl Resolution {
    /// Total number of files flagged for removal.
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(|g| g.duplicates.len()).sum()
    }
}

/// Groups records by content and picks survivors.
pub struct DuplicateResolver;

impl DuplicateResolver {
    /// Resolve duplicates among the given records.
    ///
    /// Groups of size one produce no flags. Output group order is sorted by
    /// the survivor's path so reports are stable across runs.
    pub fn resolve(records: &[FileRecord]) -> Resolution {
        let mut resolution = Resolution::default();

        let mut by_size: HashMap<u64, Vec<&FileRecord>> = HashMap::new();
        for record in records {
            by_size.entry(record.size).or_default().push(record);
        }

        let mut by_fingerprint: HashMap<(u64, Fingerprint), Vec<&FileRecord>> = HashMap::new();
        for (size, candidates) in by_size {
            if candidates.len() < 2 {
                continue;
            }
            for record in candidates {
                match ContentHasher::fingerprint(&record.path) {
                    Ok(fingerprint) => {
                        by_fingerprint
                            .entry((size, fingerprint))
                            .or_default()
                            .push(record);
                    }
                    Err(e) => {
                        resolution
                            .skipped
                            .push((record.path.clone(), e.to_string()));
                    }
                }
            }
        }

        for ((_, fingerprint), mut members) in by_fingerprint {
            if members.len() < 2 {
                continue;
            }
            members.sort_by(|a, b| {
                a.modified
                    .cmp(&b.modified)
                    .then_with(|| a.path.cmp(&b.path))
            });

            let keep = members[0].clone();
            let duplicates = members[1..].iter().map(|r| (*r).clone()).collect();
            resolution.groups.push(DuplicateGroup {
                fingerprint,
                keep,
                duplicates,
            });
        }

        resolution.groups.sort_by(|a, b| a.keep.path.cmp(&b.keep.path));
        resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn record_for(path: &Path, modified: SystemTime) -> FileRecord {
        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        FileRecord {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            size,
            modified,
            extension: None,
            sniffed_extension: None,
        }
    }

    #[test]
    fn test_no_duplicates_in_distinct_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"alpha").unwrap();
        fs::write(&b, b"bravo-longer").unwrap();

        let now = SystemTime::now();
        let records = vec![record_for(&a, now), record_for(&b, now)];
        let resolution = DuplicateResolver::resolve(&records);

        assert!(resolution.groups.is_empty());
        assert_eq!(resolution.duplicate_count(), 0);
    }

    #[test]
    fn test_same_size_different_content_not_duplicates() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"aaaaa").unwrap();
        fs::write(&b, b"bbbbb").unwrap();

        let now = SystemTime::now();
        let records = vec![record_for(&a, now), record_for(&b, now)];
        let resolution = DuplicateResolver::resolve(&records);

        assert!(resolution.groups.is_empty());
    }

    #[test]
    fn test_identical_files_grouped_keep_earliest_mtime() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let older = temp_dir.path().join("z_older.txt");
        let newer = temp_dir.path().join("a_newer.txt");
        fs::write(&older, b"same content").unwrap();
        fs::write(&newer, b"same content").unwrap();

        let base = SystemTime::now();
        let records = vec![
            record_for(&newer, base + Duration::from_secs(60)),
            record_for(&older, base),
        ];
        let resolution = DuplicateResolver::resolve(&records);

        assert_eq!(resolution.groups.len(), 1);
        let group = &resolution.groups[0];
        assert_eq!(group.keep.path, older);
        assert_eq!(group.duplicates.len(), 1);
        assert_eq!(group.duplicates[0].path, newer);
    }

    #[test]
    fn test_mtime_tie_broken_by_path() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"same content").unwrap();
        fs::write(&b, b"same content").unwrap();

        let same_time = SystemTime::now();
        let records = vec![record_for(&b, same_time), record_for(&a, same_time)];
        let resolution = DuplicateResolver::resolve(&records);

        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.groups[0].keep.path, a);
    }

    #[test]
    fn test_resolve_is_deterministic_across_runs() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        let c = temp_dir.path().join("c.txt");
        fs::write(&a, b"dup").unwrap();
        fs::write(&b, b"dup").unwrap();
        fs::write(&c, b"dup").unwrap();

        let base = SystemTime::now();
        let records = vec![
            record_for(&c, base + Duration::from_secs(10)),
            record_for(&a, base + Duration::from_secs(5)),
            record_for(&b, base),
        ];

        let first = DuplicateResolver::resolve(&records);
        let second = DuplicateResolver::resolve(&records);

        assert_eq!(first.groups.len(), 1);
        assert_eq!(first.groups[0].keep.path, second.groups[0].keep.path);
        assert_eq!(first.groups[0].keep.path, b);
        assert_eq!(first.duplicate_count(), 2);
    }

    #[test]
    fn test_unreadable_file_reported_as_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.txt");
        let b = temp_dir.path().join("b.txt");
        fs::write(&a, b"same size!").unwrap();
        fs::write(&b, b"same size!").unwrap();

        let now = SystemTime::now();
        let mut ghost = record_for(&a, now);
        ghost.path = temp_dir.path().join("ghost.txt");
        // Same recorded size as a and b, but nothing on disk: hashing fails.
        let records = vec![record_for(&a, now), record_for(&b, now), ghost];
        let resolution = DuplicateResolver::resolve(&records);

        assert_eq!(resolution.skipped.len(), 1);
        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.duplicate_count(), 1);
    }
}
