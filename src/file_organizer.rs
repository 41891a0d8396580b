//! Safe file reorganization: planning and executing moves into category
//! directories.
//!
//! Moves are planned first (one [`MoveOperation`] per record) and executed
//! per file. Execution prefers `rename`; when that fails (typically a
//! cross-filesystem move) it falls back to copy, verifies the copied size,
//! and only then deletes the source. Destination name collisions are
//! resolved by appending a numeric suffix before the extension, so no file
//! is ever overwritten.

use crate::engine::FileRecord;
use crate::file_category::Category;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Errors raised by organization operations.
#[derive(Debug)]
pub enum OrganizeError {
    /// The root path is missing or not a directory. The only fatal error:
    /// it aborts the whole run.
    InvalidRoot { path: PathBuf, source: io::Error },
    /// Failed to create a category directory.
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its destination.
    FileMoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// A file could not be read or statted (permissions change, deletion
    /// race). Recorded per file; never aborts the batch.
    UnreadableFile { path: PathBuf, source: io::Error },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRoot { path, source } => {
                write!(f, "Invalid root directory {}: {}", path.display(), source)
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create directory {}: {}",
                    path.display(),
                    source
                )
            }
            Self::FileMoveFailed { from, to, source } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::UnreadableFile { path, source } => {
                write!(f, "Failed to read {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// A planned move of one file into its category directory.
///
/// The destination recorded here is the preferred one; execution resolves
/// name collisions at the moment the move happens and returns the final
/// path. An operation is executed at most once.
#[derive(Debug, Clone)]
pub struct MoveOperation {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub record: FileRecord,
}

/// Plans and executes moves into category subdirectories.
pub struct Reorganizer;

impl Reorganizer {
    /// Plan one move per record: `<root>/<category>/<name>`.
    ///
    /// Records already inside their destination category directory produce
    /// no operation, so re-running over an organized directory is a no-op
    /// for those files.
    pub fn plan(root: &Path, assignments: &[(FileRecord, Category)]) -> Vec<MoveOperation> {
        let mut operations = Vec::with_capacity(assignments.len());

        for (record, category) in assignments {
            let dest_dir = root.join(category.name());
            if record.path.parent() == Some(dest_dir.as_path()) {
                continue;
            }

            operations.push(MoveOperation {
                source: record.path.clone(),
                destination: dest_dir.join(&record.name),
                record: record.clone(),
            });
        }

        operations
    }

    /// Execute a single planned move and return the final destination path.
    ///
    /// Creates the category directory if needed, resolves destination-name
    /// collisions by suffixing, and renames. If the rename fails the move is
    /// retried as copy + size verification + source delete; the source is
    /// never deleted before the copy has been verified.
    pub fn execute(operation: &MoveOperation) -> OrganizeResult<PathBuf> {
        let dest_dir = operation
            .destination
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        if !dest_dir.exists() {
            fs::create_dir_all(&dest_dir).map_err(|e| OrganizeError::DirectoryCreationFailed {
                path: dest_dir.clone(),
                source: e,
            })?;
        }

        let destination = resolve_collision(&operation.destination);

        match fs::rename(&operation.source, &destination) {
            Ok(()) => Ok(destination),
            Err(_) => Self::copy_verify_delete(operation, &destination),
        }
    }

    /// Fallback for when rename fails, which covers cross-device moves.
    /// Any genuine failure (source vanished, permissions) resurfaces from
    /// the copy itself.
    fn copy_verify_delete(operation: &MoveOperation, destination: &Path) -> OrganizeResult<PathBuf> {
        let move_error = |source: io::Error| OrganizeError::FileMoveFailed {
            from: operation.source.clone(),
            to: destination.to_path_buf(),
            source,
        };

        let copied = match fs::copy(&operation.source, destination) {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = fs::remove_file(destination);
                return Err(move_error(e));
            }
        };

        let source_len = fs::metadata(&operation.source)
            .map(|m| m.len())
            .map_err(|e| move_error(e))?;

        if copied != source_len {
            let _ = fs::remove_file(destination);
            return Err(move_error(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("copy size mismatch: {} of {} bytes", copied, source_len),
            )));
        }

        fs::remove_file(&operation.source).map_err(move_error)?;
        Ok(destination.to_path_buf())
    }
}

/// Return a destination path that does not exist yet, appending `_1`, `_2`,
/// ... before the extension as needed.
fn resolve_collision(destination: &Path) -> PathBuf {
    if !destination.exists() {
        return destination.to_path_buf();
    }

    let parent = destination.parent().unwrap_or(Path::new(""));
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let extension = destination
        .extension()
        .map(|e| e.to_string_lossy().to_string());

    let mut counter = 1;
    loop {
        let candidate_name = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = parent.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}
