//! dirsort - a directory organization engine
//!
//! This library classifies a directory's files into categories (by type,
//! modification date, or size), detects and removes duplicate content,
//! moves files safely into category subfolders, and reports aggregate
//! statistics. A watch mode keeps the process resident and organizes files
//! as they appear.

pub mod cli;
pub mod config;
pub mod dedupe;
pub mod engine;
pub mod file_category;
pub mod file_organizer;
pub mod hasher;
pub mod output;
pub mod watch;

pub use config::{CategoryRule, CompiledConfig, ConfigError, OrganizeConfig};
pub use dedupe::{DuplicateGroup, DuplicateResolver, Resolution};
pub use engine::{FileRecord, OrganizationEngine, OrganizeOptions, RunReport};
pub use file_category::{Category, Classifier, Mode};
pub use file_organizer::{MoveOperation, OrganizeError, Reorganizer};
pub use hasher::ContentHasher;
pub use watch::{DirectoryWatcher, WatchError, WatcherHandle};

pub use cli::{Cli, run_cli};
