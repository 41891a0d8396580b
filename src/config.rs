//! Category and filtering configuration.
//!
//! Configuration is stored in TOML. The `[[categories]]` array supplies the
//! ordered rule list used by type-mode classification (first match wins), and
//! the `[filters]` table controls which files are considered at all:
//!
//! ```toml
//! [[categories]]
//! name = "Documents"
//! extensions = ["pdf", "txt", "md"]
//!
//! [[categories]]
//! name = "Images"
//! extensions = ["jpg", "png", "gif"]
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp"]
//! extensions = ["bak"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! An absent or empty `[[categories]]` section falls back to the built-in
//! default category set. Malformed category entries are dropped with a
//! warning instead of failing the run.

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern in the filter rules.
    InvalidGlobPattern(String),
    /// Invalid regex pattern with the compile error reason.
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// One ordered classification rule: a category name bound to the extensions
/// it claims. Extensions are matched case-insensitively and without the
/// leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub extensions: Vec<String>,
}

impl CategoryRule {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// Top-level configuration as deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeConfig {
    /// Ordered category rules for type-mode classification.
    #[serde(default)]
    pub categories: Vec<CategoryRule>,

    /// File filtering rules.
    #[serde(default)]
    pub filters: FilterRules,
}

/// Filter rules controlling which files are organized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    #[serde(default)]
    pub include: IncludeRules,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: false,
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude (e.g., "bak", "tmp").
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns to exclude, matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Whitelist rules that override exclusion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl OrganizeConfig {
    /// Load configuration, falling back through the usual locations:
    /// an explicitly given file, `.dirsortrc.toml` in the current directory,
    /// `~/.config/dirsort/config.toml`, and finally the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only when an explicitly provided file cannot be
    /// read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".dirsortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Validate and compile the configuration into the structures the engine
    /// uses: an ordered, normalized category rule list and pre-compiled
    /// filter matchers.
    ///
    /// Malformed category entries (empty name, no usable extensions) are
    /// dropped and reported through `CompiledConfig::warnings` rather than
    /// failing the run. Invalid glob or regex filter patterns are errors.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let mut warnings = Vec::new();
        let categories = normalize_categories(self.categories, &mut warnings);
        let filters = CompiledFilters::new(self.filters)?;

        Ok(CompiledConfig {
            categories,
            filters,
            warnings,
        })
    }
}

/// The built-in category set used when no configuration supplies one.
pub fn default_categories() -> Vec<CategoryRule> {
    vec![
        CategoryRule::new("Music", &["mp3", "wav", "aac", "flac", "ogg", "m4a"]),
        CategoryRule::new("Videos", &["mp4", "mkv", "mov", "avi", "wmv", "webm"]),
        CategoryRule::new(
            "Images",
            &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"],
        ),
        CategoryRule::new(
            "Documents",
            &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "rtf", "md",
            ],
        ),
        CategoryRule::new("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2"]),
        CategoryRule::new(
            "Scripts",
            &[
                "py", "js", "html", "css", "cpp", "c", "java", "sh", "php", "rb", "rs",
            ],
        ),
        CategoryRule::new("Executables", &["exe", "msi", "app", "dmg", "deb", "rpm"]),
        CategoryRule::new("Fonts", &["ttf", "otf", "woff", "woff2"]),
        CategoryRule::new("Ebooks", &["epub", "mobi", "azw3", "fb2"]),
    ]
}

/// Normalize user-supplied category rules: trim names, lowercase extensions,
/// strip leading dots, and drop unusable entries with a warning. An empty
/// result falls back to the built-in default set.
fn normalize_categories(rules: Vec<CategoryRule>, warnings: &mut Vec<String>) -> Vec<CategoryRule> {
    let mut normalized = Vec::with_capacity(rules.len());

    for rule in rules {
        let name = rule.name.trim();
        if name.is_empty() {
            warnings.push("Ignoring category with empty name".to_string());
            continue;
        }

        let extensions: Vec<String> = rule
            .extensions
            .iter()
            .filter_map(|ext| {
                let ext = ext.trim().trim_start_matches('.').to_lowercase();
                if ext.is_empty() { None } else { Some(ext) }
            })
            .collect();

        if extensions.is_empty() {
            warnings.push(format!("Ignoring category '{}' with no extensions", name));
            continue;
        }

        normalized.push(CategoryRule {
            name: name.to_string(),
            extensions,
        });
    }

    if normalized.is_empty() {
        default_categories()
    } else {
        normalized
    }
}

/// Validated, compiled configuration ready for a run.
pub struct CompiledConfig {
    /// Ordered category rules; never empty.
    pub categories: Vec<CategoryRule>,
    /// Pre-compiled filter matchers.
    pub filters: CompiledFilters,
    /// Non-fatal configuration problems to surface to the caller.
    pub warnings: Vec<String>,
}

impl CompiledConfig {
    /// Compile the built-in defaults. Cannot fail: the default filter set
    /// contains no patterns.
    pub fn defaults() -> Self {
        Self {
            categories: default_categories(),
            filters: CompiledFilters::empty(),
            warnings: Vec::new(),
        }
    }
}

/// Pre-compiled filter matchers, so each file check is a lookup rather than
/// a re-parse.
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn empty() -> Self {
        Self {
            enable_hidden_files: false,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Whether a file passes the filter rules and should be organized.
    ///
    /// Include (whitelist) patterns win over everything; then the hidden-file
    /// rule, exact filenames, extensions, glob patterns, and regexes are
    /// checked in that order.
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|p| p.matches_path(file_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = file_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|p| p.matches_path(file_path))
        {
            return false;
        }

        if self.exclude_regexes.iter().any(|r| r.is_match(&file_name)) {
            return false;
        }

        true
    }
}
