//! Configuration management for cbfmt.
//!
//! This module provides two records:
//! - [`Config`]: user-facing settings, loaded from TOML files (`cbfmt.toml`)
//!   and overridden by CLI arguments
//! - [`FormatOptions`]: the immutable snapshot a format call runs with,
//!   derived from a [`Config`] once its paths have been resolved
//!
//! Config files are auto-discovered by searching parent directories from the file
//! being formatted up to the filesystem root, plus the user's home directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ruleset::default_ruleset_filenames;

/// Config file names to search for (in order of priority, later overrides earlier)
const CONFIG_FILE_NAMES: &[&str] = &["cbfmt.toml"];

/// Placeholder for the workspace root, allowed at the start of `executable_path`
const WORKSPACE_PLACEHOLDER: &str = "{{workspaceFolder}}";

/// Get the user's home directory
fn dirs_home() -> Option<PathBuf> {
    // Try HOME environment variable first (works on Unix and some Windows setups)
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home));
    }
    // Fallback for Windows
    if let Ok(userprofile) = std::env::var("USERPROFILE") {
        return Some(PathBuf::from(userprofile));
    }
    None
}

fn default_executable_path() -> String {
    if cfg!(windows) {
        "phpcbf.bat".to_string()
    } else {
        "phpcbf".to_string()
    }
}

fn default_true() -> bool {
    true
}

/// Main configuration struct for cbfmt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Run phpcbf at all (default: true)
    #[serde(default = "default_true")]
    pub enable: bool,

    /// phpcbf executable. May start with `{{workspaceFolder}}` or `~/`
    #[serde(default = "default_executable_path")]
    pub executable_path: String,

    /// Standard passed as `--standard=<name>` (a name like `PSR12` or a ruleset path)
    #[serde(default)]
    pub standard: Option<String>,

    /// Verbose phpcbf output and command tracing (default: false)
    #[serde(default)]
    pub debug: bool,

    /// Look for a ruleset file next to the formatted file or in its ancestors (default: false)
    #[serde(default)]
    pub config_search: bool,

    /// Ruleset file names recognized by config search, in priority order
    #[serde(default = "default_ruleset_filenames")]
    pub config_filenames: Vec<String>,

    /// Format documents when they are saved (default: false)
    #[serde(default)]
    pub onsave: bool,
}

/// Partial configuration for TOML parsing
///
/// All fields are `Option<T>` so we can distinguish between
/// "explicitly set" and "not specified" when merging configs.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialConfig {
    pub enable: Option<bool>,
    pub executable_path: Option<String>,
    pub standard: Option<String>,
    pub debug: Option<bool>,
    pub config_search: Option<bool>,
    pub config_filenames: Option<Vec<String>>,
    pub onsave: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            enable: true,
            executable_path: default_executable_path(),
            standard: None,
            debug: false,
            config_search: false,
            config_filenames: default_ruleset_filenames(),
            onsave: false,
        }
    }
}

impl Config {
    /// Validate configuration values
    ///
    /// Returns an error message if validation fails, None if valid.
    #[must_use]
    pub fn validate(&self) -> Option<String> {
        if self.executable_path.trim().is_empty() {
            return Some("executable_path must not be empty".to_string());
        }
        if self.config_search && self.config_filenames.is_empty() {
            return Some("config_filenames must not be empty when config_search is on".to_string());
        }
        for name in &self.config_filenames {
            if name.is_empty() {
                return Some("config_filenames must not contain empty names".to_string());
            }
            if name.contains('/') || name.contains(std::path::MAIN_SEPARATOR) {
                return Some(format!(
                    "config_filenames entry {name:?} must be a file name, not a path"
                ));
            }
        }
        None
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let partial: PartialConfig = toml::from_str(&contents)?;
        let mut config = Self::default();
        config.apply_partial(partial);
        Ok(config)
    }

    /// Apply a partial config, only overriding fields that are explicitly set
    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(v) = partial.enable {
            self.enable = v;
        }
        if let Some(v) = partial.executable_path {
            self.executable_path = v;
        }
        if let Some(v) = partial.standard {
            self.standard = Some(v);
        }
        if let Some(v) = partial.debug {
            self.debug = v;
        }
        if let Some(v) = partial.config_search {
            self.config_search = v;
        }
        // The filename list is replaced as a whole, never merged
        if let Some(v) = partial.config_filenames {
            self.config_filenames = v;
        }
        if let Some(v) = partial.onsave {
            self.onsave = v;
        }
    }

    /// Discover config files from parent directories of a given path
    ///
    /// Searches from the file's directory up to the root, then adds home directory config.
    /// Returns list of config file paths in order of priority (least specific first).
    #[must_use]
    pub fn discover_config_files(start_path: &Path) -> Vec<PathBuf> {
        let mut config_files = Vec::new();

        // Add home directory config first (lowest priority)
        if let Some(home) = dirs_home() {
            for config_name in CONFIG_FILE_NAMES {
                let home_config = home.join(config_name);
                if home_config.is_file() {
                    config_files.push(home_config);
                }
            }
        }

        // Start from the file's parent directory (or the path itself if it's a directory)
        let start_dir = if start_path.is_dir() {
            Some(start_path.to_path_buf())
        } else {
            // Files, including ones that don't exist yet (stdin with --stdin-filename)
            start_path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .or_else(|| std::env::current_dir().ok())
        };

        // Collect config files from parent directories (from root to current)
        if let Some(dir) = start_dir {
            let mut ancestors: Vec<PathBuf> = dir.ancestors().map(Path::to_path_buf).collect();
            // Reverse so we go from root to current (less specific to more specific)
            ancestors.reverse();

            for ancestor in ancestors {
                for config_name in CONFIG_FILE_NAMES {
                    let config_path = ancestor.join(config_name);
                    if config_path.is_file() && !config_files.contains(&config_path) {
                        config_files.push(config_path);
                    }
                }
            }
        }

        config_files
    }

    /// Load and merge configuration from discovered config files
    ///
    /// Later files override earlier ones (only explicitly set values).
    /// Returns default config if no files found.
    #[must_use]
    pub fn from_discovered_files(start_path: &Path) -> Self {
        let mut config = Self::default();
        for path in &Self::discover_config_files(start_path) {
            match std::fs::read_to_string(path) {
                Ok(contents) => match toml::from_str::<PartialConfig>(&contents) {
                    Ok(partial) => config.apply_partial(partial),
                    Err(e) => log::warn!("failed to parse {}: {e}", path.display()),
                },
                Err(e) => log::warn!("failed to read {}: {e}", path.display()),
            }
        }
        config
    }

    /// Whether a save should trigger formatting.
    ///
    /// Only when `onsave` is set and the editor is not already formatting on
    /// save by itself, so a document is never formatted twice.
    #[must_use]
    pub fn formats_on_save(&self, editor_format_on_save: bool) -> bool {
        self.enable && self.onsave && !editor_format_on_save
    }

    /// Snapshot of the settings a format call needs
    #[must_use]
    pub fn format_options(&self, workspace: &Path) -> FormatOptions {
        FormatOptions {
            executable_path: resolve_executable_path(&self.executable_path, workspace),
            standard: self.standard.clone().filter(|s| !s.is_empty()),
            debug: self.debug,
            config_search: self.config_search,
            config_filenames: self.config_filenames.clone(),
        }
    }
}

/// Expand the `{{workspaceFolder}}` and `~/` prefixes of an executable path
#[must_use]
pub fn resolve_executable_path(raw: &str, workspace: &Path) -> PathBuf {
    if let Some(rest) = raw.strip_prefix(WORKSPACE_PLACEHOLDER) {
        let rest = rest.trim_start_matches(['/', '\\']);
        return workspace.join(rest);
    }

    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }

    PathBuf::from(raw)
}

/// Immutable settings for one format call.
///
/// A running call keeps the snapshot it started with; configuration reloads
/// replace the snapshot as a whole instead of mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Resolved path (or bare command name) of the phpcbf executable
    pub executable_path: PathBuf,
    /// Standard passed as `--standard=<name>`, if any
    pub standard: Option<String>,
    /// Verbose phpcbf output, command tracing and stream forwarding
    pub debug: bool,
    /// Look for the nearest ruleset file before formatting
    pub config_search: bool,
    /// Ruleset file names recognized by config search, in priority order
    pub config_filenames: Vec<String>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Config::default().format_options(Path::new(""))
    }
}
