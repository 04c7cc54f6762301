//! Host configuration
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. CLI arguments
//! 2. Environment variables (MICROHOST_HEAP_SIZE)
//! 3. Config file (--config, or ~/.config/microhost/config.toml)
//! 4. Default values
//! ```
//!
//! # Usage
//!
//! ```rust
//! use microhost::util::config::{load_config, HostConfig};
//!
//! let config = load_config(None).unwrap_or_default();
//! assert!(config.heap.size > 0);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Heap size the runtime gets when nothing else is configured (2 MiB)
pub const DEFAULT_HEAP_SIZE: usize = 2 * 1024 * 1024;

/// Environment variable overriding `[heap] size`
pub const HEAP_SIZE_ENV: &str = "MICROHOST_HEAP_SIZE";

/// Complete host configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HostConfig {
    /// Runtime heap settings
    #[serde(default)]
    pub heap: HeapConfig,
    /// Interactive prompt settings
    #[serde(default)]
    pub repl: ReplConfig,
    /// Module search path settings
    #[serde(default)]
    pub path: PathConfig,
}

/// Heap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeapConfig {
    /// Size in bytes of the single runtime heap
    #[serde(default = "default_heap_size")]
    pub size: usize,
}

fn default_heap_size() -> usize {
    DEFAULT_HEAP_SIZE
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_HEAP_SIZE,
        }
    }
}

/// REPL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Primary prompt
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Prompt shown while a statement is incomplete
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Print the version banner when the session starts
    #[serde(default = "default_banner")]
    pub banner: bool,
}

fn default_prompt() -> String {
    ">>> ".to_string()
}

fn default_continuation_prompt() -> String {
    "... ".to_string()
}

fn default_history_size() -> usize {
    1000
}

fn default_banner() -> bool {
    true
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
            history_file: None,
            history_size: default_history_size(),
            banner: true,
        }
    }
}

/// Module search path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Library directories appended after the script (or current) directory
    #[serde(default = "default_lib_dirs")]
    pub lib: Vec<PathBuf>,
}

fn default_lib_dirs() -> Vec<PathBuf> {
    match get_config_dir() {
        Some(dir) => vec![dir.join("lib")],
        None => vec![PathBuf::from("lib")],
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            lib: default_lib_dirs(),
        }
    }
}

impl HostConfig {
    /// Apply environment overrides on top of file/default values
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var(HEAP_SIZE_ENV) {
            self.heap.size = parse_size(&raw).ok_or(ConfigError::InvalidEnv {
                name: HEAP_SIZE_ENV,
                value: raw,
            })?;
        }
        Ok(())
    }
}

/// Parse a byte count, accepting `K`/`M` suffixes (`512K`, `2M`).
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let (digits, scale) = match raw.char_indices().last() {
        Some((i, 'k' | 'K')) => (&raw[..i], 1024),
        Some((i, 'm' | 'M')) => (&raw[..i], 1024 * 1024),
        _ => (raw, 1),
    };
    digits.parse::<usize>().ok()?.checked_mul(scale)
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join("microhost"));
    }

    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join("microhost"));
    }

    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join("microhost"));
    }

    None
}

/// Get the user config file path (~/.config/microhost/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Load configuration.
///
/// An explicit path must exist. Without one the user file is used when
/// present, otherwise defaults. Environment overrides are applied last.
pub fn load_config(explicit: Option<&Path>) -> Result<HostConfig, ConfigError> {
    let mut config = match explicit {
        Some(path) => load_file(path)?,
        None => match get_config_path() {
            Some(path) if path.exists() => load_file(&path)?,
            _ => HostConfig::default(),
        },
    };
    config.apply_env()?;
    Ok(config)
}

/// Parse one config file
pub fn load_file(path: &Path) -> Result<HostConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}
