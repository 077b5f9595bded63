//! User configuration
//!
//! # Config File Format (TOML)
//!
//! ```toml
//! big_endian = false
//! show_hex = true
//! log_level = "info"
//!
//! [date_format]
//! order = "ymd"      # mdy, dmy or ymd
//! separator = "-"
//! ```

use crate::datefmt::FormatSpec;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub big_endian: bool,
    pub show_hex: bool,
    pub log_level: String,
    pub date_format: FormatSpec,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            big_endian: false,
            show_hex: false,
            log_level: "warn".to_string(),
            date_format: FormatSpec::default(),
        }
    }
}

impl Config {
    /// Directories searched for `config.toml`, most specific first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(format!("{}/byteview", xdg)));
        }

        if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(format!("{}/.config/byteview", home)));
        }

        paths.push(PathBuf::from("/etc/byteview"));
        paths
    }

    /// Load from an explicit file, or the first config found on the search
    /// paths. No file at all means defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }

        for dir in Self::search_paths() {
            let path = dir.join(CONFIG_FILE);
            if path.is_file() {
                return Self::load_file(&path);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
