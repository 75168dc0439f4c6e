//! Configuration loading and parsing.
//!
//! Parses `pagecraft.toml` (or an override path provided by the binary):
//!
//! ```toml
//! [history]
//! max_depth = 100          # 0 keeps every entry
//!
//! [keyboard]               # command name -> combos, replaces the defaults
//! delete = ["delete", "ctrl+d"]
//!
//! [container]
//! width = 800
//! height = 600
//! ```
//!
//! Every section is optional. Unknown fields are ignored so the file can
//! grow without breaking older builds. A file that fails to parse yields the
//! defaults and a warning.

use anyhow::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

pub const FILE_NAME: &str = "pagecraft.toml";

/// Smallest container edge accepted; anything below is clamped up.
pub const MIN_CONTAINER_EDGE: u32 = 1;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct HistorySection {
    #[serde(default)]
    pub max_depth: usize,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ContainerSection {
    #[serde(default = "ContainerSection::default_width")]
    pub width: u32,
    #[serde(default = "ContainerSection::default_height")]
    pub height: u32,
}

impl Default for ContainerSection {
    fn default() -> Self {
        Self {
            width: Self::default_width(),
            height: Self::default_height(),
        }
    }
}

impl ContainerSection {
    const fn default_width() -> u32 {
        800
    }
    const fn default_height() -> u32 {
        600
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(default)]
    pub history: HistorySection,
    /// Per-command keyboard overrides. An empty list unbinds the command.
    #[serde(default)]
    pub keyboard: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub container: ContainerSection,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,  // original file string (optional)
    pub file: ConfigFile,     // parsed (or default) data
    pub source: Option<PathBuf>,
}

/// Best-effort config path: `pagecraft.toml` in the working directory, then
/// the platform config dir (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("pagecraft").join(FILE_NAME);
    }
    PathBuf::from(FILE_NAME)
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        info!(target: "config", path = %path.display(), "config_missing_using_defaults");
        return Ok(Config::default());
    };
    match parse(&content) {
        Ok(file) => {
            info!(target: "config", path = %path.display(), overrides = file.keyboard.len(), max_depth = file.history.max_depth, "config_loaded");
            Ok(Config {
                raw: Some(content),
                file,
                source: Some(path),
            })
        }
        Err(err) => {
            warn!(target: "config", path = %path.display(), error = %err, "config_parse_failed_using_defaults");
            Ok(Config::default())
        }
    }
}

/// Parse config text without touching the filesystem.
pub fn parse(content: &str) -> Result<ConfigFile> {
    Ok(toml::from_str::<ConfigFile>(content)?)
}

impl Config {
    /// History depth bound; 0 means unlimited.
    pub fn history_max_depth(&self) -> usize {
        self.file.history.max_depth
    }

    /// Keyboard overrides in command-name order.
    pub fn keyboard_overrides(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.file
            .keyboard
            .iter()
            .map(|(name, combos)| (name.as_str(), combos.as_slice()))
    }

    /// Container size for new documents, with zero edges clamped.
    pub fn container_size(&self) -> (u32, u32) {
        let ContainerSection { width, height } = self.file.container;
        let clamped = (width.max(MIN_CONTAINER_EDGE), height.max(MIN_CONTAINER_EDGE));
        if clamped != (width, height) {
            info!(target: "config", width, height, clamped_width = clamped.0, clamped_height = clamped.1, "container_size_clamped");
        }
        clamped
    }
}
