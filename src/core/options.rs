use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Dispatcher settings. Every field has a default, so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Chat prefix that marks a message as a command.
    pub prefix: String,
    /// Prepended to failure messages shown to the caller ("§c" renders red).
    pub pre_error_text: String,
    pub show_errors: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
            pre_error_text: "\u{a7}c".to_string(),
            show_errors: true,
        }
    }
}

impl Options {
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid options JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read options {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// `<config_dir>/chatcmd/options.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chatcmd").join("options.json"))
    }

    /// Load the per-user options file when it exists, else defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}
