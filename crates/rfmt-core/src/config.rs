//! Formatter configuration, read from `rfmt.toml`
//!
//! ```toml
//! indent_width = 2
//! line_width = 80
//! max_blank_lines = 1
//! wrap_long_lines = true
//! ```
//!
//! Missing keys take their defaults; unknown keys are rejected so typos
//! surface instead of being silently ignored.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// File name searched for by [`FormatConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "rfmt.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatConfig {
    /// Spaces per indentation level
    pub indent_width: usize,
    /// Lines longer than this are wrapped at argument commas
    pub line_width: usize,
    /// Longest run of blank lines kept
    pub max_blank_lines: usize,
    pub wrap_long_lines: bool,
}

impl Default for FormatConfig {
    fn default() -> Self {
        FormatConfig {
            indent_width: 2,
            line_width: 80,
            max_blank_lines: 1,
            wrap_long_lines: true,
        }
    }
}

impl FormatConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: FormatConfig =
            toml::from_str(text).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("cannot read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded config");
        Self::from_toml_str(&text)
    }

    /// Find `rfmt.toml` in `dir` or its closest ancestor
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        dir.ancestors()
            .map(|d| d.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Load the discovered configuration, or defaults when there is none
    pub fn discover_or_default(dir: &Path) -> Result<Self> {
        match Self::discover(dir) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=8).contains(&self.indent_width) {
            return Err(Error::ConfigError(format!(
                "indent_width must be between 1 and 8, got {}",
                self.indent_width
            )));
        }
        if self.line_width < 20 {
            return Err(Error::ConfigError(format!(
                "line_width must be at least 20, got {}",
                self.line_width
            )));
        }
        Ok(())
    }
}
