//! Configuration for canvases and terminals

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::{Cell, Color};
use crate::parser::DEFAULT_MAX_SUBNEGOTIATION;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub canvas: CanvasConfig,
    pub terminal: TerminalConfig,
}

/// Initial canvas geometry and default style
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub columns: u16,
    pub rows: u16,
    pub foreground: Color,
    pub background: Color,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            columns: 80,
            rows: 25,
            foreground: Color::White,
            background: Color::Black,
        }
    }
}

impl CanvasConfig {
    /// Style of blank cells and of `reset_style`
    pub fn default_style(&self) -> Cell {
        Cell::EMPTY
            .with_foreground(self.foreground)
            .with_background(self.background)
    }
}

/// Per-connection protocol settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// Outbound queue size in bytes; writes that do not fit are dropped
    pub outbound_capacity: usize,
    /// Smallest canvas a NAWS report can produce
    pub min_columns: u16,
    pub min_rows: u16,
    /// Largest canvas a NAWS report can produce
    pub max_columns: u16,
    pub max_rows: u16,
    /// Longest sub-negotiation payload accepted from a client
    pub max_subnegotiation: usize,
    /// Queue the session-start option negotiation when a terminal is created
    pub negotiate_on_create: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            outbound_capacity: 4096,
            min_columns: 80,
            min_rows: 25,
            max_columns: 200,
            max_rows: 200,
            max_subnegotiation: DEFAULT_MAX_SUBNEGOTIATION,
            negotiate_on_create: false,
        }
    }
}

impl TerminalConfig {
    /// Clamp a reported window size to the configured bounds
    pub fn clamp_size(&self, width: u16, height: u16) -> (u16, u16) {
        (
            width.max(self.min_columns).min(self.max_columns),
            height.max(self.min_rows).min(self.max_rows),
        )
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from `~/.config/telnet-canvas/config.json`, falling back to the
    /// defaults when the file is missing or invalid
    pub fn load_or_default() -> Self {
        if let Some(config_dir) = config_dir() {
            let config_path = config_dir.join("config.json");
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), error = %e, "ignoring config file")
                    }
                }
            }
        }
        Self::default()
    }

    /// Reject settings no terminal can run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.terminal;
        if t.outbound_capacity == 0 {
            return Err(ConfigError::Invalid("outbound_capacity must be positive".into()));
        }
        if t.max_subnegotiation == 0 {
            return Err(ConfigError::Invalid("max_subnegotiation must be positive".into()));
        }
        if t.min_columns == 0 || t.min_rows == 0 {
            return Err(ConfigError::Invalid("minimum window size must be positive".into()));
        }
        if t.min_columns > t.max_columns || t.min_rows > t.max_rows {
            return Err(ConfigError::Invalid(format!(
                "minimum window size {}x{} exceeds maximum {}x{}",
                t.min_columns, t.min_rows, t.max_columns, t.max_rows
            )));
        }
        if self.canvas.columns == 0 || self.canvas.rows == 0 {
            return Err(ConfigError::Invalid("canvas size must be positive".into()));
        }
        Ok(())
    }
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config").join("telnet-canvas"))
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
