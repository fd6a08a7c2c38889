//! Configuration management for colmd.
//!
//! Parses `colmd.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ```toml
//! [parse]
//! gfm = true
//! region_tracking = "stack"   # or "single-slot"
//! ids = "uuid"                # or "sequential"
//!
//! [note]
//! background = "blue"
//! split = false
//! ```

use std::path::{Path, PathBuf};

use colmd_blocks::{IdStrategy, NoteProps};
use colmd_markdown::{MarkdownConverter, RegionTracking, note_background};
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override GFM extensions.
    pub gfm: Option<bool>,
    /// Override region nesting behaviour.
    pub region_tracking: Option<RegionTracking>,
    /// Override block id generation.
    pub ids: Option<IdStrategy>,
    /// Override note splitting.
    pub split: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "colmd.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown parsing configuration.
    pub parse: ParseConfig,
    /// Note configuration.
    pub note: NoteSettings,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown parsing configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Enable GFM tables, strikethrough and task lists.
    pub gfm: bool,
    /// How layout regions nest.
    pub region_tracking: RegionTracking,
    /// How block ids are generated.
    pub ids: IdStrategy,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            gfm: true,
            region_tracking: RegionTracking::default(),
            ids: IdStrategy::default(),
        }
    }
}

/// Note configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NoteSettings {
    /// Background colour of a single-note conversion.
    pub background: String,
    /// Split documents on `<!-- note:split -->` markers.
    pub split: bool,
}

impl Default for NoteSettings {
    fn default() -> Self {
        Self {
            background: "blue".to_owned(),
            split: false,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `colmd.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, or if reading,
    /// parsing or validation fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(gfm) = settings.gfm {
            self.parse.gfm = gfm;
        }
        if let Some(region_tracking) = settings.region_tracking {
            self.parse.region_tracking = region_tracking;
        }
        if let Some(ids) = settings.ids {
            self.parse.ids = ids;
        }
        if let Some(split) = settings.split {
            self.note.split = split;
        }
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.note.background, "note.background")
    }

    /// Build a converter from the parse and note settings.
    #[must_use]
    pub fn converter(&self) -> MarkdownConverter {
        MarkdownConverter::new()
            .with_gfm(self.parse.gfm)
            .with_region_tracking(self.parse.region_tracking)
            .with_id_strategy(self.parse.ids)
            .with_note_props(NoteProps {
                background: note_background(&self.note.background),
                ..NoteProps::default()
            })
    }
}
