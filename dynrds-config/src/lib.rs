//! Shared configuration loader for dynrds.
//!
//! `defaults/dynrds.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`DynRdsConfig`].
//!
//! Besides TOML files, the loader understands the plugin settings file written
//! by the host player UI: one `DynRDSKey = "value"` pair per line. Only the keys
//! that concern text generation and the engine are mapped; transmitter hardware
//! settings are left to the transmitter driver.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/dynrds.default.toml");

/// TOML file layered over the defaults when no file is named explicitly.
pub const CONFIG_FILE_NAME: &str = "dynrds.toml";

/// Name of the settings file the host player writes for this plugin.
pub const PLUGIN_FILE_NAME: &str = "plugin.Dynamic_RDS";

const DEFAULT_CONFIG_DIR: &str = "/home/fpp/media/config";

/// RadioText sizes a receiver can display.
pub const RT_SIZES: [usize; 2] = [32, 64];

/// Plugin setting keys and the configuration paths they override.
const PLUGIN_KEYS: &[(&str, &str)] = &[
    ("DynRDSEnableRDS", "rds.enabled"),
    ("DynRDSPSStyle", "rds.ps_style"),
    ("DynRDSPSUpdateRate", "rds.ps_update_rate"),
    ("DynRDSRTStyle", "rds.rt_style"),
    ("DynRDSRTUpdateRate", "rds.rt_update_rate"),
    ("DynRDSRTSize", "rds.rt_size"),
    ("DynRDSStart", "engine.start"),
    ("DynRDSStop", "engine.stop"),
    ("DynRDSEngineLogLevel", "engine.log_level"),
];

static PLUGIN_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*([A-Za-z0-9_]+)\s*=\s*(.*?)\s*$"#).unwrap());

/// Top-level configuration consumed by dynrds applications.
#[derive(Debug, Clone, Deserialize)]
pub struct DynRdsConfig {
    pub rds: RdsConfig,
    pub engine: EngineConfig,
}

/// Style strings and cadence for the two RDS text channels.
#[derive(Debug, Clone, Deserialize)]
pub struct RdsConfig {
    pub enabled: bool,
    /// Program Service style text (8 characters per screen).
    pub ps_style: String,
    /// Seconds between PS screens.
    pub ps_update_rate: u64,
    /// Sent when every PS group is omitted.
    pub ps_fallback: String,
    /// RadioText style text.
    pub rt_style: String,
    /// Seconds between RadioText lines.
    pub rt_update_rate: u64,
    pub rt_size: usize,
    pub rt_fallback: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub start: StartMode,
    pub stop: StopMode,
    pub log_level: String,
    pub fifo_path: String,
}

/// When the engine brings the transmitter up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartMode {
    #[serde(alias = "FPPDStart")]
    FppdStart,
    #[serde(alias = "PlaylistStart")]
    PlaylistStart,
}

/// When the engine takes the transmitter down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopMode {
    #[serde(alias = "Never")]
    Never,
    #[serde(alias = "PlaylistStop")]
    PlaylistStop,
}

/// The plugin settings file inside `dir`.
pub fn plugin_file_in(dir: impl AsRef<Path>) -> PathBuf {
    dir.as_ref().join(PLUGIN_FILE_NAME)
}

/// Where the host player keeps the plugin settings: `$CFGDIR`, or its stock
/// media config directory.
pub fn default_plugin_file() -> PathBuf {
    let dir = std::env::var_os("CFGDIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));
    plugin_file_in(dir)
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer the plugin settings file. Missing files trigger an error.
    pub fn with_plugin_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(path.display().to_string()),
            _ => ConfigError::Foreign(Box::new(e)),
        })?;
        self.with_plugin_settings(&content)
    }

    /// Layer the plugin settings file if it exists.
    pub fn with_optional_plugin_file(self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match self.clone().with_plugin_file(path) {
            Err(ConfigError::NotFound(_)) => Ok(self),
            other => other,
        }
    }

    /// Layer plugin settings already read into memory.
    pub fn with_plugin_settings(mut self, content: &str) -> Result<Self, ConfigError> {
        for (key, value) in parse_plugin_settings(content) {
            if let Some((_, path)) = PLUGIN_KEYS.iter().find(|(name, _)| *name == key) {
                self = self.set_override(path, value)?;
            }
        }
        Ok(self)
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<DynRdsConfig, ConfigError> {
        let config: DynRdsConfig = self.builder.build()?.try_deserialize()?;
        if !RT_SIZES.contains(&config.rds.rt_size) {
            return Err(ConfigError::Message(format!(
                "rds.rt_size must be one of {:?}, got {}",
                RT_SIZES, config.rds.rt_size
            )));
        }
        if config.rds.ps_update_rate == 0 || config.rds.rt_update_rate == 0 {
            return Err(ConfigError::Message(
                "update rates must be at least one second".to_string(),
            ));
        }
        Ok(config)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<DynRdsConfig, ConfigError> {
    Loader::new().build()
}

/// Split a plugin settings file into `(key, value)` pairs.
///
/// Surrounding double quotes are removed from values. Lines that are not
/// assignments are skipped.
pub fn parse_plugin_settings(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| PLUGIN_LINE.captures(line))
        .map(|caps| {
            let value = &caps[2];
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            (caps[1].to_string(), value.to_string())
        })
        .collect()
}
