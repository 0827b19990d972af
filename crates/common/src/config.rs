//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AuricleError, AuricleResult};

/// Lowest audio bitrate offered to the user, in kbps.
pub const MIN_AUDIO_BITRATE_KBPS: u32 = 128;

/// Highest audio bitrate offered to the user, in kbps.
pub const MAX_AUDIO_BITRATE_KBPS: u32 = 512;

/// Bitrate used when nothing else is configured, in kbps.
pub const DEFAULT_AUDIO_BITRATE_KBPS: u32 = 384;

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default render settings.
    #[serde(default)]
    pub render: RenderDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default render parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Directory rendered videos are written to when none is given.
    pub output_dir: Option<PathBuf>,

    /// Audio bitrate in kbps.
    pub audio_bitrate_kbps: u32,

    /// Template used to compute each output file name.
    pub name_template: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "auricle=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            output_dir: None,
            audio_bitrate_kbps: DEFAULT_AUDIO_BITRATE_KBPS,
            name_template: "@{name}".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Ignoring config at {:?}: {}", config_path, e),
            }
        }
        Self::default()
    }

    /// Read and parse the config file at `path`.
    pub fn load_from(path: &Path) -> AuricleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| AuricleError::config(format!("{}: {e}", path.display())))
    }

    /// Parse a JSON config document.
    pub fn parse(content: &str) -> AuricleResult<Self> {
        serde_json::from_str(content).map_err(|e| AuricleError::config(e.to_string()))
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let config_path = config_file_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Clamp a user-chosen bitrate into the supported range.
pub fn clamp_audio_bitrate_kbps(kbps: u32) -> u32 {
    kbps.clamp(MIN_AUDIO_BITRATE_KBPS, MAX_AUDIO_BITRATE_KBPS)
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("auricle").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitrate_clamp() {
        assert_eq!(clamp_audio_bitrate_kbps(64), 128);
        assert_eq!(clamp_audio_bitrate_kbps(256), 256);
        assert_eq!(clamp_audio_bitrate_kbps(1024), 512);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config =
            AppConfig::parse(r#"{"logging":{"level":"debug","json":true,"file":null}}"#).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.render.audio_bitrate_kbps, DEFAULT_AUDIO_BITRATE_KBPS);
        assert_eq!(config.render.name_template, "@{name}");
    }

    #[test]
    fn test_partial_render_section() {
        let config: AppConfig =
            serde_json::from_str(r#"{"render":{"audio_bitrate_kbps":256}}"#).unwrap();
        assert_eq!(config.render.audio_bitrate_kbps, 256);
        assert_eq!(config.render.name_template, "@{name}");
        assert!(config.render.output_dir.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        let err = AppConfig::parse(r#"{"render":{"audio_bitrate_kbps":"loud"}}"#).unwrap_err();
        assert!(matches!(err, AuricleError::Config { .. }));
        assert!(err.to_string().starts_with("Configuration error:"));
    }

    #[test]
    fn test_load_from_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));

        std::fs::write(&path, r#"{"render":{"name_template":"@{title}"}}"#).unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.render.name_template, "@{title}");
    }
}
