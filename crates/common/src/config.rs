//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{DevcamError, DevcamResult};

/// Global application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Streaming service behavior.
    pub service: ServiceDefaults,

    /// Synthetic camera and encoder used by the CLI and tests.
    pub synthetic: SyntheticDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Streaming service parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDefaults {
    /// Delay before the notification icon settles on its steady-state frame.
    pub notification_settle_ms: u64,

    /// Video nodes the pipeline must never claim.
    pub ignored_nodes: Vec<String>,

    /// Preview bound used while no webcam stream constrains geometry.
    pub max_preview_width: u32,
    pub max_preview_height: u32,
}

/// Synthetic device parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticDefaults {
    /// Camera buffers in circulation.
    pub buffer_count: usize,

    /// Simulated encode time per frame.
    pub encode_latency_ms: u64,

    /// Encoder queue depth before frames are rejected.
    pub encoder_queue_depth: usize,

    /// Lenses exposed by the synthetic camera ("back", "front").
    pub lenses: Vec<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "devcam_capture_engine=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ServiceDefaults {
    fn default() -> Self {
        Self {
            notification_settle_ms: 500,
            ignored_nodes: Vec::new(),
            max_preview_width: 1920,
            max_preview_height: 1080,
        }
    }
}

impl Default for SyntheticDefaults {
    fn default() -> Self {
        Self {
            buffer_count: 4,
            encode_latency_ms: 5,
            encoder_queue_depth: 2,
            lenses: vec!["back".to_string(), "front".to_string()],
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
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(DevcamError::ConfigNotFound { .. }) => Self::default(),
            Err(e) => {
                tracing::warn!("Failed to load config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &std::path::Path) -> DevcamResult<Self> {
        if !path.exists() {
            return Err(DevcamError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
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

    /// Reject values the service cannot run with.
    pub fn validate(&self) -> DevcamResult<()> {
        if self.service.max_preview_width == 0 || self.service.max_preview_height == 0 {
            return Err(DevcamError::config("preview bound must be non-zero"));
        }
        if self.synthetic.buffer_count == 0 {
            return Err(DevcamError::config("synthetic buffer_count must be at least 1"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("devcam").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_streaming_contract() {
        let config = AppConfig::default();
        assert_eq!(config.service.notification_settle_ms, 500);
        assert_eq!(config.service.max_preview_width, 1920);
        assert_eq!(config.service.max_preview_height, 1080);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"service":{"ignored_nodes":["/dev/video3"]}}"#).unwrap();
        assert_eq!(config.service.ignored_nodes, vec!["/dev/video3".to_string()]);
        assert_eq!(config.service.notification_settle_ms, 500);
        assert_eq!(config.synthetic.buffer_count, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_buffers_rejected() {
        let mut config = AppConfig::default();
        config.synthetic.buffer_count = 0;
        assert!(matches!(
            config.validate(),
            Err(DevcamError::Config { .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = std::env::temp_dir().join("devcam-missing-config-test.json");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(DevcamError::ConfigNotFound { .. })
        ));
    }
}
