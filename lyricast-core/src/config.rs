use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the song server's HTTP API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the push-message WebSocket endpoint.
    #[serde(default = "default_ws_path")]
    pub ws_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// How long to wait before re-polling the list after submitting an
    /// external source for ingestion.
    #[serde(default = "default_ingest_poll_delay")]
    pub ingest_poll_delay_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

const fn default_request_timeout() -> u64 {
    10
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_ingest_poll_delay() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ws_path: default_ws_path(),
            request_timeout_secs: default_request_timeout(),
            max_retries: default_max_retries(),
            ingest_poll_delay_secs: default_ingest_poll_delay(),
        }
    }
}

impl ServerConfig {
    /// The WebSocket URL derived from the HTTP base URL.
    #[must_use]
    pub fn ws_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{base}")
        };
        format!("{ws_base}{}", self.ws_path)
    }

    /// HTTP request timeout as a [`Duration`].
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Ingestion re-poll delay as a [`Duration`].
    #[must_use]
    pub const fn ingest_poll_delay(&self) -> Duration {
        Duration::from_secs(self.ingest_poll_delay_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Refresh cadence of the lyric display.
    #[serde(default = "default_frame_interval")]
    pub frame_interval_ms: u64,
    /// Seek step for the terminal progress control.
    #[serde(default = "default_seek_step")]
    pub seek_step_secs: u64,
}

const fn default_frame_interval() -> u64 {
    16
}

const fn default_seek_step() -> u64 {
    5
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval(),
            seek_step_secs: default_seek_step(),
        }
    }
}

impl PlaybackConfig {
    /// Frame interval as a [`Duration`].
    #[must_use]
    pub const fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    /// Seek step as a [`Duration`].
    #[must_use]
    pub const fn seek_step(&self) -> Duration {
        Duration::from_secs(self.seek_step_secs)
    }
}

impl Config {
    /// Get the configuration directory path (~/.config/lyricast/)
    #[must_use]
    pub fn config_dir() -> PathBuf {
        crate::paths::config_dir()
    }

    /// Get the config file path (~/.config/lyricast/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from file or create template on first run
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// it did not exist yet (a template is written in that case).
    pub fn load_or_create() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            fs::write(&config_path, CONFIG_TEMPLATE)?;

            return Err(CoreError::ConfigNotFound { path: config_path });
        }

        let content = fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;

        if config.server.base_url.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "server.base_url must not be empty".to_string(),
            });
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            playback: PlaybackConfig::default(),
        }
    }
}

const CONFIG_TEMPLATE: &str = r#"# Lyricast Configuration
# ~/.config/lyricast/config.toml

[server]
# Base URL of the song server's HTTP API
base_url = "http://localhost:8000"
# Path of the push-message WebSocket endpoint
ws_path = "/ws"
request_timeout_secs = 10
max_retries = 3
# Delay before re-polling the song list after submitting an external source
ingest_poll_delay_secs = 5

[playback]
# Refresh cadence of the lyric display, in milliseconds
frame_interval_ms = 16
# Seek step of the progress control, in seconds
seek_step_secs = 5
"#;
