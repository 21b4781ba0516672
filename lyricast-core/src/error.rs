use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it with your server address and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Push message errors
    #[error("Malformed server message: {0}")]
    MalformedMessage(#[from] serde_json::Error),

    // Display errors
    #[error("Display rendering failed: {reason}")]
    RenderError { reason: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
