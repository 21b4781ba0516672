use thiserror::Error;

/// Unified error type for all server-port operations.
///
/// This consolidates errors from the HTTP catalog client and the WebSocket
/// push listener into a single error type owned by the client crate.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A catalog request was rejected by the server. `detail` carries the
    /// server-provided reason when the body parsed, otherwise a generic
    /// fallback with the HTTP status.
    #[error("{operation} failed: {detail}")]
    RequestFailed {
        operation: &'static str,
        detail: String,
    },

    /// Error from the retrying HTTP middleware stack.
    #[error("Network request failed: {0}")]
    Middleware(#[from] reqwest_middleware::Error),

    /// Error from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured server URL does not parse.
    #[error("Invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    /// Error on the push-message WebSocket connection.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Failed to parse or serialize JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read a file for upload or perform I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results with `ClientError`.
pub type Result<T> = std::result::Result<T, ClientError>;
