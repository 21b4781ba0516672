//! WebSocket push listener feeding server messages into the engine.

use crate::error::Result;
use futures::StreamExt;
use lyricast_core::{LyricEngine, ServerMessage};
use std::sync::Arc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Listens on the persistent server connection and dispatches each push
/// message to the [`LyricEngine`].
///
/// Reconnection is not attempted here: on close or error the engine is told
/// to disconnect (cancelling any pending tick) and the listener task ends.
pub struct PushListener {
    engine: Arc<LyricEngine>,
    ws_url: String,
    cancel_token: CancellationToken,
}

impl PushListener {
    /// Create a new push listener.
    ///
    /// # Arguments
    /// * `engine` - Engine that receives every parsed server message
    /// * `ws_url` - WebSocket endpoint of the song server
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        engine: Arc<LyricEngine>,
        ws_url: impl Into<String>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        Self {
            engine,
            ws_url: ws_url.into(),
            cancel_token: cancel_token.unwrap_or_default(),
        }
    }

    /// Get a clone of the cancellation token
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Start listening in a background task
    #[must_use]
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.run().await {
                error!("Push listener stopped with error: {e}");
            }
        })
    }

    /// Connect and run the receive loop until cancelled or disconnected.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial connection fails.
    pub async fn run(&self) -> Result<()> {
        info!("Connecting to {}", self.ws_url);
        let (stream, _response) = connect_async(self.ws_url.as_str()).await?;
        info!("Server connection established");

        let (_write, mut read) = stream.split();

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!("Push listener shutting down");
                    break;
                }
                frame = read.next() => {
                    match frame {
                        Some(Ok(Message::Text(raw))) => self.dispatch(&raw).await,
                        Some(Ok(Message::Close(_))) | None => {
                            info!("Server closed the connection");
                            self.engine.handle_disconnect().await;
                            break;
                        }
                        Some(Ok(other)) => {
                            debug!("Ignoring non-text frame: {other:?}");
                        }
                        Some(Err(e)) => {
                            warn!("Server connection error: {e}");
                            self.engine.handle_disconnect().await;
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse one text frame and hand it to the engine.
    ///
    /// Malformed frames are logged and dropped without touching any state.
    async fn dispatch(&self, raw: &str) {
        match ServerMessage::parse(raw) {
            Ok(message) => self.engine.handle_message(message).await,
            Err(e) => warn!("Dropping malformed server message: {e}"),
        }
    }
}
