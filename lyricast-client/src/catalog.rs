//! HTTP catalog client for song lifecycle requests.
//!
//! Every operation is plain request/response against the song server; the
//! actual start of playback arrives separately as a `song_start` push. A
//! failed request leaves no client state behind - retry is manual.

use crate::error::{ClientError, Result};
use lyricast_core::protocol::WireCue;
use lyricast_core::ServerConfig;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// One song as listed by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct SongSummary {
    pub id: String,
    pub title: String,
    pub bpm: Option<f64>,
    /// Whether timecode generation has finished; unprocessed songs cannot
    /// be played yet.
    #[serde(default)]
    pub processed: bool,
}

/// Full song record including its stored timecodes.
#[derive(Debug, Clone, Deserialize)]
pub struct SongDetails {
    pub id: String,
    pub title: String,
    pub bpm: Option<f64>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub timecodes: Vec<WireCue>,
}

/// Server acknowledgement of a successful upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadReceipt {
    pub song_id: String,
    pub title: String,
}

/// Server acknowledgement of an external-source submission.
///
/// Ingestion runs asynchronously; completion is not pushed, so callers
/// should re-poll the song list after a delay.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestReceipt {
    pub song_id: String,
    #[serde(rename = "youtube_url")]
    pub source_url: String,
}

/// A song upload: the raw file plus optional timing hints for the server's
/// timecode generator.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub title: Option<String>,
    pub bpm: Option<f64>,
    pub measures_per_section: Option<u32>,
    pub beats_per_measure: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Ack {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Extract a user-facing failure reason from an error response body.
///
/// Prefers the server's `detail` string, falling back to the HTTP status.
fn failure_detail(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.detail)
        .unwrap_or_else(|| format!("server returned status {status}"))
}

/// Catalog client over the song server's HTTP API.
pub struct CatalogClient {
    client: ClientWithMiddleware,
    base_url: Url,
}

impl CatalogClient {
    /// Create a catalog client from the server configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the base
    /// URL does not parse.
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let base_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(Duration::from_secs(5))
            .user_agent("Lyricast/0.1")
            .build()?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let base_url = Url::parse(&config.base_url)?;

        Ok(Self { client, base_url })
    }

    /// Fetch the current song list.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] with the server's detail
    /// string when the request is rejected.
    pub async fn list_songs(&self) -> Result<Vec<SongSummary>> {
        let url = self.endpoint("/songs")?;
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        Self::expect_json("Listing songs", response).await
    }

    /// Fetch one song's record, including its stored timecodes.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] when the song does not exist.
    pub async fn song_details(&self, song_id: &str) -> Result<SongDetails> {
        let url = self.endpoint(&format!("/songs/{song_id}"))?;
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;
        Self::expect_json("Fetching song details", response).await
    }

    /// Upload a song file for processing.
    ///
    /// Optional form fields are only sent when present, matching what the
    /// server's timecode generator expects.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] with the server's detail
    /// string when the upload is rejected.
    pub async fn upload_song(&self, request: UploadRequest) -> Result<UploadReceipt> {
        let url = self.endpoint("/songs")?;
        info!("Uploading {} to {url}", request.file_name);

        let mut form = Form::new().part(
            "file",
            Part::bytes(request.bytes).file_name(request.file_name),
        );
        if let Some(title) = request.title {
            form = form.text("title", title);
        }
        if let Some(bpm) = request.bpm {
            form = form.text("bpm", bpm.to_string());
        }
        if let Some(measures) = request.measures_per_section {
            form = form.text("measures_per_section", measures.to_string());
        }
        if let Some(beats) = request.beats_per_measure {
            form = form.text("beats_per_measure", beats.to_string());
        }

        let response = self.client.post(url).multipart(form).send().await?;
        let receipt: UploadReceipt = Self::expect_json("Upload", response).await?;
        info!("Upload accepted: {} ({})", receipt.title, receipt.song_id);
        Ok(receipt)
    }

    /// Ask the server to start playback of a song.
    ///
    /// The response is only an acknowledgement; the actual `song_start`
    /// message arrives over the push connection.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] when the song is unknown or
    /// not yet processed for playback.
    pub async fn request_playback(&self, song_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("/play_song/{song_id}"))?;
        info!("POST {url}");
        let response = self.client.post(url).send().await?;
        let ack: Ack = Self::expect_json("Playback request", response).await?;
        debug!("Server acknowledged playback: {}", ack.message);
        Ok(())
    }

    /// Delete a song from the server.
    ///
    /// Callers should re-fetch the list afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] when the song does not exist.
    pub async fn delete_song(&self, song_id: &str) -> Result<()> {
        let url = self.endpoint(&format!("/songs/{song_id}"))?;
        info!("DELETE {url}");
        let response = self.client.delete(url).send().await?;
        let ack: Ack = Self::expect_json("Delete", response).await?;
        debug!("Server acknowledged delete: {}", ack.message);
        Ok(())
    }

    /// Submit an external source URL (e.g. a video link) for asynchronous
    /// ingestion.
    ///
    /// Completion is not pushed; re-poll the song list after a delay.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RequestFailed`] when the server rejects the
    /// submission.
    pub async fn submit_external_source(
        &self,
        source_url: &str,
        title: Option<&str>,
    ) -> Result<IngestReceipt> {
        let url = self.endpoint("/songs/from_youtube")?;
        info!("Submitting external source {source_url}");

        let mut form = Form::new().text("youtube_url", source_url.to_string());
        if let Some(title) = title {
            form = form.text("title", title.to_string());
        }

        let response = self.client.post(url).multipart(form).send().await?;
        let receipt: IngestReceipt = Self::expect_json("Ingestion submit", response).await?;
        info!("Ingestion initiated, tracking id {}", receipt.song_id);
        Ok(receipt)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn expect_json<T: DeserializeOwned>(
        operation: &'static str,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::RequestFailed {
            operation,
            detail: failure_detail(status, &body),
        })
    }
}
