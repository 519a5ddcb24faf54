//! Jukebox HTTP service client.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::models::*;

/// API client errors.
#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server responded with HTTP {0}")]
    Http(StatusCode),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Server returned failed status: {message}")]
    ServerError { message: String },
}

/// The remote playback service, as seen by the client.
///
/// Every method performs exactly one request. Futures are boxed and `Send` so
/// requests can run on spawned tasks.
pub trait PlaybackService: Send + Sync {
    /// Start playing the track identified by `rel`.
    fn play<'a>(&'a self, rel: &'a str) -> BoxFuture<'a, Result<(), ApiClientError>>;

    fn previous(&self) -> BoxFuture<'_, Result<(), ApiClientError>>;

    fn next(&self) -> BoxFuture<'_, Result<(), ApiClientError>>;

    /// Toggle shuffle, returning the new state.
    fn shuffle(&self) -> BoxFuture<'_, Result<bool, ApiClientError>>;

    fn set_volume(&self, value: u8) -> BoxFuture<'_, Result<(), ApiClientError>>;

    /// Read the current volume.
    fn volume(&self) -> BoxFuture<'_, Result<u8, ApiClientError>>;

    /// Fetch the authoritative playback state.
    fn status(&self) -> BoxFuture<'_, Result<PlaybackStatus, ApiClientError>>;

    /// Fetch the library tree.
    fn tree(&self) -> BoxFuture<'_, Result<TreeNode, ApiClientError>>;
}

/// reqwest-backed client for the jukebox service.
#[derive(Debug, Clone)]
pub struct JukeboxClient {
    /// HTTP client
    client: Client,

    /// Base server URL
    base_url: String,
}

impl JukeboxClient {
    /// Create a new API client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("jukebox-tui/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// POST a form-encoded body to an endpoint.
    async fn post_form<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ApiClientError> {
        let response = self
            .client
            .post(self.url(endpoint))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form_body(params))
            .send()
            .await?;

        Self::parse(response).await
    }

    /// GET an endpoint.
    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiClientError> {
        let response = self.client.get(self.url(endpoint)).send().await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiClientError> {
        let http_status = response.status();
        let text = response.text().await?;
        decode_response(http_status, &text)
    }
}

/// Encode key/value pairs as an `application/x-www-form-urlencoded` body.
pub fn form_body(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Decode a service reply body, mapping error envelopes to `ApiClientError`.
pub fn decode_response<T: DeserializeOwned>(
    http_status: StatusCode,
    text: &str,
) -> Result<T, ApiClientError> {
    let parsed: ServiceResponse<T> = match serde_json::from_str(text) {
        Ok(parsed) => parsed,
        Err(e) if http_status.is_success() => {
            return Err(ApiClientError::InvalidResponse(format!(
                "Failed to parse response: {}. Body: {}",
                e,
                truncate_body(text)
            )));
        }
        Err(_) => return Err(ApiClientError::Http(http_status)),
    };

    if !parsed.is_ok() {
        return Err(ApiClientError::ServerError {
            message: parsed
                .error
                .unwrap_or_else(|| format!("status {}", parsed.status)),
        });
    }

    if !http_status.is_success() {
        return Err(ApiClientError::Http(http_status));
    }

    parsed
        .data
        .ok_or_else(|| ApiClientError::InvalidResponse(String::from("Missing response data")))
}

fn truncate_body(text: &str) -> &str {
    match text.char_indices().nth(500) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

impl PlaybackService for JukeboxClient {
    fn play<'a>(&'a self, rel: &'a str) -> BoxFuture<'a, Result<(), ApiClientError>> {
        async move {
            let _: Ack = self.post_form("play", &[("path", rel)]).await?;
            Ok(())
        }
        .boxed()
    }

    fn previous(&self) -> BoxFuture<'_, Result<(), ApiClientError>> {
        async move {
            let _: Ack = self.post_form("prev", &[]).await?;
            Ok(())
        }
        .boxed()
    }

    fn next(&self) -> BoxFuture<'_, Result<(), ApiClientError>> {
        async move {
            let _: Ack = self.post_form("next", &[]).await?;
            Ok(())
        }
        .boxed()
    }

    fn shuffle(&self) -> BoxFuture<'_, Result<bool, ApiClientError>> {
        async move {
            let response: ShuffleResponse = self.post_form("shuffle", &[]).await?;
            Ok(response.shuffle)
        }
        .boxed()
    }

    fn set_volume(&self, value: u8) -> BoxFuture<'_, Result<(), ApiClientError>> {
        async move {
            let value = value.min(100).to_string();
            let _: Ack = self.post_form("volume", &[("value", value.as_str())]).await?;
            Ok(())
        }
        .boxed()
    }

    fn volume(&self) -> BoxFuture<'_, Result<u8, ApiClientError>> {
        async move {
            let response: VolumeResponse = self.post_form("volume", &[]).await?;
            Ok(volume_percent(response.volume))
        }
        .boxed()
    }

    fn status(&self) -> BoxFuture<'_, Result<PlaybackStatus, ApiClientError>> {
        self.get::<PlaybackStatus>("status").boxed()
    }

    fn tree(&self) -> BoxFuture<'_, Result<TreeNode, ApiClientError>> {
        async move {
            let response: TreeResponse = self.get("tree").await?;
            Ok(response.tree)
        }
        .boxed()
    }
}
