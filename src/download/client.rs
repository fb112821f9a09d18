//! HTTP client wrapper for fetching the stylesheet and font assets.
//!
//! This module provides the `HttpClient` struct which applies the configured
//! User-Agent, TLS strictness, timeouts and retry policy to every request.

use std::future::Future;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, DEFAULT_FONT_MIME};
use super::error::DownloadError;
use super::retry::{RetryDecision, RetryPolicy, classify_error};
use crate::config::Config;

/// HTTP client for stylesheet and font fetches.
///
/// Create it once per run and reuse it for every request, taking advantage
/// of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    retry_policy: RetryPolicy,
}

/// A fetched stylesheet.
#[derive(Debug, Clone)]
pub struct FetchedText {
    /// Final URL after redirects, used to resolve relative font URLs.
    pub url: Url,
    /// HTTP status of the final response.
    pub status: u16,
    /// Response body.
    pub body: String,
}

/// A fetched font asset.
#[derive(Debug, Clone)]
pub struct FetchedAsset {
    /// Response body.
    pub bytes: Vec<u8>,
    /// `Content-Type` header, or `font/woff2` when absent.
    pub content_type: String,
}

impl HttpClient {
    /// Creates a client from the run configuration.
    ///
    /// Uses the configured User-Agent, accepts invalid certificates only when
    /// `strict_tls` is off, applies `timeout_secs` to every request and
    /// retries transient failures up to `retries` times.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the underlying client cannot be built.
    pub fn new(config: &Config) -> Result<Self, DownloadError> {
        Self::with_retry_policy(config, RetryPolicy::with_retries(config.retries))
    }

    /// Creates a client with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Client`] if the underlying client cannot be built.
    pub fn with_retry_policy(
        config: &Config,
        retry_policy: RetryPolicy,
    ) -> Result<Self, DownloadError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .gzip(true)
            .user_agent(config.user_agent.as_str())
            .danger_accept_invalid_certs(!config.strict_tls)
            .build()
            .map_err(|source| DownloadError::Client { source })?;

        if !config.strict_tls {
            warn!("TLS certificate validation is disabled");
        }

        Ok(Self {
            client,
            retry_policy,
        })
    }

    /// Fetches a stylesheet as text.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the URL is invalid, the request fails, or
    /// the server answers with a 4xx/5xx status.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<FetchedText, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let parsed = &parsed;
        self.with_retry(url, || async move {
            let response = self.send(parsed).await?;
            let status = response.status().as_u16();
            let final_url = response.url().clone();
            let body = response
                .text()
                .await
                .map_err(|e| DownloadError::from_reqwest(url, e))?;
            debug!(status, bytes = body.len(), final_url = %final_url, "stylesheet fetched");
            Ok(FetchedText {
                url: final_url,
                status,
                body,
            })
        })
        .await
    }

    /// Fetches a font asset as bytes together with its `Content-Type`.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`fetch_text`](Self::fetch_text).
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_binary(&self, url: &str) -> Result<FetchedAsset, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let parsed = &parsed;
        self.with_retry(url, || async move {
            let response = self.send(parsed).await?;
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(DEFAULT_FONT_MIME)
                .to_string();

            let mut bytes = Vec::new();
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| DownloadError::from_reqwest(url, e))?;
                bytes.extend_from_slice(&chunk);
            }
            debug!(bytes = bytes.len(), content_type = %content_type, "font fetched");
            Ok(FetchedAsset {
                bytes,
                content_type,
            })
        })
        .await
    }

    async fn send(&self, url: &Url) -> Result<reqwest::Response, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            return Err(DownloadError::http_status(url.as_str(), status.as_u16()));
        }
        Ok(response)
    }

    async fn with_retry<T, F, Fut>(&self, url: &str, mut operation: F) -> Result<T, DownloadError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DownloadError>>,
    {
        let mut attempt = 1;
        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };
            match self
                .retry_policy
                .should_retry(classify_error(&error), attempt)
            {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    info!(
                        url,
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(url, attempt, reason = %reason, "giving up");
                    return Err(error);
                }
            }
        }
    }
}
