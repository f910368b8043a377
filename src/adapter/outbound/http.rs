//! Shared JSON-over-HTTP plumbing for the feed and bridge clients.
//!
//! Requests carry bounded timeouts. Connect errors and timeouts are retried
//! with a fixed backoff; everything else is returned to the caller at once.

use std::time::Duration;

use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::Deserialize;
use tokio::time::sleep;
use tracing::warn;

/// HTTP client settings shared by outbound adapters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Maximum number of attempts for transient failures.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,
    /// Backoff between retries in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

const fn default_timeout_ms() -> u64 {
    10_000
}

const fn default_connect_timeout_ms() -> u64 {
    3_000
}

const fn default_retry_max_attempts() -> u32 {
    2
}

const fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// A `reqwest` client with the retry policy applied.
#[derive(Debug, Clone)]
pub struct JsonClient {
    http: HttpClient,
    attempts: u32,
    pause: Duration,
}

impl JsonClient {
    /// Falls back to a default `reqwest` client if the configured one
    /// cannot be built.
    #[must_use]
    pub fn from_config(config: &HttpConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "HTTP client settings rejected, using reqwest defaults");
                HttpClient::new()
            });

        Self {
            http,
            attempts: config.retry_max_attempts.max(1),
            pause: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    #[must_use]
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Send the request built by `build`, retrying transient transport
    /// failures. The response is returned whatever its status.
    ///
    /// Only idempotent requests should go through here; order placement
    /// is sent once via [`Self::http`].
    pub async fn send_with_retry<F>(&self, build: F) -> reqwest::Result<Response>
    where
        F: Fn(&HttpClient) -> RequestBuilder,
    {
        let mut attempt = 1;
        loop {
            let err = match build(&self.http).send().await {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };
            if attempt == self.attempts || !is_transient(&err) {
                return Err(err);
            }
            warn!(attempt, of = self.attempts, error = %err, "transport error, retrying request");
            if !self.pause.is_zero() {
                sleep(self.pause).await;
            }
            attempt += 1;
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}
