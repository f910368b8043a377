//! HTTP client for the SiRiX management API.

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use tracing::{debug, warn};

use super::dto::{OpenPositionsRequest, OpenPositionsResponse, SirixPosition};
use super::settings::SirixConfig;
use crate::adapter::outbound::http::JsonClient;
use crate::error::{FeedError, Result};
use crate::port::{EventFeed, RawEvent};

/// Polls open positions for the configured account groups.
pub struct SirixFeed {
    client: JsonClient,
    url: String,
    groups: Vec<String>,
    token: String,
}

impl SirixFeed {
    #[must_use]
    pub fn new(config: &SirixConfig, token: String) -> Self {
        Self {
            client: JsonClient::from_config(&config.http),
            url: config.url(),
            groups: config.groups.clone(),
            token,
        }
    }

    /// Decode each record on its own so one malformed entry only drops
    /// itself.
    fn decode(records: Vec<serde_json::Value>) -> Vec<RawEvent> {
        records
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<SirixPosition>(record) {
                Ok(position) => Some(RawEvent::from(position)),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed SiRiX record");
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl EventFeed for SirixFeed {
    async fn fetch(&self, lookback: Duration) -> Result<Vec<RawEvent>> {
        let now = Utc::now();
        let body = OpenPositionsRequest {
            groups: &self.groups,
            start_time: (now - lookback).to_rfc3339_opts(SecondsFormat::Millis, true),
            end_time: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = self
            .client
            .send_with_retry(|http| http.post(&self.url).bearer_auth(&self.token).json(&body))
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        let records = response
            .json::<OpenPositionsResponse>()
            .await?
            .into_records()
            .ok_or_else(|| FeedError::Payload("expected OpenPositions or a list".into()))?;

        let events = Self::decode(records);
        debug!(count = events.len(), lookback_secs = lookback.num_seconds(), "Fetched SiRiX positions");
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "sirix"
    }
}
