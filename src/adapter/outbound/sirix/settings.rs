//! SiRiX feed configuration.

use serde::Deserialize;

use crate::adapter::outbound::http::HttpConfig;

/// Feed endpoint, account groups and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct SirixConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path of the open-positions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Account groups whose positions are watched.
    pub groups: Vec<String>,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    /// Time zone of naive timestamps in the feed.
    #[serde(default = "default_source_tz")]
    pub source_tz: String,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_base_url() -> String {
    "https://restapi-real3.sirixtrader.com".into()
}

fn default_endpoint() -> String {
    "/api/ManagementService/GetOpenPositionsForGroups".into()
}

fn default_token_env() -> String {
    "SIRIX_TOKEN".into()
}

fn default_source_tz() -> String {
    "Asia/Jerusalem".into()
}

impl SirixConfig {
    /// Full URL of the open-positions endpoint.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}
