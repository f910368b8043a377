//! Broker bridge configuration.

use serde::Deserialize;

use crate::adapter::outbound::http::HttpConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// Base URL of the bridge service.
    pub base_url: String,
    /// Environment variable holding an optional bearer token.
    #[serde(default)]
    pub token_env: Option<String>,
    /// Bar timeframe requested for indicators.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_timeframe() -> String {
    "M1".into()
}
