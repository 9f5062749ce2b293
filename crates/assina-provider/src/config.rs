use serde::Deserialize;

/// Connection settings for the signing provider API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider REST API, without a trailing slash.
    pub base_url: String,
    /// Base URL of the provider token endpoint.
    pub auth_url: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    60
}
