use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

use assina_postgres::PostgresConfig;
use assina_provider::ProviderConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServiceConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    // HTTP configuration
    #[serde(default = "default_http_host")]
    pub http_host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    // Postgres configuration
    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    #[serde(default = "default_postgres_user")]
    pub postgres_user: String,

    #[serde(default = "default_postgres_password")]
    pub postgres_password: String,

    #[serde(default = "default_postgres_dbname")]
    pub postgres_dbname: String,

    #[serde(default = "default_postgres_pool_size")]
    pub postgres_pool_size: usize,

    // NATS configuration
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub nats_url: String,

    /// NATS connection timeout in seconds
    #[serde(default = "default_nats_timeout_secs")]
    pub nats_timeout_secs: u64,

    /// NATS Object Store bucket for PDF artifacts
    #[serde(default = "default_artifact_bucket")]
    pub artifact_bucket: String,

    /// JetStream stream (and base subject) for completion events
    #[serde(default = "default_completion_stream")]
    pub completion_stream: String,

    // Provider configuration
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    #[serde(default = "default_provider_auth_url")]
    pub provider_auth_url: String,

    #[serde(default = "default_provider_client_id")]
    pub provider_client_id: String,

    #[serde(default = "default_provider_client_secret")]
    pub provider_client_secret: String,

    #[serde(default = "default_provider_connect_timeout_secs")]
    pub provider_connect_timeout_secs: u64,

    #[serde(default = "default_provider_request_timeout_secs")]
    pub provider_request_timeout_secs: u64,

    // Sweep configuration
    /// Seconds between sweep passes
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Max pending envelopes reconciled per pass
    #[serde(default = "default_sweep_batch_limit")]
    pub sweep_batch_limit: i64,

    /// Milliseconds between provider calls within a pass
    #[serde(default = "default_sweep_delay_ms")]
    pub sweep_delay_ms: u64,

    /// Public base URL of the verification page linked from artifacts
    #[serde(default = "default_verification_base_url")]
    pub verification_base_url: String,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("ASSINA"))
            .build()?
            .try_deserialize()
    }

    pub fn postgres(&self) -> PostgresConfig {
        PostgresConfig {
            host: self.postgres_host.clone(),
            port: self.postgres_port,
            user: self.postgres_user.clone(),
            password: self.postgres_password.clone(),
            dbname: self.postgres_dbname.clone(),
            pool_size: self.postgres_pool_size,
        }
    }

    pub fn provider(&self) -> ProviderConfig {
        ProviderConfig {
            base_url: self.provider_base_url.clone(),
            auth_url: self.provider_auth_url.clone(),
            client_id: self.provider_client_id.clone(),
            client_secret: self.provider_client_secret.clone(),
            connect_timeout_secs: self.provider_connect_timeout_secs,
            request_timeout_secs: self.provider_request_timeout_secs,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_postgres_user() -> String {
    "assina".to_string()
}

fn default_postgres_password() -> String {
    "assina".to_string()
}

fn default_postgres_dbname() -> String {
    "assina".to_string()
}

fn default_postgres_pool_size() -> usize {
    16
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_nats_timeout_secs() -> u64 {
    10
}

fn default_artifact_bucket() -> String {
    "signature-artifacts".to_string()
}

fn default_completion_stream() -> String {
    "envelope-completions".to_string()
}

fn default_provider_base_url() -> String {
    "https://signature.api.example.com".to_string()
}

fn default_provider_auth_url() -> String {
    "https://auth.api.example.com".to_string()
}

fn default_provider_client_id() -> String {
    "".to_string()
}

fn default_provider_client_secret() -> String {
    "".to_string()
}

fn default_provider_connect_timeout_secs() -> u64 {
    5
}

fn default_provider_request_timeout_secs() -> u64 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_sweep_batch_limit() -> i64 {
    50
}

fn default_sweep_delay_ms() -> u64 {
    200
}

fn default_verification_base_url() -> String {
    "https://localhost:8080/verify".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config = ServiceConfig::from_env().unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.sweep_batch_limit, 50);
        assert_eq!(config.artifact_bucket, "signature-artifacts");
    }

    #[test]
    fn nested_configs_are_derived() {
        let config = ServiceConfig::from_env().unwrap();

        let postgres = config.postgres();
        assert_eq!(postgres.port, 5432);

        let provider = config.provider();
        assert_eq!(provider.connect_timeout_secs, 5);
    }
}
