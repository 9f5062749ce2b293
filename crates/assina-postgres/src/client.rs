use anyhow::{Context, Result};
use deadpool_postgres::{Config, Object, Pool, PoolConfig, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

use crate::config::PostgresConfig;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS signature_envelopes (
    document_id          TEXT PRIMARY KEY,
    title                TEXT NOT NULL,
    mode                 TEXT NOT NULL,
    provider_envelope_id TEXT UNIQUE,
    provider_document_id TEXT,
    status               TEXT NOT NULL DEFAULT 'pending',
    signed_count         INTEGER NOT NULL DEFAULT 0,
    total_signers        INTEGER NOT NULL,
    source_artifact_key  TEXT NOT NULL,
    signed_artifact_key  TEXT,
    created_at           TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at           TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS envelope_signers (
    signer_id      TEXT PRIMARY KEY,
    document_id    TEXT NOT NULL REFERENCES signature_envelopes (document_id),
    name           TEXT NOT NULL,
    email          TEXT NOT NULL,
    national_id    TEXT,
    provider_nonce TEXT,
    sign_url       TEXT,
    status         TEXT NOT NULL DEFAULT 'pending',
    signed_at      TIMESTAMPTZ,
    signing_ip     TEXT,
    geolocation    TEXT,
    created_at     TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at     TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_envelope_signers_document
    ON envelope_signers (document_id);

CREATE INDEX IF NOT EXISTS idx_signature_envelopes_pending
    ON signature_envelopes (status, updated_at DESC);
";

#[derive(Clone)]
pub struct PostgresClient {
    pool: Pool,
}

impl PostgresClient {
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        info!(
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "Connecting to postgres"
        );

        let mut pool_config = Config::new();
        pool_config.host = Some(config.host.clone());
        pool_config.port = Some(config.port);
        pool_config.user = Some(config.user.clone());
        pool_config.password = Some(config.password.clone());
        pool_config.dbname = Some(config.dbname.clone());
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .context("Failed to build postgres pool")?;

        // Fail fast on bad credentials
        pool.get()
            .await
            .context("Failed to check out a postgres connection")?;

        info!("Connected to postgres");
        Ok(Self { pool })
    }

    /// Apply the embedded schema. All statements are idempotent.
    pub async fn ensure_schema(&self) -> Result<()> {
        let conn = self.get_connection().await?;
        conn.batch_execute(SCHEMA)
            .await
            .context("Failed to apply schema")?;

        info!("Schema ensured");
        Ok(())
    }

    pub async fn get_connection(&self) -> Result<Object> {
        self.pool
            .get()
            .await
            .context("Failed to get postgres connection from pool")
    }
}
