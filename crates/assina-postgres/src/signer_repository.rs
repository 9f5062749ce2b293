use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use assina_domain::{DomainError, DomainResult, EnvelopeSigner, SignerRepository};

use crate::client::PostgresClient;
use crate::models::{SignerRow, SIGNER_COLUMNS};

#[derive(Clone)]
pub struct PostgresSignerRepository {
    client: PostgresClient,
}

impl PostgresSignerRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SignerRepository for PostgresSignerRepository {
    async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<EnvelopeSigner>> {
        debug!(document_id = %document_id, "Listing signers from database");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {SIGNER_COLUMNS} FROM envelope_signers \
             WHERE document_id = $1 \
             ORDER BY created_at, signer_id"
        );
        let rows = conn
            .query(query.as_str(), &[&document_id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        rows.iter()
            .map(|row| SignerRow::from_row(row).into_domain())
            .collect()
    }

    async fn mark_signed(
        &self,
        signer_id: &str,
        signed_at: DateTime<Utc>,
        signing_ip: Option<String>,
    ) -> DomainResult<bool> {
        debug!(signer_id = %signer_id, "Marking signer signed");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        // Conditional on pending; replays keep the original signed_at
        let affected = conn
            .execute(
                "UPDATE envelope_signers \
                 SET status = 'signed', signed_at = $2, signing_ip = $3, updated_at = now() \
                 WHERE signer_id = $1 AND status = 'pending'",
                &[&signer_id, &signed_at, &signing_ip],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(affected == 1)
    }

    async fn count_signed(&self, document_id: &str) -> DomainResult<i64> {
        debug!(document_id = %document_id, "Counting signed signers");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let row = conn
            .query_one(
                "SELECT COUNT(*) FROM envelope_signers \
                 WHERE document_id = $1 AND status = 'signed'",
                &[&document_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(row.get(0))
    }
}
