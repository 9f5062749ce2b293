use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use assina_domain::{
    CreateEnvelopeRecordInput, DomainError, DomainResult, EnvelopeRepository, EnvelopeStatus,
    SignatureEnvelope,
};

use crate::client::PostgresClient;
use crate::models::{EnvelopeRow, ENVELOPE_COLUMNS};

#[derive(Clone)]
pub struct PostgresEnvelopeRepository {
    client: PostgresClient,
}

impl PostgresEnvelopeRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EnvelopeRepository for PostgresEnvelopeRepository {
    async fn create_with_signers(
        &self,
        input: CreateEnvelopeRecordInput,
    ) -> DomainResult<SignatureEnvelope> {
        debug!(document_id = %input.document_id, "Creating envelope in database");

        let mut conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let tx = conn
            .transaction()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        let now = Utc::now();
        let total_signers = i32::try_from(input.signers.len())
            .map_err(|_| DomainError::InvalidRequest("too many signers".to_string()))?;

        let result = tx
            .execute(
                "INSERT INTO signature_envelopes \
                 (document_id, title, mode, provider_envelope_id, status, signed_count, \
                  total_signers, source_artifact_key, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, 'pending', 0, $5, $6, $7, $7)",
                &[
                    &input.document_id,
                    &input.title,
                    &input.mode.as_str(),
                    &input.provider_envelope_id,
                    &total_signers,
                    &input.source_artifact_key,
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                if db_err.code().code() == "23505" {
                    return Err(DomainError::EnvelopeAlreadyExists(input.document_id));
                }
            }
            return Err(DomainError::Repository(e.into()));
        }

        for signer in &input.signers {
            tx.execute(
                "INSERT INTO envelope_signers \
                 (signer_id, document_id, name, email, national_id, provider_nonce, \
                  sign_url, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $8)",
                &[
                    &signer.signer_id,
                    &input.document_id,
                    &signer.name,
                    &signer.email,
                    &signer.national_id,
                    &signer.provider_nonce,
                    &signer.sign_url,
                    &now,
                ],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        info!(
            document_id = %input.document_id,
            signers = input.signers.len(),
            "Envelope created in database"
        );

        Ok(SignatureEnvelope {
            document_id: input.document_id,
            title: input.title,
            mode: input.mode,
            provider_envelope_id: input.provider_envelope_id,
            provider_document_id: None,
            status: EnvelopeStatus::Pending,
            signed_count: 0,
            total_signers,
            source_artifact_key: input.source_artifact_key,
            signed_artifact_key: None,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    async fn get_by_document_id(
        &self,
        document_id: &str,
    ) -> DomainResult<Option<SignatureEnvelope>> {
        debug!(document_id = %document_id, "Getting envelope from database");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query =
            format!("SELECT {ENVELOPE_COLUMNS} FROM signature_envelopes WHERE document_id = $1");
        let row = conn
            .query_opt(query.as_str(), &[&document_id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        row.map(|row| EnvelopeRow::from_row(&row).into_domain())
            .transpose()
    }

    async fn get_by_provider_envelope_id(
        &self,
        provider_envelope_id: &str,
    ) -> DomainResult<Option<SignatureEnvelope>> {
        debug!(provider_envelope_id = %provider_envelope_id, "Getting envelope by provider uuid");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {ENVELOPE_COLUMNS} FROM signature_envelopes WHERE provider_envelope_id = $1"
        );
        let row = conn
            .query_opt(query.as_str(), &[&provider_envelope_id])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        row.map(|row| EnvelopeRow::from_row(&row).into_domain())
            .transpose()
    }

    async fn set_provider_document_id(
        &self,
        document_id: &str,
        provider_document_id: &str,
    ) -> DomainResult<bool> {
        debug!(
            document_id = %document_id,
            provider_document_id = %provider_document_id,
            "Caching resolved provider document id"
        );

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let affected = conn
            .execute(
                "UPDATE signature_envelopes \
                 SET provider_document_id = $2, updated_at = now() \
                 WHERE document_id = $1 AND provider_document_id IS NULL",
                &[&document_id, &provider_document_id],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(affected == 1)
    }

    async fn update_signed_count(&self, document_id: &str, signed_count: i32) -> DomainResult<()> {
        debug!(document_id = %document_id, signed_count, "Updating signed count");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        conn.execute(
            "UPDATE signature_envelopes \
             SET signed_count = $2, updated_at = now() \
             WHERE document_id = $1",
            &[&document_id, &signed_count],
        )
        .await
        .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(())
    }

    async fn set_artifact_key(&self, document_id: &str, artifact_key: &str) -> DomainResult<()> {
        debug!(document_id = %document_id, artifact_key = %artifact_key, "Recording artifact key");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        conn.execute(
            "UPDATE signature_envelopes \
             SET signed_artifact_key = $2, updated_at = now() \
             WHERE document_id = $1",
            &[&document_id, &artifact_key],
        )
        .await
        .map_err(|e| DomainError::Repository(e.into()))?;

        Ok(())
    }

    async fn mark_signed(&self, document_id: &str, artifact_key: &str) -> DomainResult<bool> {
        debug!(document_id = %document_id, "Marking envelope signed");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        // Conditional on pending so racing reconciliations observe at most
        // one success
        let affected = conn
            .execute(
                "UPDATE signature_envelopes \
                 SET status = 'signed', signed_artifact_key = $2, updated_at = now() \
                 WHERE document_id = $1 AND status = 'pending'",
                &[&document_id, &artifact_key],
            )
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        if affected == 1 {
            info!(document_id = %document_id, "Envelope marked signed");
        }

        Ok(affected == 1)
    }

    async fn list_pending(&self, limit: i64) -> DomainResult<Vec<SignatureEnvelope>> {
        debug!(limit, "Listing pending envelopes");

        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::Repository)?;

        let query = format!(
            "SELECT {ENVELOPE_COLUMNS} FROM signature_envelopes \
             WHERE status = 'pending' AND provider_envelope_id IS NOT NULL \
             ORDER BY updated_at DESC \
             LIMIT $1"
        );
        let rows = conn
            .query(query.as_str(), &[&limit])
            .await
            .map_err(|e| DomainError::Repository(e.into()))?;

        rows.iter()
            .map(|row| EnvelopeRow::from_row(row).into_domain())
            .collect()
    }
}
