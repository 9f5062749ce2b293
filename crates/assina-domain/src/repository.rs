use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::envelope::{CreateEnvelopeRecordInput, SignatureEnvelope};
use crate::error::DomainResult;
use crate::signer::EnvelopeSigner;

/// Repository trait for envelope storage operations.
/// Infrastructure layer (assina-postgres) implements this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait EnvelopeRepository: Send + Sync {
    /// Create an envelope together with its signers, all pending.
    async fn create_with_signers(
        &self,
        input: CreateEnvelopeRecordInput,
    ) -> DomainResult<SignatureEnvelope>;

    /// Get an envelope by owning document id.
    async fn get_by_document_id(&self, document_id: &str)
        -> DomainResult<Option<SignatureEnvelope>>;

    /// Get an envelope by the provider-assigned envelope uuid.
    async fn get_by_provider_envelope_id(
        &self,
        provider_envelope_id: &str,
    ) -> DomainResult<Option<SignatureEnvelope>>;

    /// Persist the lazily resolved provider document id. Conditional on the
    /// column still being unset; returns whether a row was affected.
    async fn set_provider_document_id(
        &self,
        document_id: &str,
        provider_document_id: &str,
    ) -> DomainResult<bool>;

    /// Write the recomputed signed count.
    async fn update_signed_count(&self, document_id: &str, signed_count: i32) -> DomainResult<()>;

    /// Record the current signed artifact key without touching status.
    /// Used by simple-mode stamping, where the artifact advances one signer
    /// at a time.
    async fn set_artifact_key(&self, document_id: &str, artifact_key: &str) -> DomainResult<()>;

    /// Transition the envelope to signed with its artifact key. Conditional
    /// on `status = 'pending'`; returns whether a row was affected, so
    /// racing reconciliations observe at most one success.
    async fn mark_signed(&self, document_id: &str, artifact_key: &str) -> DomainResult<bool>;

    /// Pending envelopes that have a provider envelope, most recent first,
    /// bounded. This selection is the sweep's retry policy.
    async fn list_pending(&self, limit: i64) -> DomainResult<Vec<SignatureEnvelope>>;
}

/// Repository trait for signer storage operations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SignerRepository: Send + Sync {
    /// All signers of a document in creation order.
    async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<EnvelopeSigner>>;

    /// Transition one signer to signed. Conditional on
    /// `status = 'pending'`; returns whether a row was affected. Signers
    /// already signed keep their original `signed_at`.
    async fn mark_signed(
        &self,
        signer_id: &str,
        signed_at: DateTime<Utc>,
        signing_ip: Option<String>,
    ) -> DomainResult<bool>;

    /// Count of signers with status signed, straight from the rows.
    async fn count_signed(&self, document_id: &str) -> DomainResult<i64>;
}
