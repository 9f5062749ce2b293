use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::DomainResult;

/// Signer handed to the provider at envelope creation.
#[derive(Debug, Clone)]
pub struct ProviderSignerInput {
    pub name: String,
    pub email: String,
    pub national_id: Option<String>,
}

/// Document handed to the provider at envelope creation.
#[derive(Debug, Clone)]
pub struct ProviderDocumentInput {
    pub name: String,
    pub content: Bytes,
}

/// Envelope creation request for the external provider.
#[derive(Debug, Clone)]
pub struct CreateProviderEnvelopeInput {
    pub title: String,
    pub signers: Vec<ProviderSignerInput>,
    pub documents: Vec<ProviderDocumentInput>,
    /// Close the envelope automatically once every signer completed.
    pub auto_close: bool,
    /// Provider signature profile, e.g. advanced or qualified.
    pub signature_profile: String,
}

/// Per-signer link returned by the provider at creation.
#[derive(Debug, Clone)]
pub struct ProviderSignerLink {
    pub email: String,
    pub nonce: Option<String>,
    pub sign_url: String,
}

/// Identifiers and links assigned by the provider at creation.
#[derive(Debug, Clone)]
pub struct ProviderEnvelopeCreated {
    pub envelope_id: String,
    pub document_ids: Vec<String>,
    pub signer_links: Vec<ProviderSignerLink>,
}

/// One signer entry in a provider state snapshot.
#[derive(Debug, Clone)]
pub struct ProviderSignerState {
    pub nonce: Option<String>,
    pub email: Option<String>,
    pub completed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub signing_ip: Option<String>,
}

/// One sub-document entry in a provider state snapshot.
#[derive(Debug, Clone)]
pub struct ProviderDocumentState {
    pub id: String,
    pub name: Option<String>,
}

/// Snapshot of an envelope as reported by the provider.
#[derive(Debug, Clone)]
pub struct ProviderEnvelopeState {
    /// Provider-reported completion flag for the whole envelope.
    pub completed: bool,
    pub signers: Vec<ProviderSignerState>,
    /// Sub-documents in envelope order.
    pub documents: Vec<ProviderDocumentState>,
}

/// Client contract for the external signing provider.
///
/// Any non-success HTTP response surfaces as
/// [`DomainError::Provider`](crate::error::DomainError::Provider) with the
/// upstream status and raw body. Retry policy lives with the callers.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SigningProvider: Send + Sync {
    async fn create_envelope(
        &self,
        input: CreateProviderEnvelopeInput,
    ) -> DomainResult<ProviderEnvelopeCreated>;

    async fn envelope_state(
        &self,
        provider_envelope_id: &str,
    ) -> DomainResult<ProviderEnvelopeState>;

    async fn download_signed_document(
        &self,
        provider_envelope_id: &str,
        provider_document_id: &str,
    ) -> DomainResult<Bytes>;

    /// The provider-composed PDF bundling original, signatures and audit
    /// trail for one sub-document.
    async fn download_unified_report(
        &self,
        provider_envelope_id: &str,
        provider_document_id: &str,
    ) -> DomainResult<Bytes>;
}
