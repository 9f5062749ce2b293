use chrono::{DateTime, Utc};

/// Signing mode chosen at envelope creation.
///
/// `Provider` envelopes are handed to the external signing service and
/// reconciled against its state. `Simple` envelopes are signed locally by
/// stamping a signature block into the PDF margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMode {
    Provider,
    Simple,
}

impl SignatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMode::Provider => "provider",
            SignatureMode::Simple => "simple",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "provider" => Some(SignatureMode::Provider),
            "simple" => Some(SignatureMode::Simple),
            _ => None,
        }
    }
}

/// Envelope status. Monotonic: once `Signed`, never reverts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStatus {
    Pending,
    Signed,
}

impl EnvelopeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeStatus::Pending => "pending",
            EnvelopeStatus::Signed => "signed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(EnvelopeStatus::Pending),
            "signed" => Some(EnvelopeStatus::Signed),
            _ => None,
        }
    }
}

/// Per-document signing session tracked locally, 1:1 with a signable document.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureEnvelope {
    pub document_id: String,
    pub title: String,
    pub mode: SignatureMode,
    /// External identifier assigned at creation; immutable once set.
    pub provider_envelope_id: Option<String>,
    /// External per-document identifier within the envelope; resolved
    /// lazily from provider state, then cached permanently.
    pub provider_document_id: Option<String>,
    pub status: EnvelopeStatus,
    /// Cached aggregate. Source of truth is always the signer rows.
    pub signed_count: i32,
    pub total_signers: i32,
    /// Object store key of the original PDF handed in at creation.
    pub source_artifact_key: String,
    /// Object store key of the signed PDF; set when the envelope completes.
    pub signed_artifact_key: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Repository input for creating an envelope together with its signers.
#[derive(Debug, Clone)]
pub struct CreateEnvelopeRecordInput {
    pub document_id: String,
    pub title: String,
    pub mode: SignatureMode,
    pub provider_envelope_id: Option<String>,
    pub source_artifact_key: String,
    pub signers: Vec<CreateSignerRecordInput>,
}

/// Per-signer part of [`CreateEnvelopeRecordInput`].
#[derive(Debug, Clone)]
pub struct CreateSignerRecordInput {
    pub signer_id: String,
    pub name: String,
    pub email: String,
    pub national_id: Option<String>,
    pub provider_nonce: Option<String>,
    pub sign_url: Option<String>,
}

/// Result record returned by every reconciliation entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub changed: bool,
    pub signed_count: i32,
    pub total_signers: i32,
    pub completed: bool,
}
