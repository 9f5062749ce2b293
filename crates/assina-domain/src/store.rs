use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::DomainResult;

/// Opaque blob store for original and signed PDFs.
///
/// Re-uploading the same content under the same key must be safe
/// (idempotent overwrite).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn upload(&self, key: &str, content: Bytes) -> DomainResult<()>;

    async fn download(&self, key: &str) -> DomainResult<Bytes>;

    async fn exists(&self, key: &str) -> DomainResult<bool>;
}

/// Completion event emitted once when an envelope reaches terminal success.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionNotice {
    pub document_id: String,
    pub title: String,
    pub signed_count: i32,
    pub total_signers: i32,
    pub completed_at: DateTime<Utc>,
}

/// Fire-and-forget completion notification. Failures are logged by the
/// caller and never fail reconciliation.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CompletionNotifier: Send + Sync {
    async fn envelope_completed(&self, notice: CompletionNotice) -> DomainResult<()>;
}

/// One signer's block burned into the last-page margin in simple mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureBlock {
    /// Zero-based position among the envelope's signers. The block's
    /// vertical offset is derived from this index alone, so signers can be
    /// stamped independently across invocations.
    pub signer_index: usize,
    pub name: String,
    pub national_id: Option<String>,
    pub signed_at: DateTime<Utc>,
    /// Public verification URL, drawn once by the first signer's block.
    pub verification_url: String,
}

/// One row of the locally generated evidence report.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceRow {
    pub name: String,
    /// Already masked; raw national ids never reach the report.
    pub masked_national_id: String,
    pub email: String,
    pub signing_ip: String,
    pub geolocation: String,
    pub signature_id: String,
    pub signed_at: Option<DateTime<Utc>>,
}

/// Input for rendering the local evidence report PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceReport {
    pub title: String,
    pub verification_url: String,
    pub rows: Vec<EvidenceRow>,
}

/// PDF engine contract: concatenation, margin stamping, report rendering.
/// Implemented by assina-pdf on top of lopdf.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait PdfComposer: Send + Sync {
    /// Concatenate pages of the given documents in order into one PDF.
    /// Input pages are carried over untouched.
    fn merge(&self, documents: &[Bytes]) -> DomainResult<Bytes>;

    /// Burn a signer block into the right-margin strip of the last page.
    fn stamp_signature_block(&self, pdf: &[u8], block: &SignatureBlock) -> DomainResult<Bytes>;

    /// Render the evidence report as its own PDF, QR code on every page.
    fn render_evidence_report(&self, report: &EvidenceReport) -> DomainResult<Bytes>;
}
