use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::envelope::{SignatureEnvelope, SignatureMode};
use crate::error::{DomainError, DomainResult};
use crate::format::{mask_national_id, sanitize_filename};
use crate::provider::SigningProvider;
use crate::repository::{EnvelopeRepository, SignerRepository};
use crate::store::{ArtifactStore, EvidenceReport, EvidenceRow, PdfComposer};

/// Final downloadable artifact: raw PDF bytes plus a filename already safe
/// for a `Content-Disposition` header.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceArtifact {
    pub bytes: Bytes,
    pub filename: String,
}

/// Produces the final tamper-evident artifact for a completed envelope.
///
/// Provider mode retrieves the provider's unified reports and concatenates
/// them in envelope order; provider-authored pages are never edited.
/// Simple mode merges the locally stamped PDF with a locally rendered
/// evidence report. Assembly is read-only with respect to signature state.
pub struct EvidenceService {
    envelope_repository: Arc<dyn EnvelopeRepository>,
    signer_repository: Arc<dyn SignerRepository>,
    provider: Arc<dyn SigningProvider>,
    artifact_store: Arc<dyn ArtifactStore>,
    pdf: Arc<dyn PdfComposer>,
    /// Base of the public verification endpoint linked from local reports.
    verification_base_url: String,
}

impl EvidenceService {
    pub fn new(
        envelope_repository: Arc<dyn EnvelopeRepository>,
        signer_repository: Arc<dyn SignerRepository>,
        provider: Arc<dyn SigningProvider>,
        artifact_store: Arc<dyn ArtifactStore>,
        pdf: Arc<dyn PdfComposer>,
        verification_base_url: String,
    ) -> Self {
        Self {
            envelope_repository,
            signer_repository,
            provider,
            artifact_store,
            pdf,
            verification_base_url,
        }
    }

    pub async fn assemble(&self, document_id: &str) -> DomainResult<EvidenceArtifact> {
        let envelope = self
            .envelope_repository
            .get_by_document_id(document_id)
            .await?
            .ok_or_else(|| DomainError::EnvelopeNotFound(document_id.to_string()))?;

        let bytes = match envelope.mode {
            SignatureMode::Provider => self.assemble_provider_reports(&envelope).await?,
            SignatureMode::Simple => self.assemble_local_report(&envelope).await?,
        };

        let filename = format!("{}_evidencias.pdf", sanitize_filename(&envelope.title));

        info!(
            document_id = %document_id,
            filename = %filename,
            size_bytes = bytes.len(),
            "Assembled evidence artifact"
        );

        Ok(EvidenceArtifact { bytes, filename })
    }

    /// Download the provider's unified report for every sub-document and
    /// concatenate their pages in envelope order.
    async fn assemble_provider_reports(
        &self,
        envelope: &SignatureEnvelope,
    ) -> DomainResult<Bytes> {
        let provider_envelope_id = envelope
            .provider_envelope_id
            .as_deref()
            .ok_or_else(|| DomainError::MissingProviderEnvelope(envelope.document_id.clone()))?;

        let state = self.provider.envelope_state(provider_envelope_id).await?;
        if state.documents.is_empty() {
            return Err(DomainError::Assembly(format!(
                "provider reports no documents for envelope {provider_envelope_id}"
            )));
        }

        let mut reports = Vec::with_capacity(state.documents.len());
        for document in &state.documents {
            debug!(
                document_id = %envelope.document_id,
                provider_document_id = %document.id,
                "Downloading unified report"
            );
            let report = self
                .provider
                .download_unified_report(provider_envelope_id, &document.id)
                .await?;
            reports.push(report);
        }

        if reports.len() == 1 {
            // Single sub-document: the provider report is already final
            return Ok(reports.into_iter().next().unwrap_or_default());
        }
        self.pdf.merge(&reports)
    }

    /// Merge the locally stamped signed PDF with a locally rendered
    /// evidence report, signed pages first.
    async fn assemble_local_report(&self, envelope: &SignatureEnvelope) -> DomainResult<Bytes> {
        let artifact_key = envelope
            .signed_artifact_key
            .as_deref()
            .ok_or_else(|| DomainError::ArtifactNotAvailable(envelope.document_id.clone()))?;

        let signed_pdf = self.artifact_store.download(artifact_key).await?;

        let signers = self
            .signer_repository
            .list_by_document(&envelope.document_id)
            .await?;

        let rows = signers
            .iter()
            .map(|s| EvidenceRow {
                name: s.name.clone(),
                masked_national_id: s
                    .national_id
                    .as_deref()
                    .map(mask_national_id)
                    .unwrap_or_else(|| "-".to_string()),
                email: s.email.clone(),
                signing_ip: s.signing_ip.clone().unwrap_or_else(|| "-".to_string()),
                geolocation: s.geolocation.clone().unwrap_or_else(|| "-".to_string()),
                signature_id: s.signer_id.clone(),
                signed_at: s.signed_at,
            })
            .collect();

        let report = EvidenceReport {
            title: envelope.title.clone(),
            verification_url: format!(
                "{}/{}",
                self.verification_base_url.trim_end_matches('/'),
                envelope.document_id
            ),
            rows,
        };

        let report_pdf = self.pdf.render_evidence_report(&report)?;
        self.pdf.merge(&[signed_pdf, report_pdf])
    }
}
