use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::envelope::SignatureMode;
use crate::error::{DomainError, DomainResult};
use crate::format::sanitize_filename;
use crate::repository::{EnvelopeRepository, SignerRepository};
use crate::signer::SignerStatus;
use crate::store::{
    ArtifactStore, CompletionNotice, CompletionNotifier, PdfComposer, SignatureBlock,
};

/// Result of one simple-mode stamping invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct StampOutcome {
    pub artifact_key: String,
    pub signed_count: i32,
    pub total_signers: i32,
    pub completed: bool,
}

/// Simple-mode signing path: no external provider, the signature block is
/// burned into the PDF margin locally, one signer per invocation.
///
/// Each invocation loads whichever file is currently the most-signed
/// version (previously stamped artifact if one exists, else the original),
/// so sequential single-signer stamping composes. The block's vertical
/// offset is derived from the signer index alone, never from re-measuring
/// the page.
pub struct StampService {
    envelope_repository: Arc<dyn EnvelopeRepository>,
    signer_repository: Arc<dyn SignerRepository>,
    artifact_store: Arc<dyn ArtifactStore>,
    pdf: Arc<dyn PdfComposer>,
    notifier: Arc<dyn CompletionNotifier>,
    verification_base_url: String,
}

impl StampService {
    pub fn new(
        envelope_repository: Arc<dyn EnvelopeRepository>,
        signer_repository: Arc<dyn SignerRepository>,
        artifact_store: Arc<dyn ArtifactStore>,
        pdf: Arc<dyn PdfComposer>,
        notifier: Arc<dyn CompletionNotifier>,
        verification_base_url: String,
    ) -> Self {
        Self {
            envelope_repository,
            signer_repository,
            artifact_store,
            pdf,
            notifier,
            verification_base_url,
        }
    }

    pub async fn stamp(&self, document_id: &str, signer_id: &str) -> DomainResult<StampOutcome> {
        let envelope = self
            .envelope_repository
            .get_by_document_id(document_id)
            .await?
            .ok_or_else(|| DomainError::EnvelopeNotFound(document_id.to_string()))?;

        if envelope.mode != SignatureMode::Simple {
            return Err(DomainError::InvalidRequest(format!(
                "document {document_id} uses the external provider; stamping applies to simple mode only"
            )));
        }

        let signers = self.signer_repository.list_by_document(document_id).await?;
        let (signer_index, signer) = signers
            .iter()
            .enumerate()
            .find(|(_, s)| s.signer_id == signer_id)
            .ok_or_else(|| DomainError::SignerNotFound(signer_id.to_string()))?;

        if signer.status == SignerStatus::Signed {
            // Re-stamping a signed signer would duplicate the block
            return Err(DomainError::InvalidRequest(format!(
                "signer {signer_id} already signed"
            )));
        }

        // Load the most-signed version: previous stamp if present, else the
        // original upload.
        let source_key = envelope
            .signed_artifact_key
            .as_deref()
            .unwrap_or(envelope.source_artifact_key.as_str());
        let source = self.artifact_store.download(source_key).await?;

        debug!(
            document_id = %document_id,
            signer_id = %signer_id,
            signer_index,
            source_key = %source_key,
            "Stamping signature block"
        );

        let signed_at = Utc::now();
        let block = SignatureBlock {
            signer_index,
            name: signer.name.clone(),
            national_id: signer.national_id.clone(),
            signed_at,
            verification_url: format!(
                "{}/{}",
                self.verification_base_url.trim_end_matches('/'),
                document_id
            ),
        };
        let stamped = self.pdf.stamp_signature_block(&source, &block)?;

        let artifact_key = format!(
            "signed/{}_{}.pdf",
            sanitize_filename(&envelope.title),
            signed_at.timestamp()
        );
        self.artifact_store.upload(&artifact_key, stamped).await?;
        self.envelope_repository
            .set_artifact_key(document_id, &artifact_key)
            .await?;

        if !self
            .signer_repository
            .mark_signed(signer_id, signed_at, None)
            .await?
        {
            // Another invocation signed this signer between our load and
            // our conditional update; the stamp we just wrote duplicates
            // theirs, but block offsets are index-derived so the layout is
            // identical either way.
            warn!(
                document_id = %document_id,
                signer_id = %signer_id,
                "Signer was signed concurrently during stamping"
            );
        }

        let signed_count = self.signer_repository.count_signed(document_id).await?;
        let signed_count = i32::try_from(signed_count)
            .map_err(|_| DomainError::Repository(anyhow::anyhow!("signed count out of range")))?;
        if signed_count != envelope.signed_count {
            self.envelope_repository
                .update_signed_count(document_id, signed_count)
                .await?;
        }

        let mut completed = false;
        if signed_count == envelope.total_signers {
            if self
                .envelope_repository
                .mark_signed(document_id, &artifact_key)
                .await?
            {
                info!(
                    document_id = %document_id,
                    artifact_key = %artifact_key,
                    "All signers stamped, envelope completed"
                );
                let notice = CompletionNotice {
                    document_id: document_id.to_string(),
                    title: envelope.title.clone(),
                    signed_count,
                    total_signers: envelope.total_signers,
                    completed_at: signed_at,
                };
                if let Err(e) = self.notifier.envelope_completed(notice).await {
                    warn!(document_id = %document_id, error = %e, "Completion notification failed");
                }
            }
            completed = true;
        }

        Ok(StampOutcome {
            artifact_key,
            signed_count,
            total_signers: envelope.total_signers,
            completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{EnvelopeStatus, SignatureEnvelope};
    use crate::repository::{MockEnvelopeRepository, MockSignerRepository};
    use crate::signer::EnvelopeSigner;
    use crate::store::{MockArtifactStore, MockCompletionNotifier, MockPdfComposer};
    use bytes::Bytes;

    fn simple_envelope(signed_artifact_key: Option<&str>, signed_count: i32) -> SignatureEnvelope {
        SignatureEnvelope {
            document_id: "doc-1".to_string(),
            title: "Termo de Uso".to_string(),
            mode: SignatureMode::Simple,
            provider_envelope_id: None,
            provider_document_id: None,
            status: EnvelopeStatus::Pending,
            signed_count,
            total_signers: 2,
            source_artifact_key: "uploads/termo.pdf".to_string(),
            signed_artifact_key: signed_artifact_key.map(str::to_string),
            created_at: None,
            updated_at: None,
        }
    }

    fn signer(id: &str, status: SignerStatus) -> EnvelopeSigner {
        EnvelopeSigner {
            signer_id: id.to_string(),
            document_id: "doc-1".to_string(),
            name: format!("Signer {id}"),
            email: format!("{id}@example.com"),
            national_id: Some("12345678901".to_string()),
            provider_nonce: None,
            sign_url: None,
            status,
            signed_at: None,
            signing_ip: None,
            geolocation: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn first_signer_stamps_the_original_upload() {
        // Arrange
        let mut envelope_repo = MockEnvelopeRepository::new();
        envelope_repo
            .expect_get_by_document_id()
            .times(1)
            .return_once(|_| Ok(Some(simple_envelope(None, 0))));
        envelope_repo
            .expect_set_artifact_key()
            .times(1)
            .return_once(|_, _| Ok(()));
        envelope_repo
            .expect_update_signed_count()
            .withf(|_, count| *count == 1)
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut signer_repo = MockSignerRepository::new();
        signer_repo.expect_list_by_document().times(1).return_once(|_| {
            Ok(vec![
                signer("s1", SignerStatus::Pending),
                signer("s2", SignerStatus::Pending),
            ])
        });
        signer_repo
            .expect_mark_signed()
            .withf(|id, _, _| id == "s1")
            .times(1)
            .return_once(|_, _, _| Ok(true));
        signer_repo
            .expect_count_signed()
            .times(1)
            .return_once(|_| Ok(1));

        let mut store = MockArtifactStore::new();
        store
            .expect_download()
            .withf(|key| key == "uploads/termo.pdf")
            .times(1)
            .return_once(|_| Ok(Bytes::from_static(b"original")));
        store
            .expect_upload()
            .withf(|key, _| key.starts_with("signed/Termo_de_Uso_"))
            .times(1)
            .return_once(|_, _| Ok(()));

        let mut pdf = MockPdfComposer::new();
        pdf.expect_stamp_signature_block()
            .withf(|_, block| block.signer_index == 0 && block.name == "Signer s1")
            .times(1)
            .return_once(|_, _| Ok(Bytes::from_static(b"stamped-1")));

        let service = StampService::new(
            Arc::new(envelope_repo),
            Arc::new(signer_repo),
            Arc::new(store),
            Arc::new(pdf),
            Arc::new(MockCompletionNotifier::new()),
            "https://verify.example.com/d".to_string(),
        );

        // Act
        let outcome = service.stamp("doc-1", "s1").await.unwrap();

        // Assert
        assert_eq!(outcome.signed_count, 1);
        assert!(!outcome.completed);
        assert!(outcome.artifact_key.starts_with("signed/Termo_de_Uso_"));
    }

    #[tokio::test]
    async fn second_signer_stamps_the_previous_artifact_and_completes() {
        // Arrange: signer 1 already stamped, signer 2 finishes the envelope
        let mut envelope_repo = MockEnvelopeRepository::new();
        envelope_repo
            .expect_get_by_document_id()
            .times(1)
            .return_once(|_| Ok(Some(simple_envelope(Some("signed/Termo_de_Uso_100.pdf"), 1))));
        envelope_repo
            .expect_set_artifact_key()
            .times(1)
            .return_once(|_, _| Ok(()));
        envelope_repo
            .expect_update_signed_count()
            .withf(|_, count| *count == 2)
            .times(1)
            .return_once(|_, _| Ok(()));
        envelope_repo
            .expect_mark_signed()
            .times(1)
            .return_once(|_, _| Ok(true));

        let mut signer_repo = MockSignerRepository::new();
        signer_repo.expect_list_by_document().times(1).return_once(|_| {
            Ok(vec![
                signer("s1", SignerStatus::Signed),
                signer("s2", SignerStatus::Pending),
            ])
        });
        signer_repo
            .expect_mark_signed()
            .withf(|id, _, _| id == "s2")
            .times(1)
            .return_once(|_, _, _| Ok(true));
        signer_repo
            .expect_count_signed()
            .times(1)
            .return_once(|_| Ok(2));

        let mut store = MockArtifactStore::new();
        store
            .expect_download()
            .withf(|key| key == "signed/Termo_de_Uso_100.pdf")
            .times(1)
            .return_once(|_| Ok(Bytes::from_static(b"stamped-1")));
        store.expect_upload().times(1).return_once(|_, _| Ok(()));

        let mut pdf = MockPdfComposer::new();
        pdf.expect_stamp_signature_block()
            .withf(|source, block| source == b"stamped-1" && block.signer_index == 1)
            .times(1)
            .return_once(|_, _| Ok(Bytes::from_static(b"stamped-2")));

        let mut notifier = MockCompletionNotifier::new();
        notifier
            .expect_envelope_completed()
            .withf(|n| n.signed_count == 2 && n.total_signers == 2)
            .times(1)
            .return_once(|_| Ok(()));

        let service = StampService::new(
            Arc::new(envelope_repo),
            Arc::new(signer_repo),
            Arc::new(store),
            Arc::new(pdf),
            Arc::new(notifier),
            "https://verify.example.com/d".to_string(),
        );

        // Act
        let outcome = service.stamp("doc-1", "s2").await.unwrap();

        // Assert
        assert_eq!(outcome.signed_count, 2);
        assert!(outcome.completed);
    }

    #[tokio::test]
    async fn stamping_a_signed_signer_is_rejected() {
        // Arrange
        let mut envelope_repo = MockEnvelopeRepository::new();
        envelope_repo
            .expect_get_by_document_id()
            .times(1)
            .return_once(|_| Ok(Some(simple_envelope(None, 1))));

        let mut signer_repo = MockSignerRepository::new();
        signer_repo.expect_list_by_document().times(1).return_once(|_| {
            Ok(vec![
                signer("s1", SignerStatus::Signed),
                signer("s2", SignerStatus::Pending),
            ])
        });

        let service = StampService::new(
            Arc::new(envelope_repo),
            Arc::new(signer_repo),
            Arc::new(MockArtifactStore::new()),
            Arc::new(MockPdfComposer::new()),
            Arc::new(MockCompletionNotifier::new()),
            "https://verify.example.com/d".to_string(),
        );

        // Act
        let result = service.stamp("doc-1", "s1").await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn provider_mode_envelope_cannot_be_stamped() {
        // Arrange
        let mut envelope_repo = MockEnvelopeRepository::new();
        envelope_repo
            .expect_get_by_document_id()
            .times(1)
            .return_once(|_| {
                let mut env = simple_envelope(None, 0);
                env.mode = SignatureMode::Provider;
                env.provider_envelope_id = Some("env-uuid".to_string());
                Ok(Some(env))
            });

        let service = StampService::new(
            Arc::new(envelope_repo),
            Arc::new(MockSignerRepository::new()),
            Arc::new(MockArtifactStore::new()),
            Arc::new(MockPdfComposer::new()),
            Arc::new(MockCompletionNotifier::new()),
            "https://verify.example.com/d".to_string(),
        );

        // Act
        let result = service.stamp("doc-1", "s1").await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidRequest(_))));
    }
}
