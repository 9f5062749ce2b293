use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::envelope::{
    CreateEnvelopeRecordInput, CreateSignerRecordInput, SignatureEnvelope, SignatureMode,
};
use crate::error::{DomainError, DomainResult};
use crate::provider::{
    CreateProviderEnvelopeInput, ProviderDocumentInput, ProviderSignerInput, SigningProvider,
};
use crate::repository::EnvelopeRepository;
use crate::store::ArtifactStore;

/// One requested signatory at envelope creation.
#[derive(Debug, Clone)]
pub struct NewSigner {
    pub name: String,
    pub email: String,
    pub national_id: Option<String>,
}

/// Service request for creating a signing envelope.
#[derive(Debug, Clone)]
pub struct CreateEnvelopeRequest {
    pub document_id: String,
    pub title: String,
    pub mode: SignatureMode,
    /// Object store key of the original PDF, already uploaded.
    pub source_artifact_key: String,
    pub signers: Vec<NewSigner>,
    /// Provider signature profile; ignored in simple mode.
    pub signature_profile: String,
}

/// Creates the signing session: hands the document to the provider
/// (provider mode) and persists the envelope with all signers pending.
pub struct CreateEnvelopeService {
    envelope_repository: Arc<dyn EnvelopeRepository>,
    provider: Arc<dyn SigningProvider>,
    artifact_store: Arc<dyn ArtifactStore>,
}

impl CreateEnvelopeService {
    pub fn new(
        envelope_repository: Arc<dyn EnvelopeRepository>,
        provider: Arc<dyn SigningProvider>,
        artifact_store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            envelope_repository,
            provider,
            artifact_store,
        }
    }

    pub async fn create(&self, request: CreateEnvelopeRequest) -> DomainResult<SignatureEnvelope> {
        if request.signers.is_empty() {
            return Err(DomainError::InvalidRequest(
                "an envelope needs at least one signer".to_string(),
            ));
        }

        let (provider_envelope_id, links) = match request.mode {
            SignatureMode::Provider => {
                let content = self
                    .artifact_store
                    .download(&request.source_artifact_key)
                    .await?;

                let created = self
                    .provider
                    .create_envelope(CreateProviderEnvelopeInput {
                        title: request.title.clone(),
                        signers: request
                            .signers
                            .iter()
                            .map(|s| ProviderSignerInput {
                                name: s.name.clone(),
                                email: s.email.clone(),
                                national_id: s.national_id.clone(),
                            })
                            .collect(),
                        documents: vec![ProviderDocumentInput {
                            name: request.title.clone(),
                            content,
                        }],
                        auto_close: true,
                        signature_profile: request.signature_profile.clone(),
                    })
                    .await?;

                info!(
                    document_id = %request.document_id,
                    provider_envelope_id = %created.envelope_id,
                    signers = created.signer_links.len(),
                    "Provider envelope created"
                );

                (Some(created.envelope_id), created.signer_links)
            }
            SignatureMode::Simple => (None, vec![]),
        };

        let signers = request
            .signers
            .iter()
            .map(|s| {
                // Provider links come back keyed by email
                let link = links
                    .iter()
                    .find(|l| l.email.eq_ignore_ascii_case(&s.email));
                CreateSignerRecordInput {
                    signer_id: Uuid::new_v4().to_string(),
                    name: s.name.clone(),
                    email: s.email.clone(),
                    national_id: s.national_id.clone(),
                    provider_nonce: link.and_then(|l| l.nonce.clone()),
                    sign_url: link.map(|l| l.sign_url.clone()),
                }
            })
            .collect();

        let envelope = self
            .envelope_repository
            .create_with_signers(CreateEnvelopeRecordInput {
                document_id: request.document_id,
                title: request.title,
                mode: request.mode,
                provider_envelope_id,
                source_artifact_key: request.source_artifact_key,
                signers,
            })
            .await?;

        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockSigningProvider, ProviderEnvelopeCreated, ProviderSignerLink};
    use crate::repository::MockEnvelopeRepository;
    use crate::store::MockArtifactStore;
    use bytes::Bytes;

    fn request(mode: SignatureMode) -> CreateEnvelopeRequest {
        CreateEnvelopeRequest {
            document_id: "doc-1".to_string(),
            title: "Contrato".to_string(),
            mode,
            source_artifact_key: "uploads/contrato.pdf".to_string(),
            signers: vec![
                NewSigner {
                    name: "Ana Souza".to_string(),
                    email: "ana@example.com".to_string(),
                    national_id: Some("12345678901".to_string()),
                },
                NewSigner {
                    name: "Bruno Lima".to_string(),
                    email: "bruno@example.com".to_string(),
                    national_id: None,
                },
            ],
            signature_profile: "ADVANCED".to_string(),
        }
    }

    fn persisted(input: &CreateEnvelopeRecordInput) -> SignatureEnvelope {
        SignatureEnvelope {
            document_id: input.document_id.clone(),
            title: input.title.clone(),
            mode: input.mode,
            provider_envelope_id: input.provider_envelope_id.clone(),
            provider_document_id: None,
            status: crate::envelope::EnvelopeStatus::Pending,
            signed_count: 0,
            total_signers: input.signers.len() as i32,
            source_artifact_key: input.source_artifact_key.clone(),
            signed_artifact_key: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn provider_mode_persists_nonces_and_links() {
        // Arrange
        let mut store = MockArtifactStore::new();
        store
            .expect_download()
            .withf(|key| key == "uploads/contrato.pdf")
            .times(1)
            .return_once(|_| Ok(Bytes::from_static(b"%PDF")));

        let mut provider = MockSigningProvider::new();
        provider
            .expect_create_envelope()
            .withf(|input: &CreateProviderEnvelopeInput| {
                input.signers.len() == 2 && input.documents.len() == 1 && input.auto_close
            })
            .times(1)
            .return_once(|_| {
                Ok(ProviderEnvelopeCreated {
                    envelope_id: "env-uuid".to_string(),
                    document_ids: vec!["pdoc-uuid".to_string()],
                    signer_links: vec![
                        ProviderSignerLink {
                            email: "ANA@example.com".to_string(),
                            nonce: Some("n1".to_string()),
                            sign_url: "https://sign.example.com/n1".to_string(),
                        },
                        ProviderSignerLink {
                            email: "bruno@example.com".to_string(),
                            nonce: Some("n2".to_string()),
                            sign_url: "https://sign.example.com/n2".to_string(),
                        },
                    ],
                })
            });

        let mut envelope_repo = MockEnvelopeRepository::new();
        envelope_repo
            .expect_create_with_signers()
            .withf(|input: &CreateEnvelopeRecordInput| {
                input.provider_envelope_id.as_deref() == Some("env-uuid")
                    && input.signers.len() == 2
                    && input.signers[0].provider_nonce.as_deref() == Some("n1")
                    && input.signers[1].sign_url.as_deref()
                        == Some("https://sign.example.com/n2")
            })
            .times(1)
            .return_once(|input| Ok(persisted(&input)));

        let service = CreateEnvelopeService::new(
            Arc::new(envelope_repo),
            Arc::new(provider),
            Arc::new(store),
        );

        // Act
        let envelope = service.create(request(SignatureMode::Provider)).await.unwrap();

        // Assert
        assert_eq!(envelope.provider_envelope_id.as_deref(), Some("env-uuid"));
        assert_eq!(envelope.total_signers, 2);
    }

    #[tokio::test]
    async fn simple_mode_skips_the_provider() {
        // Arrange: provider and store mocks have no expectations
        let mut envelope_repo = MockEnvelopeRepository::new();
        envelope_repo
            .expect_create_with_signers()
            .withf(|input: &CreateEnvelopeRecordInput| {
                input.provider_envelope_id.is_none()
                    && input.signers.iter().all(|s| s.provider_nonce.is_none())
            })
            .times(1)
            .return_once(|input| Ok(persisted(&input)));

        let service = CreateEnvelopeService::new(
            Arc::new(envelope_repo),
            Arc::new(MockSigningProvider::new()),
            Arc::new(MockArtifactStore::new()),
        );

        // Act
        let envelope = service.create(request(SignatureMode::Simple)).await.unwrap();

        // Assert
        assert!(envelope.provider_envelope_id.is_none());
    }

    #[tokio::test]
    async fn empty_signer_list_is_rejected() {
        // Arrange
        let mut req = request(SignatureMode::Simple);
        req.signers.clear();

        let service = CreateEnvelopeService::new(
            Arc::new(MockEnvelopeRepository::new()),
            Arc::new(MockSigningProvider::new()),
            Arc::new(MockArtifactStore::new()),
        );

        // Act
        let result = service.create(req).await;

        // Assert
        assert!(matches!(result, Err(DomainError::InvalidRequest(_))));
    }
}
