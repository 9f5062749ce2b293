use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use tracing::{debug, info};

use assina_domain::{
    CreateProviderEnvelopeInput, DomainError, DomainResult, ProviderEnvelopeCreated,
    ProviderEnvelopeState, SigningProvider,
};

use crate::config::ProviderConfig;
use crate::dto::{
    CreateEnvelopeRequest, DocumentRequest, EnvelopeCreatedResponse, EnvelopeStateResponse,
    SignerRequest, TokenResponse,
};

/// BRy-style REST client for the signing provider.
///
/// Tokens are short-lived client-credentials bearers fetched per logical
/// operation; there is no cross-request cache. Retry policy belongs to the
/// callers, so any non-success status surfaces unchanged.
pub struct BryProviderClient {
    http: reqwest::Client,
    config: ProviderConfig,
}

impl BryProviderClient {
    pub fn new(config: ProviderConfig) -> DomainResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| DomainError::ProviderUnreachable(anyhow!(e)))?;

        Ok(Self { http, config })
    }

    async fn authenticate(&self) -> DomainResult<String> {
        debug!("Requesting provider access token");

        let response = self
            .http
            .post(format!("{}/token", self.config.auth_url))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(transport_error)?;

        let token: TokenResponse = check(response).await?.json().await.map_err(malformed)?;

        Ok(token.access_token)
    }

    fn envelope_url(&self, path: &str) -> String {
        format!("{}/v2/envelopes{}", self.config.base_url, path)
    }

    async fn download(&self, url: String) -> DomainResult<Bytes> {
        let token = self.authenticate().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        check(response).await?.bytes().await.map_err(malformed)
    }
}

#[async_trait]
impl SigningProvider for BryProviderClient {
    async fn create_envelope(
        &self,
        input: CreateProviderEnvelopeInput,
    ) -> DomainResult<ProviderEnvelopeCreated> {
        debug!(title = %input.title, signers = input.signers.len(), "Creating provider envelope");

        let token = self.authenticate().await?;

        let request = CreateEnvelopeRequest {
            titulo: input.title,
            fechamento_automatico: input.auto_close,
            perfil_assinatura: input.signature_profile,
            signatarios: input
                .signers
                .into_iter()
                .map(|signer| SignerRequest {
                    nome: signer.name,
                    email: signer.email,
                    cpf: signer.national_id,
                })
                .collect(),
            documentos: input
                .documents
                .into_iter()
                .map(|document| DocumentRequest {
                    nome_documento: document.name,
                    conteudo: base64::engine::general_purpose::STANDARD.encode(&document.content),
                })
                .collect(),
        };

        let response = self
            .http
            .post(self.envelope_url(""))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let created: EnvelopeCreatedResponse =
            check(response).await?.json().await.map_err(malformed)?;

        let envelope_id = created
            .envelope_id()
            .ok_or_else(|| {
                DomainError::ProviderUnreachable(anyhow!(
                    "creation response carries no envelope uuid"
                ))
            })?
            .to_string();

        let document_ids = created
            .documentos
            .iter()
            .filter_map(|entry| entry.document_id().map(str::to_string))
            .collect();

        let signer_links = created
            .signatarios
            .into_iter()
            .map(|entry| entry.into_domain())
            .collect();

        info!(envelope_id = %envelope_id, "Provider envelope created");

        Ok(ProviderEnvelopeCreated {
            envelope_id,
            document_ids,
            signer_links,
        })
    }

    async fn envelope_state(
        &self,
        provider_envelope_id: &str,
    ) -> DomainResult<ProviderEnvelopeState> {
        debug!(envelope_id = %provider_envelope_id, "Fetching provider envelope state");

        let token = self.authenticate().await?;

        let response = self
            .http
            .get(self.envelope_url(&format!("/{provider_envelope_id}")))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport_error)?;

        let state: EnvelopeStateResponse =
            check(response).await?.json().await.map_err(malformed)?;

        Ok(state.into_domain())
    }

    async fn download_signed_document(
        &self,
        provider_envelope_id: &str,
        provider_document_id: &str,
    ) -> DomainResult<Bytes> {
        debug!(
            envelope_id = %provider_envelope_id,
            document_id = %provider_document_id,
            "Downloading signed document"
        );

        self.download(self.envelope_url(&format!(
            "/{provider_envelope_id}/documents/{provider_document_id}/signed"
        )))
        .await
    }

    async fn download_unified_report(
        &self,
        provider_envelope_id: &str,
        provider_document_id: &str,
    ) -> DomainResult<Bytes> {
        debug!(
            envelope_id = %provider_envelope_id,
            document_id = %provider_document_id,
            "Downloading unified evidence report"
        );

        self.download(self.envelope_url(&format!(
            "/{provider_envelope_id}/documents/{provider_document_id}/unified-report"
        )))
        .await
    }
}

/// Non-success statuses surface with the upstream status and raw body.
async fn check(response: reqwest::Response) -> DomainResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(DomainError::Provider {
        status: status.as_u16(),
        body,
    })
}

fn transport_error(e: reqwest::Error) -> DomainError {
    DomainError::ProviderUnreachable(anyhow!(e))
}

fn malformed(e: reqwest::Error) -> DomainError {
    DomainError::ProviderUnreachable(anyhow!("malformed provider response: {e}"))
}
