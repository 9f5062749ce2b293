//! Wire shapes for the provider REST API.
//!
//! The provider serves the same facts under different key names depending
//! on endpoint generation. Every loose concern is modeled as a set of
//! optional fields plus one resolution function trying the known keys in
//! fixed priority order.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use assina_domain::{
    ProviderDocumentState, ProviderEnvelopeState, ProviderSignerLink, ProviderSignerState,
};

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateEnvelopeRequest {
    pub titulo: String,
    pub fechamento_automatico: bool,
    pub perfil_assinatura: String,
    pub signatarios: Vec<SignerRequest>,
    pub documentos: Vec<DocumentRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignerRequest {
    pub nome: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentRequest {
    pub nome_documento: String,
    /// Base64 of the raw PDF bytes.
    pub conteudo: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvelopeCreatedResponse {
    uuid: Option<String>,
    uuid_envelope: Option<String>,
    #[serde(default)]
    pub documentos: Vec<DocumentEntry>,
    #[serde(default)]
    pub signatarios: Vec<SignerLinkEntry>,
}

impl EnvelopeCreatedResponse {
    /// Envelope uuid: `uuid`, then `uuidEnvelope`.
    pub fn envelope_id(&self) -> Option<&str> {
        self.uuid
            .as_deref()
            .or(self.uuid_envelope.as_deref())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DocumentEntry {
    uuid_documento: Option<String>,
    uuid: Option<String>,
    nome_documento: Option<String>,
    nome: Option<String>,
}

impl DocumentEntry {
    /// Document uuid: `uuidDocumento`, then `uuid`.
    pub fn document_id(&self) -> Option<&str> {
        self.uuid_documento
            .as_deref()
            .or(self.uuid.as_deref())
            .filter(|value| !value.is_empty())
    }

    /// Document name: `nomeDocumento`, then `nome`.
    pub fn name(&self) -> Option<&str> {
        self.nome_documento.as_deref().or(self.nome.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignerLinkEntry {
    pub email: String,
    nonce: Option<String>,
    chave: Option<String>,
    link_assinatura: Option<String>,
    url: Option<String>,
}

impl SignerLinkEntry {
    /// Signer nonce: `nonce`, then `chave`.
    pub fn nonce(&self) -> Option<&str> {
        self.nonce
            .as_deref()
            .or(self.chave.as_deref())
            .filter(|value| !value.is_empty())
    }

    /// Signing link: `linkAssinatura`, then `url`.
    pub fn sign_url(&self) -> Option<&str> {
        self.link_assinatura.as_deref().or(self.url.as_deref())
    }

    pub fn into_domain(self) -> ProviderSignerLink {
        ProviderSignerLink {
            nonce: self.nonce().map(str::to_string),
            sign_url: self.sign_url().unwrap_or_default().to_string(),
            email: self.email,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EnvelopeStateResponse {
    status: Option<String>,
    situacao: Option<String>,
    concluido: Option<bool>,
    #[serde(default)]
    signatarios: Vec<SignerStateEntry>,
    #[serde(default)]
    participantes: Vec<SignerStateEntry>,
    #[serde(default)]
    pub documentos: Vec<DocumentEntry>,
}

impl EnvelopeStateResponse {
    /// Envelope completion: boolean `concluido`, then textual
    /// `status`/`situacao` equal to a terminal value.
    fn completed(&self) -> bool {
        if let Some(done) = self.concluido {
            return done;
        }
        self.status
            .as_deref()
            .or(self.situacao.as_deref())
            .map(is_terminal_status)
            .unwrap_or(false)
    }

    /// Signer entries: `signatarios`, then `participantes`.
    fn signers(self) -> Vec<SignerStateEntry> {
        if self.signatarios.is_empty() {
            self.participantes
        } else {
            self.signatarios
        }
    }

    pub fn into_domain(self) -> ProviderEnvelopeState {
        let completed = self.completed();
        let documents = self
            .documentos
            .iter()
            .filter_map(|entry| {
                entry.document_id().map(|id| ProviderDocumentState {
                    id: id.to_string(),
                    name: entry.name().map(str::to_string),
                })
            })
            .collect();

        ProviderEnvelopeState {
            completed,
            signers: self
                .signers()
                .into_iter()
                .map(SignerStateEntry::into_domain)
                .collect(),
            documents,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SignerStateEntry {
    nonce: Option<String>,
    chave: Option<String>,
    email: Option<String>,
    status: Option<String>,
    situacao: Option<String>,
    assinado: Option<bool>,
    data_assinatura: Option<String>,
    assinado_em: Option<String>,
    ip_assinatura: Option<String>,
    ip: Option<String>,
}

impl SignerStateEntry {
    /// Signer completion: boolean `assinado`, then textual
    /// `status`/`situacao`.
    fn completed(&self) -> bool {
        if let Some(done) = self.assinado {
            return done;
        }
        self.status
            .as_deref()
            .or(self.situacao.as_deref())
            .map(is_terminal_status)
            .unwrap_or(false)
    }

    /// Signing timestamp: `dataAssinatura`, then `assinadoEm`.
    fn signed_at(&self) -> Option<DateTime<Utc>> {
        self.data_assinatura
            .as_deref()
            .or(self.assinado_em.as_deref())
            .and_then(parse_provider_timestamp)
    }

    pub fn into_domain(self) -> ProviderSignerState {
        let completed = self.completed();
        let signed_at = self.signed_at();
        ProviderSignerState {
            nonce: self
                .nonce
                .or(self.chave)
                .filter(|value| !value.is_empty()),
            email: self.email,
            completed,
            signed_at,
            // ip: `ipAssinatura`, then `ip`
            signing_ip: self.ip_assinatura.or(self.ip),
        }
    }
}

fn is_terminal_status(status: &str) -> bool {
    matches!(
        status.to_ascii_uppercase().as_str(),
        "CONCLUIDO" | "FINALIZADO" | "ASSINADO"
    )
}

/// RFC 3339 first, then the provider's zoneless `%Y-%m-%dT%H:%M:%S`
/// variant read as UTC.
fn parse_provider_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
