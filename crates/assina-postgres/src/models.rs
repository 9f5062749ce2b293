use anyhow::anyhow;
use assina_domain::{
    DomainError, DomainResult, EnvelopeSigner, EnvelopeStatus, SignatureEnvelope, SignatureMode,
    SignerStatus,
};
use chrono::{DateTime, Utc};
use tokio_postgres::Row;

/// Column order of every envelope SELECT in this crate.
pub const ENVELOPE_COLUMNS: &str = "document_id, title, mode, provider_envelope_id, \
     provider_document_id, status, signed_count, total_signers, \
     source_artifact_key, signed_artifact_key, created_at, updated_at";

/// Column order of every signer SELECT in this crate.
pub const SIGNER_COLUMNS: &str = "signer_id, document_id, name, email, national_id, \
     provider_nonce, sign_url, status, signed_at, signing_ip, geolocation, \
     created_at, updated_at";

pub struct EnvelopeRow {
    pub document_id: String,
    pub title: String,
    pub mode: String,
    pub provider_envelope_id: Option<String>,
    pub provider_document_id: Option<String>,
    pub status: String,
    pub signed_count: i32,
    pub total_signers: i32,
    pub source_artifact_key: String,
    pub signed_artifact_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EnvelopeRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            document_id: row.get(0),
            title: row.get(1),
            mode: row.get(2),
            provider_envelope_id: row.get(3),
            provider_document_id: row.get(4),
            status: row.get(5),
            signed_count: row.get(6),
            total_signers: row.get(7),
            source_artifact_key: row.get(8),
            signed_artifact_key: row.get(9),
            created_at: row.get(10),
            updated_at: row.get(11),
        }
    }

    pub fn into_domain(self) -> DomainResult<SignatureEnvelope> {
        let mode = SignatureMode::parse(&self.mode)
            .ok_or_else(|| DomainError::Repository(anyhow!("unknown mode: {}", self.mode)))?;
        let status = EnvelopeStatus::parse(&self.status)
            .ok_or_else(|| DomainError::Repository(anyhow!("unknown status: {}", self.status)))?;

        Ok(SignatureEnvelope {
            document_id: self.document_id,
            title: self.title,
            mode,
            provider_envelope_id: self.provider_envelope_id,
            provider_document_id: self.provider_document_id,
            status,
            signed_count: self.signed_count,
            total_signers: self.total_signers,
            source_artifact_key: self.source_artifact_key,
            signed_artifact_key: self.signed_artifact_key,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}

pub struct SignerRow {
    pub signer_id: String,
    pub document_id: String,
    pub name: String,
    pub email: String,
    pub national_id: Option<String>,
    pub provider_nonce: Option<String>,
    pub sign_url: Option<String>,
    pub status: String,
    pub signed_at: Option<DateTime<Utc>>,
    pub signing_ip: Option<String>,
    pub geolocation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SignerRow {
    pub fn from_row(row: &Row) -> Self {
        Self {
            signer_id: row.get(0),
            document_id: row.get(1),
            name: row.get(2),
            email: row.get(3),
            national_id: row.get(4),
            provider_nonce: row.get(5),
            sign_url: row.get(6),
            status: row.get(7),
            signed_at: row.get(8),
            signing_ip: row.get(9),
            geolocation: row.get(10),
            created_at: row.get(11),
            updated_at: row.get(12),
        }
    }

    pub fn into_domain(self) -> DomainResult<EnvelopeSigner> {
        let status = SignerStatus::parse(&self.status)
            .ok_or_else(|| DomainError::Repository(anyhow!("unknown status: {}", self.status)))?;

        Ok(EnvelopeSigner {
            signer_id: self.signer_id,
            document_id: self.document_id,
            name: self.name,
            email: self.email,
            national_id: self.national_id,
            provider_nonce: self.provider_nonce,
            sign_url: self.sign_url,
            status,
            signed_at: self.signed_at,
            signing_ip: self.signing_ip,
            geolocation: self.geolocation,
            created_at: Some(self.created_at),
            updated_at: Some(self.updated_at),
        })
    }
}
