use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Envelope not found for document: {0}")]
    EnvelopeNotFound(String),

    #[error("No envelope matches provider uuid: {0}")]
    ProviderEnvelopeNotFound(String),

    #[error("Envelope already exists for document: {0}")]
    EnvelopeAlreadyExists(String),

    #[error("Document has no provider envelope to reconcile: {0}")]
    MissingProviderEnvelope(String),

    #[error("Provider document id could not be resolved for document: {0}")]
    UnresolvedProviderDocument(String),

    #[error("Signed artifact not available for document: {0}")]
    ArtifactNotAvailable(String),

    #[error("Signer not found: {0}")]
    SignerNotFound(String),

    #[error("Provider returned status {status}: {body}")]
    Provider { status: u16, body: String },

    #[error("Provider unreachable: {0}")]
    ProviderUnreachable(#[source] anyhow::Error),

    #[error("Signer updates applied but artifact fetch failed for document {document_id}: {source}")]
    PartialFailure {
        document_id: String,
        #[source]
        source: Box<DomainError>,
    },

    #[error("PDF assembly error: {0}")]
    Assembly(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[source] anyhow::Error),

    #[error("Notification error: {0}")]
    Notification(#[source] anyhow::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] anyhow::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
