use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use assina_domain::DomainError;

/// Error payload shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

/// Handler-level error: a domain error plus its HTTP mapping.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::EnvelopeNotFound(_)
            | DomainError::ProviderEnvelopeNotFound(_)
            | DomainError::SignerNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::InvalidRequest(_) | DomainError::MissingProviderEnvelope(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::EnvelopeAlreadyExists(_) | DomainError::ArtifactNotAvailable(_) => {
                StatusCode::CONFLICT
            }
            DomainError::Provider { .. } | DomainError::ProviderUnreachable(_) => {
                StatusCode::BAD_GATEWAY
            }
            DomainError::UnresolvedProviderDocument(_)
            | DomainError::PartialFailure { .. }
            | DomainError::Assembly(_)
            | DomainError::Storage(_)
            | DomainError::Notification(_)
            | DomainError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        }

        let body = ErrorBody {
            success: false,
            error: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
