use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;

use assina_domain::{
    CreateEnvelopeRequest, DomainError, NewSigner, ReconcileOutcome, SignatureEnvelope,
    SignatureMode,
};

use crate::error::ApiError;
use crate::state::ApiState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSignerBody {
    pub name: String,
    pub email: String,
    pub national_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    pub document_id: String,
    pub title: String,
    pub mode: String,
    pub source_artifact_key: String,
    #[serde(default = "default_signature_profile")]
    pub signature_profile: String,
    pub signers: Vec<CreateSignerBody>,
}

fn default_signature_profile() -> String {
    "ADVANCED".to_string()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeBody {
    pub success: bool,
    pub document_id: String,
    pub title: String,
    pub mode: String,
    pub provider_envelope_id: Option<String>,
    pub status: String,
    pub signed_count: i32,
    pub total_signers: i32,
}

impl EnvelopeBody {
    fn from_envelope(envelope: SignatureEnvelope) -> Self {
        Self {
            success: true,
            document_id: envelope.document_id,
            title: envelope.title,
            mode: envelope.mode.as_str().to_string(),
            provider_envelope_id: envelope.provider_envelope_id,
            status: envelope.status.as_str().to_string(),
            signed_count: envelope.signed_count,
            total_signers: envelope.total_signers,
        }
    }
}

pub async fn create(
    State(state): State<ApiState>,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<EnvelopeBody>), ApiError> {
    debug!(document_id = %body.document_id, "Create envelope request");

    let mode = SignatureMode::parse(&body.mode)
        .ok_or_else(|| DomainError::InvalidRequest(format!("unknown mode: {}", body.mode)))?;

    let envelope = state
        .create
        .create(CreateEnvelopeRequest {
            document_id: body.document_id,
            title: body.title,
            mode,
            source_artifact_key: body.source_artifact_key,
            signers: body
                .signers
                .into_iter()
                .map(|signer| NewSigner {
                    name: signer.name,
                    email: signer.email,
                    national_id: signer.national_id,
                })
                .collect(),
            signature_profile: body.signature_profile,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(EnvelopeBody::from_envelope(envelope))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StampBody {
    pub document_id: String,
    pub signer_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StampResponse {
    pub success: bool,
    pub artifact_key: String,
    pub signed_count: i32,
    pub total_signers: i32,
    pub completed: bool,
}

pub async fn stamp(
    State(state): State<ApiState>,
    Json(body): Json<StampBody>,
) -> Result<Json<StampResponse>, ApiError> {
    debug!(document_id = %body.document_id, signer_id = %body.signer_id, "Stamp request");

    let outcome = state.stamp.stamp(&body.document_id, &body.signer_id).await?;

    Ok(Json(StampResponse {
        success: true,
        artifact_key: outcome.artifact_key,
        signed_count: outcome.signed_count,
        total_signers: outcome.total_signers,
        completed: outcome.completed,
    }))
}

/// Sync accepts a single document or a batch; exactly one of the two keys.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBody {
    pub document_id: Option<String>,
    pub document_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub success: bool,
    pub signed_count: i32,
    pub total_signers: i32,
    pub completed: bool,
    pub changed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncItem {
    pub document_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_signers: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBatchResponse {
    pub success: bool,
    pub results: Vec<SyncItem>,
    pub total_changed: usize,
}

pub async fn sync(
    State(state): State<ApiState>,
    Json(body): Json<SyncBody>,
) -> Result<Response, ApiError> {
    match (body.document_id, body.document_ids) {
        (Some(document_id), None) => {
            debug!(document_id = %document_id, "On-demand sync request");

            let outcome = state.reconcile.reconcile(&document_id).await?;

            Ok(Json(single_response(outcome)).into_response())
        }
        (None, Some(document_ids)) => {
            debug!(documents = document_ids.len(), "Batch sync request");

            let results = state.reconcile.reconcile_batch(&document_ids).await;

            let mut items = Vec::with_capacity(results.len());
            let mut total_changed = 0;
            for (document_id, result) in results {
                items.push(match result {
                    Ok(outcome) => {
                        if outcome.changed {
                            total_changed += 1;
                        }
                        SyncItem {
                            document_id,
                            success: true,
                            signed_count: Some(outcome.signed_count),
                            total_signers: Some(outcome.total_signers),
                            completed: Some(outcome.completed),
                            changed: Some(outcome.changed),
                            error: None,
                        }
                    }
                    Err(e) => SyncItem {
                        document_id,
                        success: false,
                        signed_count: None,
                        total_signers: None,
                        completed: None,
                        changed: None,
                        error: Some(e.to_string()),
                    },
                });
            }

            Ok(Json(SyncBatchResponse {
                success: true,
                results: items,
                total_changed,
            })
            .into_response())
        }
        _ => Err(DomainError::InvalidRequest(
            "provide exactly one of documentId or documentIds".to_string(),
        )
        .into()),
    }
}

fn single_response(outcome: ReconcileOutcome) -> SyncResponse {
    SyncResponse {
        success: true,
        signed_count: outcome.signed_count,
        total_signers: outcome.total_signers,
        completed: outcome.completed,
        changed: outcome.changed,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBody {
    pub document_id: String,
}

pub async fn evidence(
    State(state): State<ApiState>,
    Json(body): Json<EvidenceBody>,
) -> Result<Response, ApiError> {
    debug!(document_id = %body.document_id, "Evidence assembly request");

    let artifact = state.evidence.assemble(&body.document_id).await?;

    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}
