use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::ApiState;

/// Provider push notification. Only the envelope uuid is trusted; the
/// event name and signer hints are logged and otherwise ignored, every
/// webhook triggers a full reconcile of the envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookBody {
    #[serde(default)]
    pub event: Option<String>,
    pub uuid: String,
    #[serde(default)]
    pub signer_nonce: Option<String>,
    #[serde(default)]
    pub signer_email: Option<String>,
    #[serde(default)]
    pub document_uuid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
}

pub async fn signature(
    State(state): State<ApiState>,
    Json(body): Json<WebhookBody>,
) -> Result<Json<WebhookResponse>, ApiError> {
    debug!(
        uuid = %body.uuid,
        event = body.event.as_deref().unwrap_or("-"),
        "Signature webhook received"
    );

    let outcome = state.reconcile.reconcile_by_provider_envelope(&body.uuid).await?;

    info!(
        uuid = %body.uuid,
        changed = outcome.changed,
        completed = outcome.completed,
        "Webhook reconciled"
    );

    Ok(Json(WebhookResponse { success: true }))
}
