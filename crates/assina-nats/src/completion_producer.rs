use anyhow::anyhow;
use async_nats::jetstream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use assina_domain::{CompletionNotice, CompletionNotifier, DomainError, DomainResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompletionEvent<'a> {
    document_id: &'a str,
    title: &'a str,
    signed_count: i32,
    total_signers: i32,
    completed_at: DateTime<Utc>,
}

/// Publishes envelope completion events to JetStream.
pub struct CompletionEventProducer {
    jetstream: jetstream::Context,
    base_subject: String,
}

impl CompletionEventProducer {
    pub fn new(jetstream: jetstream::Context, base_subject: String) -> Self {
        info!(
            "Created CompletionEventProducer with base subject: {}",
            base_subject
        );
        Self {
            jetstream,
            base_subject,
        }
    }
}

#[async_trait]
impl CompletionNotifier for CompletionEventProducer {
    async fn envelope_completed(&self, notice: CompletionNotice) -> DomainResult<()> {
        let event = CompletionEvent {
            document_id: &notice.document_id,
            title: &notice.title,
            signed_count: notice.signed_count,
            total_signers: notice.total_signers,
            completed_at: notice.completed_at,
        };

        let payload = serde_json::to_vec(&event)
            .map_err(|e| DomainError::Notification(anyhow!("failed to encode event: {e}")))?;

        // Subject: {base_subject}.{document_id}
        let subject = format!("{}.{}", self.base_subject, notice.document_id);

        debug!(
            subject = %subject,
            document_id = %notice.document_id,
            size_bytes = payload.len(),
            "Publishing completion event"
        );

        let ack = self
            .jetstream
            .publish(subject.clone(), payload.into())
            .await
            .map_err(|e| DomainError::Notification(anyhow!("failed to publish event: {e}")))?;

        ack.await
            .map_err(|e| DomainError::Notification(anyhow!("failed to receive ack: {e}")))?;

        debug!(
            subject = %subject,
            document_id = %notice.document_id,
            "Completion event published and acknowledged"
        );

        Ok(())
    }
}
