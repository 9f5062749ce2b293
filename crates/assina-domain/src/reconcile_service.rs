use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::envelope::{EnvelopeStatus, ReconcileOutcome, SignatureEnvelope};
use crate::error::{DomainError, DomainResult};
use crate::format::sanitize_filename;
use crate::provider::{ProviderEnvelopeState, SigningProvider};
use crate::repository::{EnvelopeRepository, SignerRepository};
use crate::signer::SignerStatus;
use crate::store::{ArtifactStore, CompletionNotice, CompletionNotifier};

/// Domain service that reconciles local envelope state against the
/// provider's snapshot.
///
/// All three triggers (webhook, scheduled sweep, on-demand sync) call into
/// this one function. Every write is a conditional update keyed on current
/// status, so concurrent invocations on the same envelope degrade to
/// no-ops: at most one observes each pending -> signed row transition.
pub struct ReconcileService {
    envelope_repository: Arc<dyn EnvelopeRepository>,
    signer_repository: Arc<dyn SignerRepository>,
    provider: Arc<dyn SigningProvider>,
    artifact_store: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn CompletionNotifier>,
}

impl ReconcileService {
    pub fn new(
        envelope_repository: Arc<dyn EnvelopeRepository>,
        signer_repository: Arc<dyn SignerRepository>,
        provider: Arc<dyn SigningProvider>,
        artifact_store: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn CompletionNotifier>,
    ) -> Self {
        Self {
            envelope_repository,
            signer_repository,
            provider,
            artifact_store,
            notifier,
        }
    }

    /// Fetch provider state for the envelope owning `document_id` and apply
    /// it idempotently to the local records.
    pub async fn reconcile(&self, document_id: &str) -> DomainResult<ReconcileOutcome> {
        debug!(document_id = %document_id, "Reconciling envelope");

        // 1. Load local envelope; nothing to reconcile without a provider envelope
        let envelope = self
            .envelope_repository
            .get_by_document_id(document_id)
            .await?
            .ok_or_else(|| DomainError::EnvelopeNotFound(document_id.to_string()))?;

        let provider_envelope_id = envelope
            .provider_envelope_id
            .clone()
            .ok_or_else(|| DomainError::MissingProviderEnvelope(document_id.to_string()))?;

        // 2. Fetch provider snapshot. Failure aborts before any local write.
        let state = self.provider.envelope_state(&provider_envelope_id).await?;

        debug!(
            document_id = %document_id,
            provider_envelope_id = %provider_envelope_id,
            provider_completed = state.completed,
            provider_signers = state.signers.len(),
            "Fetched provider envelope state"
        );

        let mut changed = false;

        // 3. Resolve the provider document id lazily; stable once found
        let provider_document_id = match envelope.provider_document_id.clone() {
            Some(id) => Some(id),
            None => {
                let resolved = resolve_provider_document_id(&envelope, &state);
                if let Some(ref id) = resolved {
                    if self
                        .envelope_repository
                        .set_provider_document_id(document_id, id)
                        .await?
                    {
                        changed = true;
                    }
                    info!(
                        document_id = %document_id,
                        provider_document_id = %id,
                        "Resolved provider document id"
                    );
                }
                resolved
            }
        };

        // 4. Apply completed provider signers with conditional updates
        let signers = self.signer_repository.list_by_document(document_id).await?;
        for remote in state.signers.iter().filter(|s| s.completed) {
            let local = signers.iter().find(|l| {
                l.matches_provider_identity(remote.nonce.as_deref(), remote.email.as_deref())
            });

            let Some(local) = local else {
                warn!(
                    document_id = %document_id,
                    nonce = remote.nonce.as_deref().unwrap_or("-"),
                    email = remote.email.as_deref().unwrap_or("-"),
                    "Provider signer has no local match"
                );
                continue;
            };

            if local.status == SignerStatus::Signed {
                continue;
            }

            let signed_at = remote.signed_at.unwrap_or_else(Utc::now);
            if self
                .signer_repository
                .mark_signed(&local.signer_id, signed_at, remote.signing_ip.clone())
                .await?
            {
                info!(
                    document_id = %document_id,
                    signer_id = %local.signer_id,
                    "Signer transitioned to signed"
                );
                changed = true;
            }
        }

        // 5. Recompute the aggregate from the signer rows
        let signed_count = self.signer_repository.count_signed(document_id).await?;
        let signed_count = i32::try_from(signed_count)
            .map_err(|_| DomainError::Repository(anyhow::anyhow!("signed count out of range")))?;
        if signed_count != envelope.signed_count {
            self.envelope_repository
                .update_signed_count(document_id, signed_count)
                .await?;
            changed = true;
        }

        // 6. Complete the envelope only when the provider flag and the local
        //    count agree, and only with a stored artifact
        let mut completed = envelope.status == EnvelopeStatus::Signed;
        if state.completed && envelope.status == EnvelopeStatus::Pending {
            if signed_count == envelope.total_signers {
                let marked = self
                    .fetch_and_store_artifact(
                        &envelope,
                        &provider_envelope_id,
                        provider_document_id.as_deref(),
                        signed_count,
                    )
                    .await?;
                completed = true;
                changed = changed || marked;
            } else {
                warn!(
                    document_id = %document_id,
                    signed_count,
                    total_signers = envelope.total_signers,
                    "Provider reports envelope complete but local count disagrees"
                );
            }
        }

        // 7. Result record
        Ok(ReconcileOutcome {
            changed,
            signed_count,
            total_signers: envelope.total_signers,
            completed,
        })
    }

    /// Webhook entry point: resolve the envelope by provider uuid, then run
    /// the full reconciliation. The webhook payload is only a trigger,
    /// never a source of truth.
    pub async fn reconcile_by_provider_envelope(
        &self,
        provider_envelope_id: &str,
    ) -> DomainResult<ReconcileOutcome> {
        let envelope = self
            .envelope_repository
            .get_by_provider_envelope_id(provider_envelope_id)
            .await?
            .ok_or_else(|| {
                DomainError::ProviderEnvelopeNotFound(provider_envelope_id.to_string())
            })?;

        self.reconcile(&envelope.document_id).await
    }

    /// On-demand batch sync: per-envelope results, failures do not abort
    /// the rest of the batch.
    pub async fn reconcile_batch(
        &self,
        document_ids: &[String],
    ) -> Vec<(String, DomainResult<ReconcileOutcome>)> {
        let mut results = Vec::with_capacity(document_ids.len());
        for document_id in document_ids {
            let result = self.reconcile(document_id).await;
            if let Err(ref e) = result {
                warn!(document_id = %document_id, error = %e, "Batch reconcile entry failed");
            }
            results.push((document_id.clone(), result));
        }
        results
    }

    /// Download and persist the signed document, then mark the envelope.
    /// Returns whether this invocation performed the transition.
    ///
    /// A download or upload failure surfaces as `PartialFailure`: signer
    /// updates from earlier steps are kept and the envelope stays pending
    /// so a later reconciliation retries the fetch.
    async fn fetch_and_store_artifact(
        &self,
        envelope: &SignatureEnvelope,
        provider_envelope_id: &str,
        provider_document_id: Option<&str>,
        signed_count: i32,
    ) -> DomainResult<bool> {
        let document_id = envelope.document_id.as_str();

        let partial = |source: DomainError| DomainError::PartialFailure {
            document_id: document_id.to_string(),
            source: Box::new(source),
        };

        let provider_document_id = provider_document_id
            .ok_or_else(|| partial(DomainError::UnresolvedProviderDocument(document_id.to_string())))?;

        let bytes = self
            .provider
            .download_signed_document(provider_envelope_id, provider_document_id)
            .await
            .map_err(partial)?;

        // Deterministic key: re-running the completion step overwrites the
        // same object.
        let key = format!(
            "signed/{}/{}.pdf",
            document_id,
            sanitize_filename(&envelope.title)
        );
        self.artifact_store
            .upload(&key, bytes)
            .await
            .map_err(partial)?;

        let marked = self.envelope_repository.mark_signed(document_id, &key).await?;
        if marked {
            info!(
                document_id = %document_id,
                artifact_key = %key,
                "Envelope completed, artifact stored"
            );
            let notice = CompletionNotice {
                document_id: document_id.to_string(),
                title: envelope.title.clone(),
                signed_count,
                total_signers: envelope.total_signers,
                completed_at: Utc::now(),
            };
            // Best effort: notification failures never fail reconciliation
            if let Err(e) = self.notifier.envelope_completed(notice).await {
                warn!(document_id = %document_id, error = %e, "Completion notification failed");
            }
        } else {
            debug!(
                document_id = %document_id,
                "Envelope already marked signed by a concurrent reconciliation"
            );
        }

        Ok(marked)
    }
}

/// Resolve the provider's per-document id from its document list: exact
/// name match on the stored title first, positional fallback only for
/// single-document envelopes.
fn resolve_provider_document_id(
    envelope: &SignatureEnvelope,
    state: &ProviderEnvelopeState,
) -> Option<String> {
    if let Some(doc) = state
        .documents
        .iter()
        .find(|d| d.name.as_deref() == Some(envelope.title.as_str()))
    {
        return Some(doc.id.clone());
    }
    if state.documents.len() == 1 {
        return Some(state.documents[0].id.clone());
    }
    None
}
