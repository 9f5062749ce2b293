use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::error::DomainResult;
use crate::reconcile_service::ReconcileService;
use crate::repository::EnvelopeRepository;

/// Summary of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepSummary {
    pub examined: usize,
    pub changed: usize,
    pub failed: usize,
}

/// Scheduled backstop that reconciles pending envelopes when webhooks are
/// lost. The selection criteria (pending status, bounded batch, most
/// recent first) is itself the retry policy: there is no separate retry
/// queue and no cutoff, failed envelopes simply come around again.
pub struct SweepService {
    envelope_repository: Arc<dyn EnvelopeRepository>,
    reconciler: Arc<ReconcileService>,
    batch_limit: i64,
    /// Pause between envelopes to respect provider rate limits.
    inter_call_delay: Duration,
}

impl SweepService {
    pub fn new(
        envelope_repository: Arc<dyn EnvelopeRepository>,
        reconciler: Arc<ReconcileService>,
        batch_limit: i64,
        inter_call_delay: Duration,
    ) -> Self {
        Self {
            envelope_repository,
            reconciler,
            batch_limit,
            inter_call_delay,
        }
    }

    /// Reconcile up to `batch_limit` pending envelopes in sequence.
    /// Per-envelope failures are logged and do not abort the pass.
    pub async fn run_once(&self) -> DomainResult<SweepSummary> {
        let pending = self
            .envelope_repository
            .list_pending(self.batch_limit)
            .await?;

        let mut summary = SweepSummary {
            examined: pending.len(),
            ..SweepSummary::default()
        };

        for (index, envelope) in pending.iter().enumerate() {
            if index > 0 && !self.inter_call_delay.is_zero() {
                tokio::time::sleep(self.inter_call_delay).await;
            }

            match self.reconciler.reconcile(&envelope.document_id).await {
                Ok(outcome) if outcome.changed => summary.changed += 1,
                Ok(_) => {}
                Err(e) => {
                    summary.failed += 1;
                    error!(
                        document_id = %envelope.document_id,
                        error = %e,
                        "Sweep reconciliation failed; envelope stays pending for the next pass"
                    );
                }
            }
        }

        Ok(summary)
    }
}
