//! Scheduled reconciliation backstop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use assina_domain::SweepService;

/// Periodic worker driving [`SweepService`] until cancelled.
pub struct SweepWorker {
    sweep: Arc<SweepService>,
    interval: Duration,
}

impl SweepWorker {
    pub fn new(sweep: Arc<SweepService>, interval: Duration) -> Self {
        Self { sweep, interval }
    }

    /// Run sweep passes on a fixed interval until the token is cancelled.
    /// A failed pass is logged and the loop continues; the next tick is
    /// the retry.
    pub async fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        info!(interval = ?self.interval, "Sweep worker started");

        let mut ticker = tokio::time::interval(self.interval);
        // First tick fires immediately; skip it so startup is quiet
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Sweep worker stopping gracefully");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    match self.sweep.run_once().await {
                        Ok(summary) => {
                            if summary.examined > 0 {
                                info!(
                                    examined = summary.examined,
                                    changed = summary.changed,
                                    failed = summary.failed,
                                    "Sweep pass finished"
                                );
                            }
                        }
                        Err(e) => {
                            error!(error = %e, "Sweep pass failed");
                        }
                    }
                }
            }
        }
    }
}
