use std::sync::Arc;

use assina_domain::{
    CreateEnvelopeService, EvidenceService, ReconcileService, StampService,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub reconcile: Arc<ReconcileService>,
    pub evidence: Arc<EvidenceService>,
    pub stamp: Arc<StampService>,
    pub create: Arc<CreateEnvelopeService>,
}

impl ApiState {
    pub fn new(
        reconcile: Arc<ReconcileService>,
        evidence: Arc<EvidenceService>,
        stamp: Arc<StampService>,
        create: Arc<CreateEnvelopeService>,
    ) -> Self {
        Self {
            reconcile,
            evidence,
            stamp,
            create,
        }
    }
}
