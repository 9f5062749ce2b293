pub mod create_envelope_service;
pub mod envelope;
pub mod error;
pub mod evidence_service;
pub mod format;
pub mod provider;
pub mod reconcile_service;
pub mod repository;
pub mod signer;
pub mod stamp_service;
pub mod store;
pub mod sweep_service;

pub use create_envelope_service::{CreateEnvelopeRequest, CreateEnvelopeService, NewSigner};
pub use envelope::*;
pub use error::{DomainError, DomainResult};
pub use evidence_service::{EvidenceArtifact, EvidenceService};
pub use format::*;
pub use provider::*;
pub use reconcile_service::ReconcileService;
pub use repository::{EnvelopeRepository, SignerRepository};
pub use signer::*;
pub use stamp_service::{StampOutcome, StampService};
pub use store::{
    ArtifactStore, CompletionNotice, CompletionNotifier, EvidenceReport, EvidenceRow, PdfComposer,
    SignatureBlock,
};
pub use sweep_service::{SweepService, SweepSummary};

#[cfg(any(test, feature = "testing"))]
pub use provider::MockSigningProvider;
#[cfg(any(test, feature = "testing"))]
pub use repository::{MockEnvelopeRepository, MockSignerRepository};
#[cfg(any(test, feature = "testing"))]
pub use store::{MockArtifactStore, MockCompletionNotifier, MockPdfComposer};
