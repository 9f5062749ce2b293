use assina_domain::{DomainResult, EvidenceReport, PdfComposer, SignatureBlock};
use bytes::Bytes;
use lopdf::Document;
use tracing::debug;

use crate::{assembly_error, merge, report, stamp};

/// lopdf-backed implementation of the domain's PDF contract.
#[derive(Debug, Default, Clone)]
pub struct LopdfComposer;

impl LopdfComposer {
    pub fn new() -> Self {
        Self
    }
}

impl PdfComposer for LopdfComposer {
    fn merge(&self, documents: &[Bytes]) -> DomainResult<Bytes> {
        debug!(documents = documents.len(), "Merging pdf documents");

        let loaded = documents
            .iter()
            .map(|bytes| Document::load_mem(bytes).map_err(|e| assembly_error("loading pdf", e)))
            .collect::<DomainResult<Vec<_>>>()?;

        let mut merged = merge::merge_documents(loaded)?;

        let mut out = Vec::new();
        merged
            .save_to(&mut out)
            .map_err(|e| assembly_error("saving merged pdf", e))?;
        Ok(Bytes::from(out))
    }

    fn stamp_signature_block(&self, pdf: &[u8], block: &SignatureBlock) -> DomainResult<Bytes> {
        debug!(signer_index = block.signer_index, "Stamping signature block");

        let stamped = stamp::stamp_block(pdf, block)?;
        Ok(Bytes::from(stamped))
    }

    fn render_evidence_report(&self, report: &EvidenceReport) -> DomainResult<Bytes> {
        debug!(rows = report.rows.len(), "Rendering evidence report");

        let rendered = report::render_report(report)?;
        Ok(Bytes::from(rendered))
    }
}
