//! PDF engine for the signing service: page concatenation, simple-mode
//! margin stamping and local evidence-report rendering, all on lopdf.

mod composer;
pub mod merge;
pub mod report;
pub mod stamp;

pub use composer::LopdfComposer;

use assina_domain::DomainError;

pub(crate) fn assembly_error(context: &str, e: impl std::fmt::Display) -> DomainError {
    DomainError::Assembly(format!("{context}: {e}"))
}
