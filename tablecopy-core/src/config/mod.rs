//! Configuration types for an extraction run.
//!
//! - `ExtractionConfig`: timeouts, buffer budget, phase and presentation switches
//! - `document`: rules document interpretation (include/exclude declarations)

pub mod document;
mod extraction;

pub use document::{ConfigDocumentInterpreter, DeclarationEvent, read_rules_document};
pub use extraction::{
    DEFAULT_BUFFER_MB, DEFAULT_TIMEOUT_MS, ExtractionConfig, MAX_BUFFER_MB, TransferFailurePolicy,
};
