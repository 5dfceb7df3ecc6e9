//! Shared DTOs for the docufill workspace.
//!
//! # Design constraints
//! - Fill data and reports cross the boundary to host applications, so they serialize with serde.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod placeholder;
pub mod report;
pub mod value;

pub use placeholder::{PlaceholderInfo, Scope, StructuralKind};
pub use report::{
    BatchSummary, CleanupReport, DocumentOutcome, DocumentStatus, FillReport, PlaceholderEvent,
};
pub use value::{FillData, FillValue, FormattedValue, TextFragment};

/// Schema identifiers.
pub mod schema {
    pub const DOCUFILL_FILL_REPORT_V1: &str = "docufill.fill_report.v1";
    pub const DOCUFILL_CLEANUP_REPORT_V1: &str = "docufill.cleanup_report.v1";
    pub const DOCUFILL_BATCH_V1: &str = "docufill.batch.v1";
}
