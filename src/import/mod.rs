//! Batch import/export orchestration
//!
//! Drives the matcher and the relationship graph over parsed rows from the
//! file-decoding collaborator, producing per-row outcomes and proposed
//! mutations. File formats and persistence stay outside this crate.

mod export;
mod orchestrator;
mod row;

pub use export::export_rows;
pub use orchestrator::{run_import, FieldConflict, ImportReport, ImportSummary, RowOutcome};
pub use row::ImportRow;
