//! Entity deduplication and relationship engine for CRM data.
//!
//! This crate decides whether two contact or company records refer to the
//! same real-world entity (during spreadsheet import and ongoing data entry)
//! and maintains the integrity of contact↔company links (areas of activity,
//! primary designations) and the company parent/child hierarchy.
//!
//! The engine is pure computation: it consumes already-parsed rows and
//! read snapshots of existing entities, and emits per-row outcomes plus
//! proposed mutations for a persistence layer to apply transactionally.
//! It performs no I/O and holds no locks.

pub mod config;
pub mod graph;
pub mod import;
pub mod matching;
pub mod mutation;
pub mod normalize;
pub mod snapshot;

pub use config::EngineConfig;
pub use graph::{AreaOfActivity, CompanyHierarchyEdge, GraphError, LinkChange, LinkOutcome, LinkRequest, RelationshipGraph};
pub use import::{export_rows, run_import, FieldConflict, ImportReport, ImportRow, ImportSummary, RowOutcome};
pub use matching::{find_best_match, FieldKind, MatchCandidate, NormalizedField, RecordFields};
pub use mutation::{FieldChange, Mutation};
pub use snapshot::{EntityKind, EntityRecord, Snapshot, StaleSnapshotError};
