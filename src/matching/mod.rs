// Matching service for duplicate detection during import and data entry
//
// Pure business logic, decoupled from persistence and reusable across
// contexts: score two records, or find the best candidate in a population.

pub mod matcher;
pub mod models;
pub mod scorer;

pub use matcher::{find_best_match, rank_candidates};
pub use models::{EmailAddress, FieldKind, MatchCandidate, NormalizedField, RecordFields};
pub use scorer::{edit_distance, name_similarity, record_confidence};
