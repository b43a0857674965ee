//! Proposed mutations handed to the persistence collaborator
//!
//! The engine never writes anywhere itself; every decision it makes comes
//! out as one of these, to be applied transactionally by the caller.

use serde::{Deserialize, Serialize};

use crate::graph::AreaOfActivity;
use crate::snapshot::EntityRecord;

/// A single field update on an existing entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub value: String,
}

impl FieldChange {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        FieldChange {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// One proposed write against storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    /// Create a new entity. Records created within an import batch carry
    /// provisional ids (above the snapshot's highest id) that the
    /// persistence layer remaps on commit.
    CreateEntity { record: EntityRecord },
    UpdateEntity { id: i64, changes: Vec<FieldChange> },
    /// Create or update the link for the embedded contact/company pair
    UpsertLink { link: AreaOfActivity },
    RemoveLink { contact_id: i64, company_id: i64 },
    SetParent { child_id: i64, parent_id: i64 },
}
