//! Contact↔company relationship graph
//!
//! Sole authority for the integrity of area-of-activity links (one link per
//! contact/company pair, at most one primary designation per side) and of
//! the company parent/child forest (single parent, no cycles). The graph is
//! built from a read snapshot, validated up front, and every mutation is
//! checked before the resulting state is handed back for persistence.

mod hierarchy;
mod links;

pub use hierarchy::CompanyHierarchyEdge;
pub use links::{AreaOfActivity, LinkChange, LinkOutcome, LinkRequest};

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::snapshot::{EntityKind, Snapshot};

/// Rejected or invalid relationship mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// The proposed parent edge would close a loop in the hierarchy
    Cycle { child_id: i64, parent_id: i64 },
    /// The child already has a different parent and `replace` was not set
    MultipleParent { child_id: i64, existing_parent_id: i64 },
    UnknownContact(i64),
    UnknownCompany(i64),
    /// Snapshot carried two links for the same contact/company pair
    DuplicateLink { contact_id: i64, company_id: i64 },
    /// Snapshot carried two primary-company flags for one contact
    DoublePrimaryCompany { contact_id: i64 },
    /// Snapshot carried two primary-contact flags for one company
    DoublePrimaryContact { company_id: i64 },
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::Cycle { child_id, parent_id } => write!(
                f,
                "setting company {} as parent of company {} would create a cycle",
                parent_id, child_id
            ),
            GraphError::MultipleParent { child_id, existing_parent_id } => write!(
                f,
                "company {} already has parent {} (pass replace to change it)",
                child_id, existing_parent_id
            ),
            GraphError::UnknownContact(id) => write!(f, "unknown contact id {}", id),
            GraphError::UnknownCompany(id) => write!(f, "unknown company id {}", id),
            GraphError::DuplicateLink { contact_id, company_id } => write!(
                f,
                "duplicate link between contact {} and company {}",
                contact_id, company_id
            ),
            GraphError::DoublePrimaryCompany { contact_id } => write!(
                f,
                "contact {} has more than one primary company",
                contact_id
            ),
            GraphError::DoublePrimaryContact { company_id } => write!(
                f,
                "company {} has more than one primary contact",
                company_id
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// In-memory relationship state for one snapshot plus applied deltas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationshipGraph {
    contacts: HashSet<i64>,
    companies: HashSet<i64>,
    links: HashMap<(i64, i64), AreaOfActivity>,
    /// child company -> parent company
    parents: HashMap<i64, i64>,
    /// parent company -> child companies
    children: HashMap<i64, BTreeSet<i64>>,
}

impl RelationshipGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build and validate the graph from a persistence snapshot.
    ///
    /// Fails when the snapshot itself already violates an invariant;
    /// that is a storage-level defect the engine refuses to build on.
    pub fn from_snapshot(snapshot: &Snapshot) -> Result<Self, GraphError> {
        let mut graph = RelationshipGraph::new();

        for record in &snapshot.records {
            match record.kind {
                EntityKind::Contact => graph.add_contact(record.id),
                EntityKind::Company => graph.add_company(record.id),
            }
        }

        for link in &snapshot.links {
            graph.load_link(link.clone())?;
        }

        for edge in &snapshot.parent_edges {
            graph.load_parent_edge(edge)?;
        }
        graph.check_acyclic()?;

        Ok(graph)
    }

    /// Register a contact id as known (e.g. created within a batch)
    pub fn add_contact(&mut self, contact_id: i64) {
        self.contacts.insert(contact_id);
    }

    /// Register a company id as known
    pub fn add_company(&mut self, company_id: i64) {
        self.companies.insert(company_id);
        self.children.entry(company_id).or_default();
    }

    pub fn is_known_contact(&self, contact_id: i64) -> bool {
        self.contacts.contains(&contact_id)
    }

    pub fn is_known_company(&self, company_id: i64) -> bool {
        self.companies.contains(&company_id)
    }

    fn ensure_contact(&self, contact_id: i64) -> Result<(), GraphError> {
        if !self.contacts.contains(&contact_id) {
            return Err(GraphError::UnknownContact(contact_id));
        }
        Ok(())
    }

    fn ensure_company(&self, company_id: i64) -> Result<(), GraphError> {
        if !self.companies.contains(&company_id) {
            return Err(GraphError::UnknownCompany(company_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::snapshot::{EntityRecord, Snapshot};

    use super::*;

    fn contact(id: i64) -> EntityRecord {
        EntityRecord::new(id, EntityKind::Contact, format!("contact {}", id), Utc::now())
    }

    fn company(id: i64) -> EntityRecord {
        EntityRecord::new(id, EntityKind::Company, format!("company {}", id), Utc::now())
    }

    #[test]
    fn test_from_snapshot_valid() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![contact(1), company(10), company(20)],
            links: vec![AreaOfActivity {
                is_primary_company: true,
                ..AreaOfActivity::new(1, 10)
            }],
            parent_edges: vec![CompanyHierarchyEdge { child_id: 20, parent_id: 10 }],
        };

        let graph = RelationshipGraph::from_snapshot(&snapshot).unwrap();
        assert!(graph.is_known_contact(1));
        assert_eq!(graph.primary_company_of(1), Some(10));
        assert_eq!(graph.parent_of(20), Some(10));
    }

    #[test]
    fn test_from_snapshot_duplicate_link() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![contact(1), company(10)],
            links: vec![AreaOfActivity::new(1, 10), AreaOfActivity::new(1, 10)],
            parent_edges: vec![],
        };

        assert_eq!(
            RelationshipGraph::from_snapshot(&snapshot),
            Err(GraphError::DuplicateLink { contact_id: 1, company_id: 10 })
        );
    }

    #[test]
    fn test_from_snapshot_double_primary() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![contact(1), company(10), company(20)],
            links: vec![
                AreaOfActivity { is_primary_company: true, ..AreaOfActivity::new(1, 10) },
                AreaOfActivity { is_primary_company: true, ..AreaOfActivity::new(1, 20) },
            ],
            parent_edges: vec![],
        };

        assert_eq!(
            RelationshipGraph::from_snapshot(&snapshot),
            Err(GraphError::DoublePrimaryCompany { contact_id: 1 })
        );
    }

    #[test]
    fn test_from_snapshot_cycle_in_edges() {
        let snapshot = Snapshot {
            version: 1,
            records: vec![company(10), company(20)],
            links: vec![],
            parent_edges: vec![
                CompanyHierarchyEdge { child_id: 10, parent_id: 20 },
                CompanyHierarchyEdge { child_id: 20, parent_id: 10 },
            ],
        };

        assert!(matches!(
            RelationshipGraph::from_snapshot(&snapshot),
            Err(GraphError::Cycle { .. })
        ));
    }
}
