//! Company parent/child hierarchy (a forest: single parent, no cycles)

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::{GraphError, RelationshipGraph};

/// A directed parent edge in the company hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyHierarchyEdge {
    pub child_id: i64,
    pub parent_id: i64,
}

impl RelationshipGraph {
    /// Load a parent edge while building from a snapshot. Cycle detection
    /// runs once over the whole forest afterwards.
    pub(super) fn load_parent_edge(&mut self, edge: &CompanyHierarchyEdge) -> Result<(), GraphError> {
        self.ensure_company(edge.child_id)?;
        self.ensure_company(edge.parent_id)?;
        if edge.child_id == edge.parent_id {
            return Err(GraphError::Cycle {
                child_id: edge.child_id,
                parent_id: edge.parent_id,
            });
        }
        if let Some(&existing) = self.parents.get(&edge.child_id) {
            if existing != edge.parent_id {
                return Err(GraphError::MultipleParent {
                    child_id: edge.child_id,
                    existing_parent_id: existing,
                });
            }
            return Ok(());
        }
        self.parents.insert(edge.child_id, edge.parent_id);
        self.children.entry(edge.parent_id).or_default().insert(edge.child_id);
        Ok(())
    }

    /// Verify the loaded forest holds no cycle
    pub(super) fn check_acyclic(&self) -> Result<(), GraphError> {
        for &start in self.parents.keys() {
            let mut seen = HashSet::new();
            let mut current = start;
            while let Some(&parent) = self.parents.get(&current) {
                if parent == start || !seen.insert(parent) {
                    return Err(GraphError::Cycle {
                        child_id: start,
                        parent_id: parent,
                    });
                }
                current = parent;
            }
        }
        Ok(())
    }

    /// Set (or replace) a company's parent.
    ///
    /// Rejected with [`GraphError::Cycle`] when the edge is a self-loop or
    /// the child is already a transitive ancestor of the proposed parent.
    /// Rejected with [`GraphError::MultipleParent`] when the child already
    /// has a different parent and `replace` is false. On rejection the
    /// hierarchy is left untouched.
    pub fn set_parent(&mut self, child_id: i64, parent_id: i64, replace: bool) -> Result<(), GraphError> {
        self.ensure_company(child_id)?;
        self.ensure_company(parent_id)?;

        if child_id == parent_id {
            return Err(GraphError::Cycle { child_id, parent_id });
        }
        // Walk the parent chain from the proposed parent; hitting the child
        // means the edge would close a loop.
        if self.ancestors_of(parent_id).contains(&child_id) {
            return Err(GraphError::Cycle { child_id, parent_id });
        }

        if let Some(&existing) = self.parents.get(&child_id) {
            if existing == parent_id {
                return Ok(());
            }
            if !replace {
                return Err(GraphError::MultipleParent {
                    child_id,
                    existing_parent_id: existing,
                });
            }
            if let Some(siblings) = self.children.get_mut(&existing) {
                siblings.remove(&child_id);
            }
        }

        self.parents.insert(child_id, parent_id);
        self.children.entry(parent_id).or_default().insert(child_id);
        Ok(())
    }

    /// Detach a company from its parent; returns the removed parent id
    pub fn clear_parent(&mut self, child_id: i64) -> Result<Option<i64>, GraphError> {
        self.ensure_company(child_id)?;
        let removed = self.parents.remove(&child_id);
        if let Some(parent) = removed {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.remove(&child_id);
            }
        }
        Ok(removed)
    }

    /// Direct parent of a company, if any
    pub fn parent_of(&self, company_id: i64) -> Option<i64> {
        self.parents.get(&company_id).copied()
    }

    /// Parent chain from nearest to furthest ancestor
    pub fn ancestors_of(&self, company_id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut current = company_id;
        while let Some(&parent) = self.parents.get(&current) {
            // Guard against walking a corrupted chain forever
            if !seen.insert(parent) {
                break;
            }
            out.push(parent);
            current = parent;
        }
        out
    }

    /// All transitive children, breadth-first, deterministic order
    pub fn descendants_of(&self, company_id: i64) -> Vec<i64> {
        let mut out = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(company_id);
        while let Some(current) = queue.pop_front() {
            if let Some(kids) = self.children.get(&current) {
                for &kid in kids {
                    out.push(kid);
                    queue.push_back(kid);
                }
            }
        }
        out
    }
}
