//! Area-of-activity links between contacts and companies

use serde::{Deserialize, Serialize};

use super::{GraphError, RelationshipGraph};

/// The join entity between a contact and a company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaOfActivity {
    pub contact_id: i64,
    pub company_id: i64,
    /// This company is the contact's designated main company
    pub is_primary_company: bool,
    /// This contact is the company's designated main contact
    pub is_primary_contact: bool,
    pub role: Option<String>,
    pub job_description: Option<String>,
}

impl AreaOfActivity {
    pub fn new(contact_id: i64, company_id: i64) -> Self {
        AreaOfActivity {
            contact_id,
            company_id,
            is_primary_company: false,
            is_primary_contact: false,
            role: None,
            job_description: None,
        }
    }
}

/// Arguments for [`RelationshipGraph::link`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRequest {
    /// Overwrites the stored role when set; `None` keeps the existing one
    pub role: Option<String>,
    /// Overwrites the stored job description when set
    pub job_description: Option<String>,
    /// Make this company the contact's primary company, demoting any other
    pub make_primary_company: bool,
    /// Make this contact the company's primary contact, demoting any other
    pub make_primary_contact: bool,
}

/// Whether a link call created the pair or updated it in place
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Created,
    Updated,
}

/// Result of a link upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    /// Final state of the touched link
    pub link: AreaOfActivity,
    pub change: LinkChange,
    /// Links whose primary flag was cleared in the same step
    pub demoted: Vec<AreaOfActivity>,
}

impl RelationshipGraph {
    /// Load a link while building from a snapshot, rejecting invariant
    /// violations already present in storage.
    pub(super) fn load_link(&mut self, link: AreaOfActivity) -> Result<(), GraphError> {
        self.ensure_contact(link.contact_id)?;
        self.ensure_company(link.company_id)?;

        let key = (link.contact_id, link.company_id);
        if self.links.contains_key(&key) {
            return Err(GraphError::DuplicateLink {
                contact_id: link.contact_id,
                company_id: link.company_id,
            });
        }
        if link.is_primary_company
            && self
                .links
                .values()
                .any(|l| l.contact_id == link.contact_id && l.is_primary_company)
        {
            return Err(GraphError::DoublePrimaryCompany {
                contact_id: link.contact_id,
            });
        }
        if link.is_primary_contact
            && self
                .links
                .values()
                .any(|l| l.company_id == link.company_id && l.is_primary_contact)
        {
            return Err(GraphError::DoublePrimaryContact {
                company_id: link.company_id,
            });
        }

        self.links.insert(key, link);
        Ok(())
    }

    /// Create or update the link between a contact and a company.
    ///
    /// Idempotent: calling twice with the same arguments leaves exactly one
    /// link. Primary flags are exclusive per side; granting one clears the
    /// flag on every other link of the same contact (respectively company)
    /// in the same step, so no observable state ever holds two primaries.
    pub fn link(
        &mut self,
        contact_id: i64,
        company_id: i64,
        request: LinkRequest,
    ) -> Result<LinkOutcome, GraphError> {
        self.ensure_contact(contact_id)?;
        self.ensure_company(company_id)?;

        let mut demoted = Vec::new();
        if request.make_primary_company {
            for link in self.links.values_mut() {
                if link.contact_id == contact_id && link.company_id != company_id && link.is_primary_company {
                    link.is_primary_company = false;
                    demoted.push(link.clone());
                }
            }
        }
        if request.make_primary_contact {
            for link in self.links.values_mut() {
                if link.company_id == company_id && link.contact_id != contact_id && link.is_primary_contact {
                    link.is_primary_contact = false;
                    demoted.push(link.clone());
                }
            }
        }

        let key = (contact_id, company_id);
        let change = if self.links.contains_key(&key) {
            LinkChange::Updated
        } else {
            LinkChange::Created
        };

        let link = self
            .links
            .entry(key)
            .or_insert_with(|| AreaOfActivity::new(contact_id, company_id));
        if let Some(role) = request.role {
            link.role = Some(role);
        }
        if let Some(job) = request.job_description {
            link.job_description = Some(job);
        }
        if request.make_primary_company {
            link.is_primary_company = true;
        }
        if request.make_primary_contact {
            link.is_primary_contact = true;
        }

        Ok(LinkOutcome {
            link: link.clone(),
            change,
            demoted,
        })
    }

    /// Remove the link between a contact and a company.
    ///
    /// Returns the removed link, or `None` when the pair was not linked.
    /// A removed primary flag is not re-assigned to another link; primary
    /// designation is always explicit.
    pub fn unlink(&mut self, contact_id: i64, company_id: i64) -> Result<Option<AreaOfActivity>, GraphError> {
        self.ensure_contact(contact_id)?;
        self.ensure_company(company_id)?;
        Ok(self.links.remove(&(contact_id, company_id)))
    }

    /// All links of a company, ordered by contact id
    pub fn contacts_of_company(&self, company_id: i64) -> Vec<&AreaOfActivity> {
        let mut out: Vec<_> = self
            .links
            .values()
            .filter(|l| l.company_id == company_id)
            .collect();
        out.sort_by_key(|l| l.contact_id);
        out
    }

    /// All links of a contact, ordered by company id
    pub fn companies_of_contact(&self, contact_id: i64) -> Vec<&AreaOfActivity> {
        let mut out: Vec<_> = self
            .links
            .values()
            .filter(|l| l.contact_id == contact_id)
            .collect();
        out.sort_by_key(|l| l.company_id);
        out
    }

    /// The contact's designated primary company, if any
    pub fn primary_company_of(&self, contact_id: i64) -> Option<i64> {
        self.links
            .values()
            .find(|l| l.contact_id == contact_id && l.is_primary_company)
            .map(|l| l.company_id)
    }

    /// The company's designated primary contact, if any
    pub fn primary_contact_of(&self, company_id: i64) -> Option<i64> {
        self.links
            .values()
            .find(|l| l.company_id == company_id && l.is_primary_contact)
            .map(|l| l.contact_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(contacts: &[i64], companies: &[i64]) -> RelationshipGraph {
        let mut graph = RelationshipGraph::new();
        for &c in contacts {
            graph.add_contact(c);
        }
        for &c in companies {
            graph.add_company(c);
        }
        graph
    }

    #[test]
    fn test_link_is_idempotent() {
        let mut graph = graph_with(&[1], &[10]);
        let request = LinkRequest {
            role: Some("sales".to_string()),
            ..Default::default()
        };

        let first = graph.link(1, 10, request.clone()).unwrap();
        assert_eq!(first.change, LinkChange::Created);

        let second = graph.link(1, 10, request).unwrap();
        assert_eq!(second.change, LinkChange::Updated);

        assert_eq!(graph.companies_of_contact(1).len(), 1);
        assert_eq!(second.link.role.as_deref(), Some("sales"));
    }

    #[test]
    fn test_link_update_keeps_role_when_unset() {
        let mut graph = graph_with(&[1], &[10]);
        graph
            .link(1, 10, LinkRequest { role: Some("sales".to_string()), ..Default::default() })
            .unwrap();
        let outcome = graph.link(1, 10, LinkRequest::default()).unwrap();
        assert_eq!(outcome.link.role.as_deref(), Some("sales"));
    }

    #[test]
    fn test_primary_company_is_exclusive() {
        let mut graph = graph_with(&[1], &[10, 20]);
        graph
            .link(1, 10, LinkRequest { make_primary_company: true, ..Default::default() })
            .unwrap();
        let outcome = graph
            .link(1, 20, LinkRequest { make_primary_company: true, ..Default::default() })
            .unwrap();

        assert_eq!(outcome.demoted.len(), 1);
        assert_eq!(outcome.demoted[0].company_id, 10);
        assert_eq!(graph.primary_company_of(1), Some(20));

        let primaries = graph
            .companies_of_contact(1)
            .iter()
            .filter(|l| l.is_primary_company)
            .count();
        assert_eq!(primaries, 1);
    }

    #[test]
    fn test_primary_contact_is_exclusive() {
        let mut graph = graph_with(&[1, 2], &[10]);
        graph
            .link(1, 10, LinkRequest { make_primary_contact: true, ..Default::default() })
            .unwrap();
        graph
            .link(2, 10, LinkRequest { make_primary_contact: true, ..Default::default() })
            .unwrap();

        assert_eq!(graph.primary_contact_of(10), Some(2));
        let primaries = graph
            .contacts_of_company(10)
            .iter()
            .filter(|l| l.is_primary_contact)
            .count();
        assert_eq!(primaries, 1);
    }

    #[test]
    fn test_relink_same_pair_keeps_primary_flag() {
        let mut graph = graph_with(&[1], &[10]);
        graph
            .link(1, 10, LinkRequest { make_primary_company: true, ..Default::default() })
            .unwrap();
        // A later upsert without the flag does not revoke it
        let outcome = graph.link(1, 10, LinkRequest::default()).unwrap();
        assert!(outcome.link.is_primary_company);
    }

    #[test]
    fn test_unlink_does_not_promote() {
        let mut graph = graph_with(&[1], &[10, 20]);
        graph
            .link(1, 10, LinkRequest { make_primary_company: true, ..Default::default() })
            .unwrap();
        graph.link(1, 20, LinkRequest::default()).unwrap();

        let removed = graph.unlink(1, 10).unwrap().unwrap();
        assert!(removed.is_primary_company);
        // The remaining link is not silently promoted
        assert_eq!(graph.primary_company_of(1), None);
        assert_eq!(graph.companies_of_contact(1).len(), 1);
    }

    #[test]
    fn test_unlink_missing_pair_is_none() {
        let mut graph = graph_with(&[1], &[10]);
        assert!(graph.unlink(1, 10).unwrap().is_none());
    }

    #[test]
    fn test_unknown_ids_are_hard_errors() {
        let mut graph = graph_with(&[1], &[10]);
        assert_eq!(
            graph.link(99, 10, LinkRequest::default()),
            Err(GraphError::UnknownContact(99))
        );
        assert_eq!(
            graph.link(1, 99, LinkRequest::default()),
            Err(GraphError::UnknownCompany(99))
        );
    }

    #[test]
    fn test_queries_are_sorted() {
        let mut graph = graph_with(&[3, 1, 2], &[10]);
        graph.link(3, 10, LinkRequest::default()).unwrap();
        graph.link(1, 10, LinkRequest::default()).unwrap();
        graph.link(2, 10, LinkRequest::default()).unwrap();

        let ids: Vec<i64> = graph.contacts_of_company(10).iter().map(|l| l.contact_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
