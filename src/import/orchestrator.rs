//! Per-batch import pipeline
//!
//! For each row: normalize, match against the population, merge or create,
//! then link to a company when the row names one. The population snapshot
//! is read once per batch; records created within the batch are appended to
//! the in-memory population so later rows can match them. A single bad row
//! never aborts the batch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::EngineConfig;
use crate::graph::{GraphError, LinkRequest, RelationshipGraph};
use crate::matching::{find_best_match, FieldKind, RecordFields};
use crate::mutation::{FieldChange, Mutation};
use crate::normalize;
use crate::snapshot::{EntityKind, EntityRecord, Snapshot};

use super::row::ImportRow;

/// A non-empty incoming field that disagreed with the existing record.
/// The existing value is retained; the conflict is reported, never
/// silently overwritten.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub field: FieldKind,
    pub existing: String,
    pub incoming: String,
}

/// What happened to one import row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Created { entity_id: i64 },
    Merged { entity_id: i64, conflicts: Vec<FieldConflict> },
    Skipped { reason: String },
    Error { reason: String },
}

/// Counts per outcome kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub created: usize,
    pub merged: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl ImportSummary {
    fn tally(outcomes: &[RowOutcome]) -> Self {
        let mut summary = ImportSummary::default();
        for outcome in outcomes {
            match outcome {
                RowOutcome::Created { .. } => summary.created += 1,
                RowOutcome::Merged { .. } => summary.merged += 1,
                RowOutcome::Skipped { .. } => summary.skipped += 1,
                RowOutcome::Error { .. } => summary.errors += 1,
            }
        }
        summary
    }
}

/// Result of one import batch: outcomes in row order plus the proposed
/// mutations for the persistence collaborator to apply transactionally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub outcomes: Vec<RowOutcome>,
    pub mutations: Vec<Mutation>,
    pub summary: ImportSummary,
}

/// Run one import batch against a population snapshot.
///
/// Fails up front (before any row) only when the snapshot itself violates a
/// relationship invariant; per-row problems become row outcomes.
pub fn run_import(
    rows: &[Value],
    snapshot: &Snapshot,
    config: &EngineConfig,
) -> Result<ImportReport, GraphError> {
    let graph = RelationshipGraph::from_snapshot(snapshot)?;
    let mut batch = BatchState::new(snapshot, graph, config);

    let outcomes: Vec<RowOutcome> = rows
        .iter()
        .enumerate()
        .map(|(index, value)| batch.process_row(index, value))
        .collect();

    let summary = ImportSummary::tally(&outcomes);
    log::debug!(
        "import batch done: {} created, {} merged, {} skipped, {} errors",
        summary.created,
        summary.merged,
        summary.skipped,
        summary.errors
    );

    Ok(ImportReport {
        outcomes,
        mutations: batch.mutations,
        summary,
    })
}

/// Copy-on-write working state for one batch
struct BatchState<'a> {
    config: &'a EngineConfig,
    graph: RelationshipGraph,
    /// Pre-normalized comparison views, contacts and companies separately
    contacts: Vec<RecordFields>,
    companies: Vec<RecordFields>,
    /// Working copies of records, by id, for merge decisions
    records: HashMap<i64, EntityRecord>,
    next_id: i64,
    now: DateTime<Utc>,
    mutations: Vec<Mutation>,
}

impl<'a> BatchState<'a> {
    fn new(snapshot: &Snapshot, graph: RelationshipGraph, config: &'a EngineConfig) -> Self {
        let mut contacts = Vec::new();
        let mut companies = Vec::new();
        let mut records = HashMap::new();
        for record in &snapshot.records {
            let fields = RecordFields::from_record(record, config);
            match record.kind {
                EntityKind::Contact => contacts.push(fields),
                EntityKind::Company => companies.push(fields),
            }
            records.insert(record.id, record.clone());
        }

        BatchState {
            config,
            graph,
            contacts,
            companies,
            records,
            next_id: snapshot.max_entity_id() + 1,
            now: Utc::now(),
            mutations: Vec::new(),
        }
    }

    fn process_row(&mut self, index: usize, value: &Value) -> RowOutcome {
        let row = match ImportRow::from_value(value) {
            Ok(row) => row,
            Err(err) => {
                return RowOutcome::Error {
                    reason: format!("row {}: {}", index, err),
                };
            }
        };

        if !row.has_identity() {
            log::warn!("row {}: no name, phone or email, skipping", index);
            return RowOutcome::Skipped {
                reason: "row has no name, phone or email".to_string(),
            };
        }

        let incoming_record = row.to_contact_record(0, self.now);
        let incoming = RecordFields::from_record(&incoming_record, self.config);

        let (contact_id, outcome) = match find_best_match(&incoming, &self.contacts, self.config) {
            Some(candidate) => {
                log::debug!(
                    "row {}: matched contact {} at confidence {:.2}",
                    index,
                    candidate.entity_id,
                    candidate.confidence
                );
                let conflicts = self.merge_contact(candidate.entity_id, &row);
                (
                    candidate.entity_id,
                    RowOutcome::Merged {
                        entity_id: candidate.entity_id,
                        conflicts,
                    },
                )
            }
            None => {
                let id = self.create_contact(&row);
                (id, RowOutcome::Created { entity_id: id })
            }
        };

        if let Some(company_name) = row.company.clone() {
            if let Err(err) = self.attach_company(contact_id, &company_name, &row) {
                return RowOutcome::Error {
                    reason: format!("row {}: {}", index, err),
                };
            }
        }

        outcome
    }

    fn create_contact(&mut self, row: &ImportRow) -> i64 {
        let id = self.next_id;
        self.next_id += 1;

        let record = row.to_contact_record(id, self.now);
        self.contacts.push(RecordFields::from_record(&record, self.config));
        self.graph.add_contact(id);
        self.mutations.push(Mutation::CreateEntity { record: record.clone() });
        self.records.insert(id, record);
        id
    }

    /// Fill-empty-only merge: non-empty incoming values land on empty
    /// existing fields; disagreements keep the existing value and are
    /// reported as conflicts.
    fn merge_contact(&mut self, id: i64, row: &ImportRow) -> Vec<FieldConflict> {
        let mut conflicts = Vec::new();
        let mut changes = Vec::new();

        let Some(record) = self.records.get_mut(&id) else {
            // Matched ids always come from this batch's population
            return conflicts;
        };

        if !row.name.is_empty() {
            if record.name.trim().is_empty() {
                record.name = row.name.clone();
                changes.push(FieldChange::new("name", row.name.clone()));
            } else if !record.name.trim().eq_ignore_ascii_case(row.name.trim()) {
                conflicts.push(FieldConflict {
                    field: FieldKind::Name,
                    existing: record.name.clone(),
                    incoming: row.name.clone(),
                });
            }
        }

        if let Some(phone) = &row.phone {
            let canonical = normalize::normalize_phone(phone, &self.config.default_country_code);
            if !canonical.is_empty() {
                let known = record.phones.iter().any(|p| {
                    normalize::normalize_phone(p, &self.config.default_country_code) == canonical
                });
                if record.phones.is_empty() {
                    record.phones.push(phone.clone());
                    changes.push(FieldChange::new("phone", phone.clone()));
                } else if !known {
                    conflicts.push(FieldConflict {
                        field: FieldKind::Phone,
                        existing: record.phones.join(", "),
                        incoming: phone.clone(),
                    });
                }
            }
        }

        if let Some(email) = &row.email {
            let local = normalize::email_local_part(email);
            let domain = normalize::extract_email_domain(email);
            if !domain.is_empty() {
                let known = record.emails.iter().any(|e| {
                    normalize::email_local_part(e) == local
                        && normalize::domains_related(
                            &normalize::extract_email_domain(e),
                            &domain,
                            &self.config.related_domains,
                        )
                });
                if record.emails.is_empty() {
                    record.emails.push(email.clone());
                    changes.push(FieldChange::new("email", email.clone()));
                } else if !known {
                    conflicts.push(FieldConflict {
                        field: FieldKind::EmailDomain,
                        existing: record.emails.join(", "),
                        incoming: email.clone(),
                    });
                }
            }
        }

        if let Some(address) = &row.address {
            match &record.address {
                None => {
                    record.address = Some(address.clone());
                    changes.push(FieldChange::new("address", address.clone()));
                }
                Some(existing) if existing.trim().is_empty() => {
                    record.address = Some(address.clone());
                    changes.push(FieldChange::new("address", address.clone()));
                }
                Some(existing) => {
                    if !existing.trim().eq_ignore_ascii_case(address.trim()) {
                        conflicts.push(FieldConflict {
                            field: FieldKind::Address,
                            existing: existing.clone(),
                            incoming: address.clone(),
                        });
                    }
                }
            }
        }

        if !changes.is_empty() {
            // Later rows must see the enriched record
            let refreshed = RecordFields::from_record(record, self.config);
            if let Some(fields) = self.contacts.iter_mut().find(|f| f.entity_id == id) {
                *fields = refreshed;
            }
            self.mutations.push(Mutation::UpdateEntity { id, changes });
        }

        conflicts
    }

    /// Find or create the named company, then link the contact to it.
    /// The first link of a contact with no existing company links is made
    /// its primary company; later links never steal the flag implicitly.
    fn attach_company(
        &mut self,
        contact_id: i64,
        company_name: &str,
        row: &ImportRow,
    ) -> Result<(), GraphError> {
        let probe = EntityRecord::new(0, EntityKind::Company, company_name, self.now);
        let incoming = RecordFields::from_record(&probe, self.config);

        let company_id = match find_best_match(&incoming, &self.companies, self.config) {
            Some(candidate) => candidate.entity_id,
            None => {
                let id = self.next_id;
                self.next_id += 1;
                let record = EntityRecord::new(id, EntityKind::Company, company_name, self.now);
                self.companies.push(RecordFields::from_record(&record, self.config));
                self.graph.add_company(id);
                self.mutations.push(Mutation::CreateEntity { record: record.clone() });
                self.records.insert(id, record);
                id
            }
        };

        let make_primary = self.graph.companies_of_contact(contact_id).is_empty();
        let outcome = self.graph.link(
            contact_id,
            company_id,
            LinkRequest {
                role: row.role.clone(),
                job_description: row.job_description.clone(),
                make_primary_company: make_primary,
                make_primary_contact: false,
            },
        )?;

        self.mutations.push(Mutation::UpsertLink { link: outcome.link });
        for demoted in outcome.demoted {
            self.mutations.push(Mutation::UpsertLink { link: demoted });
        }
        Ok(())
    }
}
