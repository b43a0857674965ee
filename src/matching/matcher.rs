//! Best-candidate selection over an entity population
//!
//! Side-effect free and O(n) scorer evaluations, so the import orchestrator
//! is free to parallelize rows against an immutable population snapshot.

use chrono::{DateTime, Utc};

use crate::config::EngineConfig;

use super::models::{MatchCandidate, RecordFields};
use super::scorer::record_confidence;

/// All candidates at or above the match threshold, strongest first.
///
/// Ordering is a deterministic total order: confidence, then name
/// similarity, then most recent `updated_at`, then lowest entity id.
pub fn rank_candidates(
    incoming: &RecordFields,
    population: &[RecordFields],
    config: &EngineConfig,
) -> Vec<MatchCandidate> {
    let mut ranked: Vec<(MatchCandidate, DateTime<Utc>)> = population
        .iter()
        .filter(|existing| existing.kind == incoming.kind)
        .filter_map(|existing| {
            record_confidence(incoming, existing, config)
                .map(|candidate| (candidate, existing.updated_at))
        })
        .filter(|(candidate, _)| candidate.confidence >= config.match_threshold)
        .collect();

    ranked.sort_by(|(a, a_updated), (b, b_updated)| {
        b.confidence
            .total_cmp(&a.confidence)
            .then(b.name_similarity.total_cmp(&a.name_similarity))
            .then(b_updated.cmp(a_updated))
            .then(a.entity_id.cmp(&b.entity_id))
    });

    ranked.into_iter().map(|(candidate, _)| candidate).collect()
}

/// The single best duplicate candidate for `incoming`, if any reaches the
/// configured confidence threshold.
pub fn find_best_match(
    incoming: &RecordFields,
    population: &[RecordFields],
    config: &EngineConfig,
) -> Option<MatchCandidate> {
    rank_candidates(incoming, population, config).into_iter().next()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::snapshot::{EntityKind, EntityRecord};

    use super::*;

    fn fields(record: &EntityRecord) -> RecordFields {
        RecordFields::from_record(record, &EngineConfig::default())
    }

    fn contact(id: i64, name: &str) -> EntityRecord {
        EntityRecord::new(id, EntityKind::Contact, name, Utc::now())
    }

    #[test]
    fn test_below_threshold_is_no_match() {
        let population = vec![fields(&contact(1, "Giulia Bianchi"))];
        let incoming = fields(&contact(0, "Marco Rossi"));

        assert!(find_best_match(&incoming, &population, &EngineConfig::default()).is_none());
    }

    #[test]
    fn test_phone_beats_name_only() {
        let population = vec![
            fields(&contact(1, "Marco Rossi")),
            fields(&contact(2, "Mario Rossi").with_phone("02 1234567 8")),
        ];
        let incoming = fields(&contact(0, "Marco Rossi").with_phone("+390212345678"));

        let best = find_best_match(&incoming, &population, &EngineConfig::default()).unwrap();
        assert_eq!(best.entity_id, 2);
    }

    #[test]
    fn test_tie_break_prefers_recently_updated() {
        let now = Utc::now();
        let mut older = contact(1, "Marco Rossi").with_phone("+390212345678");
        older.updated_at = now - Duration::days(30);
        let mut newer = contact(2, "Marco Rossi").with_phone("+390212345678");
        newer.updated_at = now;

        let population = vec![fields(&older), fields(&newer)];
        let incoming = fields(&contact(0, "Marco Rossi").with_phone("+390212345678"));

        let best = find_best_match(&incoming, &population, &EngineConfig::default()).unwrap();
        assert_eq!(best.entity_id, 2);
    }

    #[test]
    fn test_tie_break_prefers_lowest_id() {
        let now = Utc::now();
        let mut a = contact(9, "Marco Rossi").with_phone("+390212345678");
        a.updated_at = now;
        let mut b = contact(3, "Marco Rossi").with_phone("+390212345678");
        b.updated_at = now;

        let population = vec![fields(&a), fields(&b)];
        let incoming = fields(&contact(0, "Marco Rossi").with_phone("+390212345678"));

        let best = find_best_match(&incoming, &population, &EngineConfig::default()).unwrap();
        assert_eq!(best.entity_id, 3);
    }

    #[test]
    fn test_deterministic_over_population_order() {
        let now = Utc::now();
        let mut a = contact(5, "Marco Rossi").with_phone("+390212345678");
        a.updated_at = now;
        let mut b = contact(6, "Marco Rossi").with_phone("+390212345678");
        b.updated_at = now;

        let incoming = fields(&contact(0, "Marco Rossi").with_phone("+390212345678"));
        let config = EngineConfig::default();

        let forward = find_best_match(&incoming, &[fields(&a), fields(&b)], &config).unwrap();
        let reversed = find_best_match(&incoming, &[fields(&b), fields(&a)], &config).unwrap();
        assert_eq!(forward.entity_id, reversed.entity_id);
    }

    #[test]
    fn test_kind_mismatch_never_matches() {
        let company = EntityRecord::new(1, EntityKind::Company, "Marco Rossi", Utc::now());
        let population = vec![fields(&company)];
        let incoming = fields(&contact(0, "Marco Rossi"));

        assert!(find_best_match(&incoming, &population, &EngineConfig::default()).is_none());
    }

    #[test]
    fn test_rank_candidates_sorted() {
        let population = vec![
            fields(&contact(1, "Marco Rossi")),
            fields(&contact(2, "Marco Rossi").with_phone("02 1234567 8")),
        ];
        let incoming = fields(&contact(0, "Marco Rossi").with_phone("+390212345678"));

        // Entity 1 only matches on name, which cannot drive confidence when
        // the incoming row carries a phone, so it falls below the threshold.
        let ranked = rank_candidates(&incoming, &population, &EngineConfig::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].entity_id, 2);
    }
}
