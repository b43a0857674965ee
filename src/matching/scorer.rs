//! String similarity and per-record match confidence

use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::normalize;

use super::models::{FieldKind, MatchCandidate, RecordFields};

/// Confidence contributed by an exact normalized-phone match
pub const PHONE_CONFIDENCE: f64 = 0.95;
/// Confidence contributed by a related-domain + equal-local-part email match
pub const EMAIL_CONFIDENCE: f64 = 0.90;

/// Classic Levenshtein edit distance over full strings, case-sensitive.
///
/// Minimum number of insert/delete/substitute operations to turn `a`
/// into `b`. Symmetric, zero on equal strings, and `distance("", s)`
/// equals the length of `s`.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two-row dynamic programming table
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Name similarity in [0, 1]: edit distance of the lower-cased names,
/// normalized by the longer length.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count()).max(1);
    1.0 - edit_distance(&a, &b) as f64 / longest as f64
}

/// Score one incoming record against one existing record.
///
/// Signals combine by taking the strongest single one rather than summing,
/// so weak partial matches never accumulate into a false positive:
/// - exact normalized-phone match is the strongest signal;
/// - related/equal email domains with an equal local part is a strong signal;
/// - name similarity above the configured threshold becomes the confidence
///   only when the incoming record carries no phone/email data at all;
///   otherwise it is kept solely as a tie-break key on the candidate.
///
/// Returns `None` when no field contributed a signal.
pub fn record_confidence(
    incoming: &RecordFields,
    existing: &RecordFields,
    config: &EngineConfig,
) -> Option<MatchCandidate> {
    let mut matched_fields: HashSet<FieldKind> = HashSet::new();
    let mut confidence: f64 = 0.0;

    let phone_hit = incoming.phones.iter().any(|p| {
        existing
            .phones
            .iter()
            .any(|q| !p.is_empty() && p.canonical == q.canonical)
    });
    if phone_hit {
        matched_fields.insert(FieldKind::Phone);
        confidence = confidence.max(PHONE_CONFIDENCE);
    }

    let email_hit = incoming.emails.iter().any(|e| {
        existing.emails.iter().any(|f| {
            !e.local.is_empty()
                && e.local == f.local
                && normalize::domains_related(&e.domain, &f.domain, &config.related_domains)
        })
    });
    if email_hit {
        matched_fields.insert(FieldKind::EmailDomain);
        confidence = confidence.max(EMAIL_CONFIDENCE);
    }

    let name_sim = name_similarity(&incoming.name.canonical, &existing.name.canonical);
    if !incoming.name.is_empty() && !existing.name.is_empty() && name_sim >= config.name_threshold {
        matched_fields.insert(FieldKind::Name);
        // Name alone decides only when the incoming record offers nothing
        // stronger to compare on
        if !incoming.has_strong_fields() {
            confidence = confidence.max(name_sim);
        }
    }

    if matched_fields.is_empty() {
        return None;
    }

    Some(MatchCandidate {
        entity_id: existing.entity_id,
        confidence,
        matched_fields,
        name_similarity: name_sim,
    })
}
