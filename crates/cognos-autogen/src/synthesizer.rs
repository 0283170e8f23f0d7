//! Stage 4: synthesizer.
//!
//! Grounded on the teacher's `rollback::GeneticMemory` dedup-by-hash
//! bookkeeping pattern, here applied to claim text instead of compiled-skill
//! hashes: near-duplicate claims merge into one, carrying the union of their
//! support ids.

use cognos_core::epistemic::subject_overlap;
use cognos_core::Dtu;

use crate::critic::CriticReport;

/// Two claims are the same definition/claim/invariant when their subject
/// overlap (Dice over words > 3 chars, same measure the rest of the
/// substrate uses for similarity) is at least this high.
pub const DEDUPE_THRESHOLD: f64 = 0.9;

/// Deduplicates near-identical claims (merging their support lists),
/// appends the critic trace to `meta.critic_trace`, and appends a
/// human-readable critic summary bullet to `meta.extra["summary"]`.
pub fn synthesize(mut candidate: Dtu, critic: &CriticReport) -> Dtu {
    let mut merged: Vec<cognos_core::Claim> = Vec::new();
    'outer: for claim in candidate.claims.drain(..) {
        for existing in merged.iter_mut() {
            if subject_overlap(&existing.text, &claim.text) >= DEDUPE_THRESHOLD {
                for source in claim.sources {
                    if !existing.sources.contains(&source) {
                        existing.sources.push(source);
                    }
                }
                continue 'outer;
            }
        }
        merged.push(claim);
    }
    candidate.claims = merged;

    for issue in &critic.issues {
        candidate
            .meta
            .critic_trace
            .push(format!("{:?}:{}: {}", issue.severity, issue.rule, issue.detail));
    }

    let summary = if critic.is_clean() {
        "critic: no issues raised".to_string()
    } else {
        format!(
            "critic: {} issue(s), escalation={}",
            critic.issues.len(),
            critic.needs_escalation
        )
    };
    candidate
        .meta
        .extra
        .insert("summary".to_string(), serde_json::Value::String(summary));

    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognos_core::{
        Author, Claim, ClaimType, DtuStatus, EvidenceTier, Lane, Lineage, OriginTag, PipelineMeta, Scores,
    };
    use crate::critic::{CriticIssue, CriticSeverity};

    fn candidate(claims: Vec<Claim>) -> Dtu {
        Dtu {
            id: "cand".into(),
            created_at_ms: 0,
            author: Author {
                id: "autogen".into(),
                display_name: None,
            },
            title: "t".into(),
            tags: vec![],
            claims,
            domain_type: None,
            epistemic_class: None,
            lineage: Lineage {
                parent_ids: vec![],
                generation_depth: 1,
                origin: OriginTag::Autogen,
            },
            scores: Scores::default(),
            status: DtuStatus::Draft,
            lane: Lane::Local,
            content_hash: None,
            license: None,
            creator_id: "autogen".into(),
            origin_fingerprint: None,
            meta: PipelineMeta::default(),
            provenance: None,
        }
    }

    #[test]
    fn near_duplicate_claims_merge_support() {
        let dtu = candidate(vec![
            Claim {
                claim_type: ClaimType::Fact,
                text: "gravity accelerates objects at 9.8 meters per second squared".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["a".into()],
            },
            Claim {
                claim_type: ClaimType::Fact,
                text: "gravity accelerates objects at 9.8 meters per second squared".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["b".into()],
            },
        ]);
        let report = CriticReport::default();
        let synthesized = synthesize(dtu, &report);
        assert_eq!(synthesized.claims.len(), 1);
        assert_eq!(synthesized.claims[0].sources, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn critic_trace_and_summary_are_recorded() {
        let dtu = candidate(vec![]);
        let report = CriticReport {
            issues: vec![CriticIssue {
                rule: "no_evidence_links",
                severity: CriticSeverity::Critical,
                detail: "x".into(),
            }],
            needs_escalation: true,
        };
        let synthesized = synthesize(dtu, &report);
        assert_eq!(synthesized.meta.critic_trace.len(), 1);
        assert!(synthesized.meta.extra.contains_key("summary"));
    }
}
