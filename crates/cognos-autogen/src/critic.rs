//! Stage 3: critic.
//!
//! Runs every named check regardless of earlier failures, then folds the
//! results into one pass/fail-with-escalation verdict.

use cognos_core::{ClaimType, Dtu};
use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievalPack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CriticSeverity {
    Warn,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CriticIssue {
    pub rule: &'static str,
    pub severity: CriticSeverity,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriticReport {
    pub issues: Vec<CriticIssue>,
    pub needs_escalation: bool,
}

impl CriticReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

const HYPOTHETICAL_RATIO_THRESHOLD: f64 = 0.7;

/// Runs all 5 named checks and sets `needsEscalation` if
/// any critical issue fired.
pub fn run_critic(candidate: &Dtu, pack: &RetrievalPack) -> CriticReport {
    let mut issues = Vec::new();

    // no_definitions (warn): candidate carries no claim/tag marking it as
    // introducing a definition.
    let has_definition = candidate.tags.iter().any(|t| t.eq_ignore_ascii_case("definition"))
        || candidate
            .claims
            .iter()
            .any(|c| c.text.to_lowercase().contains("is defined as") || c.text.to_lowercase().contains("refers to"));
    if !has_definition {
        issues.push(CriticIssue {
            rule: "no_definitions",
            severity: CriticSeverity::Warn,
            detail: "candidate introduces no claim recognizable as a definition".to_string(),
        });
    }

    // no_evidence_links (critical): every claim must carry at least one
    // support/source id.
    let unsupported = candidate.claims.iter().filter(|c| c.sources.is_empty()).count();
    if unsupported > 0 {
        issues.push(CriticIssue {
            rule: "no_evidence_links",
            severity: CriticSeverity::Critical,
            detail: format!("{unsupported} claim(s) carry no supporting DTU id"),
        });
    }

    // mostly_hypothetical (critical): > 70% of claims classified HYPOTHESIS.
    if !candidate.claims.is_empty() {
        let hypothetical = candidate
            .claims
            .iter()
            .filter(|c| c.claim_type == ClaimType::Hypothesis)
            .count();
        let ratio = hypothetical as f64 / candidate.claims.len() as f64;
        if ratio > HYPOTHETICAL_RATIO_THRESHOLD {
            issues.push(CriticIssue {
                rule: "mostly_hypothetical",
                severity: CriticSeverity::Critical,
                detail: format!("{:.0}% of claims are hypothesis", ratio * 100.0),
            });
        }
    }

    // conflicts_not_acknowledged (warn): the pack surfaced conflict pairs but
    // no candidate claim mentions the conflict.
    if !pack.conflict_pairs.is_empty() {
        let acknowledged = candidate
            .claims
            .iter()
            .any(|c| c.text.to_lowercase().contains("conflict") || c.text.to_lowercase().contains("dispute"));
        if !acknowledged {
            issues.push(CriticIssue {
                rule: "conflicts_not_acknowledged",
                severity: CriticSeverity::Warn,
                detail: format!("{} conflict pair(s) in the pack go unmentioned", pack.conflict_pairs.len()),
            });
        }
    }

    // internal_inconsistency (critical): two merged claims negate one another
    // on overlapping subject matter (same contradiction rule as I8).
    let mut inconsistent = false;
    for i in 0..candidate.claims.len() {
        for j in (i + 1)..candidate.claims.len() {
            if cognos_core::epistemic::contradicts(&candidate.claims[i].text, &candidate.claims[j].text) {
                inconsistent = true;
            }
        }
    }
    if inconsistent {
        issues.push(CriticIssue {
            rule: "internal_inconsistency",
            severity: CriticSeverity::Critical,
            detail: "candidate merges two claims that negate one another".to_string(),
        });
    }

    let needs_escalation = issues.iter().any(|i| i.severity == CriticSeverity::Critical);
    CriticReport { issues, needs_escalation }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognos_core::{Author, Claim, DtuStatus, EvidenceTier, Lane, Lineage, OriginTag, PipelineMeta, Scores};

    fn bare_candidate(claims: Vec<Claim>) -> Dtu {
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

    fn empty_pack() -> RetrievalPack {
        RetrievalPack {
            core: vec![],
            peripheral: vec![],
            citations: vec![],
            conflict_pairs: vec![],
        }
    }

    #[test]
    fn unsupported_claim_is_critical() {
        let candidate = bare_candidate(vec![Claim {
            claim_type: ClaimType::Fact,
            text: "x".into(),
            evidence_tier: EvidenceTier::Supported,
            sources: vec![],
        }]);
        let report = run_critic(&candidate, &empty_pack());
        assert!(report.needs_escalation);
        assert!(report.issues.iter().any(|i| i.rule == "no_evidence_links"));
    }

    #[test]
    fn mostly_hypothetical_triggers_escalation() {
        let candidate = bare_candidate(vec![
            Claim {
                claim_type: ClaimType::Hypothesis,
                text: "maybe a".into(),
                evidence_tier: EvidenceTier::Unsourced,
                sources: vec!["s1".into()],
            },
            Claim {
                claim_type: ClaimType::Hypothesis,
                text: "maybe b".into(),
                evidence_tier: EvidenceTier::Unsourced,
                sources: vec!["s2".into()],
            },
        ]);
        let report = run_critic(&candidate, &empty_pack());
        assert!(report.issues.iter().any(|i| i.rule == "mostly_hypothetical"));
    }

    #[test]
    fn internal_inconsistency_detected_on_negated_overlap() {
        let candidate = bare_candidate(vec![
            Claim {
                claim_type: ClaimType::Fact,
                text: "The speed of light is 299792458".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["s1".into()],
            },
            Claim {
                claim_type: ClaimType::Fact,
                text: "The speed of light is not 299792458".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["s2".into()],
            },
        ]);
        let report = run_critic(&candidate, &empty_pack());
        assert!(report.issues.iter().any(|i| i.rule == "internal_inconsistency"));
        assert!(report.needs_escalation);
    }
}
