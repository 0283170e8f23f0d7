//! AtlasStore: the DTU entity store over `ShardedStore`/`EpistemicKernel`/`RightsEngine` (C10).
//!
//! CAS-guarded status transitions keyed on a last-evaluated timestamp, same
//! discipline as an optimistic-concurrency record store.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::atlas::model::{
    Claim, ClaimType, ContradictionType, Dtu, DtuStatus, DomainTypeClass, EvidenceTier, Lane, Link, LinkType,
    Scores, Severity,
};
use crate::error::{SubstrateError, SubstrateResult};
use crate::sharded_store::ShardedStore;

/// Dedupe/similarity thresholds:
/// 0.85 marks a `SAME_AS` candidate during the auto-promote gate's dedupe
/// check; 0.90 is Heartbeat's stricter same-as confirmation.
pub const DEDUPE_SIMILARITY_THRESHOLD: f64 = 0.85;
pub const DEDUPE_CONFIRM_THRESHOLD: f64 = 0.90;
pub const STRUCTURAL_SCORE_GLOBAL: f64 = 0.80;
pub const STRUCTURAL_SCORE_MARKETPLACE: f64 = 0.60;
pub const FACTUAL_CONFIDENCE_THRESHOLD: f64 = 0.80;

#[derive(Debug, Clone)]
pub struct GateCheck {
    pub name: &'static str,
    pub pass: bool,
    pub detail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GateResult {
    pub pass: bool,
    pub checks: Vec<GateCheck>,
    pub same_as_candidate: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TransitionResult {
    pub ok: bool,
    pub noop: bool,
    pub status: DtuStatus,
}

pub struct AtlasStore {
    dtus: ShardedStore<String, Dtu>,
    links: RwLock<Vec<Link>>,
}

fn lane_shard_key(dtu: &Dtu) -> String {
    match dtu.lane {
        Lane::Local => "local".to_string(),
        Lane::Global => "global".to_string(),
        Lane::Marketplace => "marketplace".to_string(),
    }
}

impl AtlasStore {
    pub fn new() -> Self {
        Self {
            dtus: ShardedStore::new(lane_shard_key),
            links: RwLock::new(Vec::new()),
        }
    }

    pub fn put(&self, dtu: Dtu) {
        self.dtus.put(dtu.id.clone(), dtu);
    }

    pub fn get(&self, id: &str) -> Option<Dtu> {
        self.dtus.get(&id.to_string(), None)
    }

    pub fn all_in_lane(&self, lane: Lane) -> Vec<Dtu> {
        let key = match lane {
            Lane::Local => "local",
            Lane::Global => "global",
            Lane::Marketplace => "marketplace",
        };
        self.dtus.query_shard(key, |_| true, 0)
    }

    pub fn all(&self) -> Vec<Dtu> {
        let mut out = Vec::new();
        for lane in [Lane::Local, Lane::Global, Lane::Marketplace] {
            out.extend(self.all_in_lane(lane));
        }
        out
    }

    pub fn add_link(&self, link: Link) {
        self.links.write().expect("links lock poisoned").push(link);
    }

    pub fn links_from(&self, id: &str) -> Vec<Link> {
        self.links
            .read()
            .expect("links lock poisoned")
            .iter()
            .filter(|l| l.from_id == id)
            .cloned()
            .collect()
    }

    pub fn links_to(&self, id: &str) -> Vec<Link> {
        self.links
            .read()
            .expect("links lock poisoned")
            .iter()
            .filter(|l| l.to_id == id)
            .cloned()
            .collect()
    }

    /// I5: iterative DFS from the candidate's parents; never recurses on
    /// untrusted input.
    pub fn detect_lineage_cycle(&self, candidate_id: &str, parent_ids: &[String]) -> bool {
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack: Vec<String> = parent_ids.to_vec();
        while let Some(current) = stack.pop() {
            if current == candidate_id {
                return true;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(dtu) = self.get(&current) {
                stack.extend(dtu.lineage.parent_ids.clone());
            }
        }
        false
    }

    /// I3/I4: CAS-guarded status transition. A supplied `expected_status`
    /// that doesn't match current is rejected; re-setting the same status is
    /// an idempotent no-op.
    pub fn transition_status(
        &self,
        id: &str,
        new_status: DtuStatus,
        expected_status: Option<&DtuStatus>,
    ) -> SubstrateResult<TransitionResult> {
        let mut dtu = self
            .get(id)
            .ok_or_else(|| SubstrateError::validation(format!("no such DTU: {id}")))?;

        if let Some(expected) = expected_status {
            if expected.tag() != dtu.status.tag() {
                return Err(SubstrateError::OptimisticConcurrency {
                    expected: expected.tag().to_string(),
                    actual: dtu.status.tag().to_string(),
                });
            }
        }

        if status_eq(&dtu.status, &new_status) {
            return Ok(TransitionResult {
                ok: true,
                noop: true,
                status: dtu.status,
            });
        }

        dtu.status = new_status.clone();
        self.put(dtu);
        Ok(TransitionResult {
            ok: true,
            noop: false,
            status: new_status,
        })
    }

    /// Deterministic score recompute (spec §3 "recomputed by Heartbeat"; §4.10
    /// tickLocal/tickGlobal "recompute scores"): structural completeness and
    /// per-claim citation coverage drive `credibility_structural`, evidence
    /// tiers drive `confidence_factual`, and support/contradiction link
    /// counts adjust `confidence_overall`. Persists the recomputed scores and
    /// returns them.
    pub fn recompute_scores(&self, id: &str) -> Option<Scores> {
        let mut dtu = self.get(id)?;
        let fact_claims: Vec<&Claim> = dtu.claims.iter().filter(|c| c.claim_type == ClaimType::Fact).collect();

        let structural_base = if dtu.domain_type.is_some() && dtu.epistemic_class.is_some() {
            0.5
        } else {
            0.2
        };
        let cited_fraction = if fact_claims.is_empty() {
            1.0
        } else {
            fact_claims.iter().filter(|c| !c.sources.is_empty()).count() as f64 / fact_claims.len() as f64
        };
        let credibility_structural = (structural_base + cited_fraction * 0.5).clamp(0.0, 1.0);

        let confidence_factual = if fact_claims.is_empty() {
            0.5
        } else {
            let sum: f64 = fact_claims.iter().map(|c| evidence_tier_weight(c.evidence_tier)).sum();
            (sum / fact_claims.len() as f64).clamp(0.0, 1.0)
        };

        let support_count = self
            .links_to(id)
            .iter()
            .filter(|l| l.link_type == LinkType::Supports)
            .count();
        let contradiction_count = self
            .links_to(id)
            .iter()
            .filter(|l| l.link_type == LinkType::Contradicts)
            .count();
        let support_bonus = (support_count as f64 * 0.05).min(0.2);
        let contradiction_penalty = (contradiction_count as f64 * 0.1).min(0.3);
        let confidence_overall = ((credibility_structural + confidence_factual) / 2.0 + support_bonus
            - contradiction_penalty)
            .clamp(0.0, 1.0);

        dtu.scores = Scores {
            credibility_structural,
            confidence_factual,
            confidence_overall,
        };
        self.put(dtu.clone());
        Some(dtu.scores)
    }

    /// Similarity over title + sorted tags + claim texts (bag-of-words Dice),
    /// used by the auto-promote gate's dedupe check and Heartbeat's sweep.
    pub fn similarity(&self, a: &Dtu, b: &Dtu) -> f64 {
        let words = |dtu: &Dtu| -> HashSet<String> {
            let mut set: HashSet<String> = HashSet::new();
            set.extend(tokenize(&dtu.title));
            for tag in &dtu.tags {
                set.insert(tag.to_lowercase());
            }
            for claim in &dtu.claims {
                set.extend(tokenize(&claim.text));
            }
            set
        };
        let wa = words(a);
        let wb = words(b);
        if wa.is_empty() || wb.is_empty() {
            return 0.0;
        }
        let shared = wa.intersection(&wb).count() as f64;
        2.0 * shared / (wa.len() as f64 + wb.len() as f64)
    }

    /// Ordered auto-promote check list. Any failing check fails
    /// the whole gate; execution still runs every check so the caller gets a
    /// full report.
    pub fn auto_promote_gate(&self, candidate: &Dtu, target: Lane) -> GateResult {
        let mut checks = Vec::new();
        let mut same_as_candidate = None;

        // 1. no_uncited_facts — required for GLOBAL, skipped for LOCAL.
        let uncited_check = if target == Lane::Local {
            true
        } else {
            candidate
                .claims
                .iter()
                .filter(|c| c.claim_type == ClaimType::Fact)
                .all(|c| !c.sources.is_empty())
        };
        checks.push(GateCheck {
            name: "no_uncited_facts",
            pass: uncited_check,
            detail: None,
        });

        // 2. structural_score
        let structural_threshold = match target {
            Lane::Global => STRUCTURAL_SCORE_GLOBAL,
            Lane::Marketplace => STRUCTURAL_SCORE_MARKETPLACE,
            Lane::Local => 0.0,
        };
        checks.push(GateCheck {
            name: "structural_score",
            pass: candidate.scores.credibility_structural >= structural_threshold,
            detail: None,
        });

        // 3. factual_confidence
        checks.push(GateCheck {
            name: "factual_confidence",
            pass: candidate.scores.confidence_factual >= FACTUAL_CONFIDENCE_THRESHOLD,
            detail: None,
        });

        // 4. no_contradictions — no HIGH contradiction edge to a VERIFIED peer
        //    with higher confidence_overall.
        let mut has_blocking_contradiction = false;
        for link in self.links_from(&candidate.id) {
            if link.link_type == LinkType::Contradicts && link.severity == Severity::High {
                if let Some(target_dtu) = self.get(&link.to_id) {
                    if matches!(target_dtu.status, DtuStatus::Verified | DtuStatus::VerifiedInterpretation)
                        && target_dtu.scores.confidence_overall > candidate.scores.confidence_overall
                    {
                        has_blocking_contradiction = true;
                    }
                }
            }
        }
        checks.push(GateCheck {
            name: "no_contradictions",
            pass: !has_blocking_contradiction,
            detail: None,
        });

        // 5. no_lineage_cycle
        let has_cycle = self.detect_lineage_cycle(&candidate.id, &candidate.lineage.parent_ids);
        checks.push(GateCheck {
            name: "no_lineage_cycle",
            pass: !has_cycle,
            detail: None,
        });

        // 6. dedupe
        let mut dedupe_pass = true;
        for existing in self.all() {
            if existing.id == candidate.id {
                continue;
            }
            let sim = self.similarity(candidate, &existing);
            if sim >= DEDUPE_CONFIRM_THRESHOLD {
                same_as_candidate = Some(existing.id.clone());
                dedupe_pass = false;
            } else if sim >= DEDUPE_SIMILARITY_THRESHOLD && same_as_candidate.is_none() {
                same_as_candidate = Some(existing.id.clone());
            }
        }
        checks.push(GateCheck {
            name: "dedupe",
            pass: dedupe_pass,
            detail: same_as_candidate.clone(),
        });

        // 7. claim_lane_consistency — I1 (re-checked here so it also binds for
        //    LOCAL promotions, since check 1 above is skipped for LOCAL) & I2.
        let i1_ok = candidate
            .claims
            .iter()
            .filter(|c| c.claim_type == ClaimType::Fact)
            .all(|c| c.evidence_tier != EvidenceTier::Unsourced);
        let i2_ok = candidate.claims.iter().all(|c| !c.violates_evidence_tier_invariant());
        checks.push(GateCheck {
            name: "claim_lane_consistency",
            pass: i1_ok && i2_ok,
            detail: None,
        });

        let pass = checks.iter().all(|c| c.pass);
        GateResult {
            pass,
            checks,
            same_as_candidate,
        }
    }

    /// On adding a HIGH/NUMERIC `contradicts` link from candidate A to a
    /// VERIFIED target B: dispute whichever side has lower
    /// `confidence_overall`. Never disputes both.
    pub fn handle_contradiction_link(&self, link: &Link) -> Option<String> {
        if link.link_type != LinkType::Contradicts
            || link.severity != Severity::High
            || link.contradiction_type != Some(ContradictionType::Numeric)
        {
            return None;
        }
        let a = self.get(&link.from_id)?;
        let b = self.get(&link.to_id)?;
        if !matches!(b.status, DtuStatus::Verified | DtuStatus::VerifiedInterpretation) {
            return None;
        }
        let disputed_id = if a.scores.confidence_overall > b.scores.confidence_overall {
            b.id.clone()
        } else {
            a.id.clone()
        };
        let _ = self.transition_status(&disputed_id, DtuStatus::Disputed, None);
        Some(disputed_id)
    }

    /// I1: a FACT claim with UNSOURCED evidence tier may never reach VERIFIED.
    pub fn violates_uncited_fact_invariant(dtu: &Dtu) -> bool {
        matches!(dtu.status, DtuStatus::Verified) && dtu.claims.iter().any(|c| c.claim_type == ClaimType::Fact && c.evidence_tier == EvidenceTier::Unsourced)
    }

    /// Label adjustment for the terminal promotion state: INTERPRETIVE
    /// candidates land on `VERIFIED_INTERPRETATION` rather than `VERIFIED`.
    pub fn verified_label(epistemic_class: Option<DomainTypeClass>) -> DtuStatus {
        match epistemic_class {
            Some(DomainTypeClass::Interpretive) => DtuStatus::VerifiedInterpretation,
            _ => DtuStatus::Verified,
        }
    }
}

impl Default for AtlasStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cheapest-to-most-corroborating weight used by `recompute_scores`.
fn evidence_tier_weight(tier: EvidenceTier) -> f64 {
    match tier {
        EvidenceTier::Unsourced => 0.0,
        EvidenceTier::Supported => 0.6,
        EvidenceTier::Corroborated => 0.85,
        EvidenceTier::Proven => 1.0,
    }
}

fn status_eq(a: &DtuStatus, b: &DtuStatus) -> bool {
    match (a, b) {
        (DtuStatus::SameAs(x), DtuStatus::SameAs(y)) => x == y,
        _ => a.tag() == b.tag(),
    }
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::model::{Author, Lineage, OriginTag, PipelineMeta, Provenance, Scores};

    fn make_dtu(id: &str, title: &str, lane: Lane) -> Dtu {
        Dtu {
            id: id.to_string(),
            created_at_ms: 0,
            author: Author {
                id: "creator".into(),
                display_name: None,
            },
            title: title.to_string(),
            tags: vec![],
            claims: vec![],
            domain_type: None,
            epistemic_class: None,
            lineage: Lineage {
                parent_ids: vec![],
                generation_depth: 0,
                origin: OriginTag::Human,
            },
            scores: Scores::default(),
            status: DtuStatus::Draft,
            lane,
            content_hash: None,
            license: None,
            creator_id: "creator".into(),
            origin_fingerprint: None,
            meta: PipelineMeta::default(),
            provenance: Some(Provenance {
                source_type: "human".into(),
                source_id: "u1".into(),
                confidence: 0.9,
                created_at_ms: 0,
            }),
        }
    }

    #[test]
    fn scenario_uncited_fact_fails_global_promotion() {
        let store = AtlasStore::new();
        let mut dtu = make_dtu("g1", "g=9.8", Lane::Global);
        dtu.domain_type = Some("empirical.physics".into());
        dtu.epistemic_class = Some(DomainTypeClass::Empirical);
        dtu.claims = vec![Claim {
            claim_type: ClaimType::Fact,
            text: "Gravity is 9.8 m/s^2".into(),
            evidence_tier: EvidenceTier::Unsourced,
            sources: vec![],
        }];
        dtu.scores = Scores {
            credibility_structural: 0.9,
            confidence_factual: 0.85,
            confidence_overall: 0.87,
        };
        store.put(dtu.clone());
        let result = store.auto_promote_gate(&dtu, Lane::Global);
        assert!(!result.pass);
        let uncited = result.checks.iter().find(|c| c.name == "no_uncited_facts").unwrap();
        assert!(!uncited.pass);
    }

    #[test]
    fn scenario_contradiction_disputes_lower_confidence_side() {
        let store = AtlasStore::new();
        let mut b = make_dtu("B", "speed of light", Lane::Global);
        b.status = DtuStatus::Verified;
        b.scores.confidence_overall = 0.95;
        store.put(b);

        let mut a = make_dtu("A", "speed of light wrong", Lane::Global);
        a.scores.confidence_overall = 0.80;
        store.put(a.clone());

        let link = Link {
            id: "l1".into(),
            from_id: "A".into(),
            to_id: "B".into(),
            link_type: LinkType::Contradicts,
            severity: Severity::High,
            contradiction_type: Some(ContradictionType::Numeric),
        };
        store.add_link(link.clone());
        let disputed = store.handle_contradiction_link(&link);
        assert_eq!(disputed, Some("A".to_string()));
        assert_eq!(store.get("A").unwrap().status, DtuStatus::Disputed);
        assert_eq!(store.get("B").unwrap().status, DtuStatus::Verified);
    }

    #[test]
    fn scenario_lineage_cycle_detected() {
        let store = AtlasStore::new();
        let mut a = make_dtu("A", "a", Lane::Local);
        store.put(a.clone());
        let mut b = make_dtu("B", "b", Lane::Local);
        b.lineage.parent_ids = vec!["A".into()];
        store.put(b.clone());
        let mut c = make_dtu("C", "c", Lane::Local);
        c.lineage.parent_ids = vec!["B".into()];
        store.put(c.clone());
        // D's parent is C, but A is secretly made a descendant of D (cycle A->...->D->A)
        a.lineage.parent_ids = vec!["D".into()];
        store.put(a);

        let has_cycle = store.detect_lineage_cycle("D", &["C".to_string()]);
        assert!(has_cycle);
    }

    #[test]
    fn cas_transition_rejects_mismatched_expected_status() {
        let store = AtlasStore::new();
        let dtu = make_dtu("d1", "t", Lane::Local);
        store.put(dtu);
        let result = store.transition_status("d1", DtuStatus::Proposed, Some(&DtuStatus::Verified));
        assert!(result.is_err());
    }

    #[test]
    fn idempotent_repromotion_is_a_noop() {
        let store = AtlasStore::new();
        let mut dtu = make_dtu("d1", "t", Lane::Local);
        dtu.status = DtuStatus::Proposed;
        store.put(dtu);
        let result = store
            .transition_status("d1", DtuStatus::Proposed, None)
            .unwrap();
        assert!(result.noop);
    }

    #[test]
    fn empty_store_gate_checks_run_without_panic() {
        let store = AtlasStore::new();
        let dtu = make_dtu("solo", "solo", Lane::Global);
        let result = store.auto_promote_gate(&dtu, Lane::Global);
        assert!(!result.pass); // structural/factual scores default to 0.0
    }

    #[test]
    fn recompute_scores_rewards_cited_well_supported_claims() {
        let store = AtlasStore::new();
        let mut dtu = make_dtu("d1", "gravity", Lane::Global);
        dtu.domain_type = Some("empirical.physics".into());
        dtu.epistemic_class = Some(DomainTypeClass::Empirical);
        dtu.claims = vec![Claim {
            claim_type: ClaimType::Fact,
            text: "g is 9.8".into(),
            evidence_tier: EvidenceTier::Corroborated,
            sources: vec!["textbook".into()],
        }];
        store.put(dtu);

        let scores = store.recompute_scores("d1").unwrap();
        assert_eq!(scores.credibility_structural, 1.0);
        assert_eq!(scores.confidence_factual, 0.85);
        assert!(scores.confidence_overall > 0.0);
        assert_eq!(store.get("d1").unwrap().scores.confidence_overall, scores.confidence_overall);
    }

    #[test]
    fn recompute_scores_penalizes_uncited_facts_and_contradictions() {
        let store = AtlasStore::new();
        let mut dtu = make_dtu("d2", "bad claim", Lane::Global);
        dtu.claims = vec![Claim {
            claim_type: ClaimType::Fact,
            text: "unsupported".into(),
            evidence_tier: EvidenceTier::Unsourced,
            sources: vec![],
        }];
        store.put(dtu.clone());

        let mut other = make_dtu("d3", "other", Lane::Global);
        other.status = DtuStatus::Verified;
        store.put(other);
        store.add_link(Link {
            id: "l1".into(),
            from_id: "d3".into(),
            to_id: "d2".into(),
            link_type: LinkType::Contradicts,
            severity: Severity::High,
            contradiction_type: Some(ContradictionType::Numeric),
        });

        let scores = store.recompute_scores("d2").unwrap();
        assert_eq!(scores.credibility_structural, 0.2); // no domain_type/epistemic_class, no citation
        assert_eq!(scores.confidence_factual, 0.0); // unsourced
        assert!(scores.confidence_overall < 0.2); // contradiction penalty applied
    }
}
