//! Stage 6: novelty.
//!
//! Grounded on the teacher's `rollback::GeneticMemory::check_genetic_dead_end`
//! bounded-ring-of-past-hashes pattern, applied here to generated-candidate
//! payload hashes instead of compiled-skill genomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use cognos_core::{content_hash, AtlasStore, Dtu};

use crate::synthesizer::DEDUPE_THRESHOLD;

/// Bounded ring of recently-generated candidate hashes.
pub const RECENT_HASH_CAPACITY: usize = 500;

/// Store-similarity threshold at which a novel-enough candidate still gets
/// redirected into a patch proposal against the existing near-duplicate
/// rather than landing as a fresh write.
pub const PATCH_PROPOSAL_THRESHOLD: f64 = 0.85;

pub struct NoveltyLedger {
    recent: Mutex<VecDeque<String>>,
}

impl NoveltyLedger {
    pub fn new() -> Self {
        Self {
            recent: Mutex::new(VecDeque::with_capacity(RECENT_HASH_CAPACITY)),
        }
    }

    fn remember(&self, hash: String) {
        let mut recent = self.recent.lock().expect("novelty ledger lock poisoned");
        if recent.len() == RECENT_HASH_CAPACITY {
            recent.pop_front();
        }
        recent.push_back(hash);
    }

    fn contains(&self, hash: &str) -> bool {
        self.recent.lock().expect("novelty ledger lock poisoned").iter().any(|h| h == hash)
    }
}

impl Default for NoveltyLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum NoveltyOutcome {
    /// Hash collided with a recently-generated candidate; reject outright.
    RejectedDuplicateGeneration,
    /// Similar enough to an existing stored DTU; propose a patch against it
    /// rather than writing a new DTU.
    PatchProposal { against_dtu_id: String, similarity: f64 },
    /// Genuinely novel; safe to carry into the write-policy stage.
    Novel,
}

fn candidate_hash(candidate: &Dtu) -> String {
    content_hash(
        &candidate.title,
        candidate.domain_type.as_deref().unwrap_or(""),
        candidate.epistemic_class.map(|c| format!("{c:?}")).unwrap_or_default().as_str(),
        &candidate.tags,
        &candidate.claims,
        &candidate.creator_id,
    )
}

/// Computes the candidate's payload hash, checks it against the recent-hash
/// ring, then checks the candidate against the store's existing DTUs for a
/// near-duplicate. On `Novel`, the hash is recorded into
/// the ring so a later identical regeneration is caught.
pub fn check_novelty(ledger: &NoveltyLedger, store: &AtlasStore, candidate: &Dtu) -> NoveltyOutcome {
    let hash = candidate_hash(candidate);
    if ledger.contains(&hash) {
        return NoveltyOutcome::RejectedDuplicateGeneration;
    }

    let mut best: Option<(String, f64)> = None;
    for existing in store.all() {
        let sim = store.similarity(candidate, &existing);
        if sim >= PATCH_PROPOSAL_THRESHOLD {
            match &best {
                Some((_, best_sim)) if *best_sim >= sim => {}
                _ => best = Some((existing.id.clone(), sim)),
            }
        }
    }

    ledger.remember(hash);

    match best {
        Some((against_dtu_id, similarity)) => NoveltyOutcome::PatchProposal { against_dtu_id, similarity },
        None => NoveltyOutcome::Novel,
    }
}

/// Near-duplicate claim texts collapse via the same Dice-overlap measure the
/// synthesizer uses, so the threshold stays single-sourced in one place.
pub fn claim_text_near_duplicate(a: &str, b: &str) -> bool {
    cognos_core::epistemic::subject_overlap(a, b) >= DEDUPE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognos_core::{
        Author, Claim, ClaimType, DtuStatus, EvidenceTier, Lane, Lineage, OriginTag, PipelineMeta, Scores,
    };

    fn dtu(id: &str, title: &str) -> Dtu {
        Dtu {
            id: id.to_string(),
            created_at_ms: 0,
            author: Author {
                id: "c".into(),
                display_name: None,
            },
            title: title.to_string(),
            tags: vec!["physics".into()],
            claims: vec![Claim {
                claim_type: ClaimType::Fact,
                text: "gravity is 9.8 meters per second squared".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["s".into()],
            }],
            domain_type: Some("physics".into()),
            epistemic_class: None,
            lineage: Lineage {
                parent_ids: vec![],
                generation_depth: 0,
                origin: OriginTag::Human,
            },
            scores: Scores::default(),
            status: DtuStatus::Draft,
            lane: Lane::Local,
            content_hash: None,
            license: None,
            creator_id: "c".into(),
            origin_fingerprint: None,
            meta: PipelineMeta::default(),
            provenance: None,
        }
    }

    #[test]
    fn identical_hash_is_rejected_on_replay() {
        let ledger = NoveltyLedger::new();
        let store = AtlasStore::new();
        let candidate = dtu("cand", "gravity constant");
        assert!(matches!(check_novelty(&ledger, &store, &candidate), NoveltyOutcome::Novel));
        assert!(matches!(
            check_novelty(&ledger, &store, &candidate),
            NoveltyOutcome::RejectedDuplicateGeneration
        ));
    }

    #[test]
    fn near_duplicate_of_stored_dtu_becomes_patch_proposal() {
        let ledger = NoveltyLedger::new();
        let store = AtlasStore::new();
        store.put(dtu("existing", "gravity constant"));
        let candidate = dtu("cand", "gravity constant");
        let outcome = check_novelty(&ledger, &store, &candidate);
        assert!(matches!(outcome, NoveltyOutcome::PatchProposal { ref against_dtu_id, .. } if against_dtu_id == "existing"));
    }

    #[test]
    fn genuinely_novel_candidate_passes() {
        let ledger = NoveltyLedger::new();
        let store = AtlasStore::new();
        store.put(dtu("existing", "thermodynamics entropy"));
        let candidate = dtu("cand", "gravity constant");
        assert!(matches!(check_novelty(&ledger, &store, &candidate), NoveltyOutcome::Novel));
    }
}
