//! Stage 2: builder.
//!
//! Merges a retrieval pack's core content into one candidate DTU. Per-claim
//! `support` (the DTU ids the claim was merged from) is carried in
//! `Claim::sources` — for an autogen-originated claim that field holds
//! supporting-DTU ids rather than citation strings, per SPEC_FULL.md's note
//! that the two concepts share a slot on the DTU model.

use cognos_core::{Author, Claim, ClaimType, Dtu, DtuStatus, EvidenceTier, Lane, Lineage, OriginTag, PipelineMeta, Scores};

use crate::error::{AutogenError, AutogenResult};
use crate::retrieval::RetrievalPack;
use crate::target_selection::TargetIntent;

/// Confidence floor applied to every merged claim regardless of source
/// confidence.
pub const CONFIDENCE_FLOOR: f64 = 0.3;

/// Maps a source claim's existing type/evidence into the builder's
/// `fact | inference | hypothesis` classification. `ClaimType` has no
/// standalone "inference" variant; `Interpretation`/`ModelOutput`/`Reception`
/// all collapse onto it here.
fn classify(source_type: ClaimType, evidence_tier: EvidenceTier) -> ClaimType {
    match source_type {
        ClaimType::Fact if evidence_tier != EvidenceTier::Unsourced => ClaimType::Fact,
        ClaimType::Hypothesis => ClaimType::Hypothesis,
        _ if evidence_tier == EvidenceTier::Unsourced => ClaimType::Hypothesis,
        _ => ClaimType::Interpretation,
    }
}

/// Builds a single candidate DTU from the pack's core DTUs. Aborts without touching the store.
pub fn build_candidate(
    pack: &RetrievalPack,
    intent: TargetIntent,
    candidate_id: String,
    creator_id: &str,
    now_ms: i64,
) -> AutogenResult<Dtu> {
    if pack.is_empty() {
        return Err(AutogenError::EmptyPack);
    }

    let mut claims: Vec<Claim> = Vec::new();
    for source_dtu in &pack.core {
        for claim in &source_dtu.claims {
            let classification = classify(claim.claim_type, claim.evidence_tier);
            claims.push(Claim {
                claim_type: classification,
                text: claim.text.clone(),
                evidence_tier: claim.evidence_tier,
                sources: vec![source_dtu.id.clone()],
            });
        }
    }

    let mut tags: Vec<String> = pack.core.iter().flat_map(|d| d.tags.clone()).collect();
    tags.sort();
    tags.dedup();

    let parent_ids: Vec<String> = pack.core.iter().map(|d| d.id.clone()).collect();
    let generation_depth = pack
        .core
        .iter()
        .map(|d| d.lineage.generation_depth)
        .max()
        .unwrap_or(0)
        + 1;

    let confidence_factual = pack
        .core
        .iter()
        .map(|d| d.scores.confidence_factual)
        .sum::<f64>()
        / pack.core.len() as f64;
    let confidence_overall = confidence_factual.max(CONFIDENCE_FLOOR);

    let title = format!("{}: {}", intent.as_str(), pack.core[0].title);

    Ok(Dtu {
        id: candidate_id,
        created_at_ms: now_ms,
        author: Author {
            id: creator_id.to_string(),
            display_name: None,
        },
        title,
        tags,
        claims,
        domain_type: pack.core[0].domain_type.clone(),
        epistemic_class: pack.core[0].epistemic_class,
        lineage: Lineage {
            parent_ids,
            generation_depth,
            origin: OriginTag::Autogen,
        },
        scores: Scores {
            credibility_structural: 0.0,
            confidence_factual,
            confidence_overall,
        },
        status: DtuStatus::Draft,
        lane: Lane::Local,
        content_hash: None,
        license: None,
        creator_id: creator_id.to_string(),
        origin_fingerprint: None,
        meta: PipelineMeta::default(),
        provenance: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognos_core::{DtuStatus as Status, Lineage as Lin};

    fn pack_with_one_core() -> RetrievalPack {
        let core = Dtu {
            id: "core-1".into(),
            created_at_ms: 0,
            author: Author {
                id: "c".into(),
                display_name: None,
            },
            title: "gravity".into(),
            tags: vec!["physics".into()],
            claims: vec![Claim {
                claim_type: ClaimType::Fact,
                text: "g is 9.8".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["src".into()],
            }],
            domain_type: Some("physics".into()),
            epistemic_class: None,
            lineage: Lin {
                parent_ids: vec![],
                generation_depth: 0,
                origin: OriginTag::Human,
            },
            scores: Scores {
                credibility_structural: 0.9,
                confidence_factual: 0.9,
                confidence_overall: 0.9,
            },
            status: Status::Verified,
            lane: Lane::Global,
            content_hash: None,
            license: None,
            creator_id: "c".into(),
            origin_fingerprint: None,
            meta: PipelineMeta::default(),
            provenance: None,
        };
        RetrievalPack {
            core: vec![core],
            peripheral: vec![],
            citations: vec!["src".into()],
            conflict_pairs: vec![],
        }
    }

    #[test]
    fn empty_pack_aborts() {
        let pack = RetrievalPack {
            core: vec![],
            peripheral: vec![],
            citations: vec![],
            conflict_pairs: vec![],
        };
        let result = build_candidate(&pack, TargetIntent::FillGaps, "cand-1".into(), "autogen", 0);
        assert!(matches!(result, Err(AutogenError::EmptyPack)));
    }

    #[test]
    fn builder_merges_claims_with_support() {
        let pack = pack_with_one_core();
        let candidate = build_candidate(&pack, TargetIntent::FillGaps, "cand-1".into(), "autogen", 0).unwrap();
        assert_eq!(candidate.claims.len(), 1);
        assert_eq!(candidate.claims[0].sources, vec!["core-1".to_string()]);
        assert_eq!(candidate.lineage.parent_ids, vec!["core-1".to_string()]);
        assert_eq!(candidate.lineage.generation_depth, 1);
        assert!(candidate.scores.confidence_overall >= CONFIDENCE_FLOOR);
    }
}
