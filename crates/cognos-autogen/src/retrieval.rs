//! Stage 1: retrieval pack.
//!
//! Grounded on the teacher's `KbRecord`/`EventRecord` content-plus-metadata
//! shape (`knowledge/store.rs`): a plain struct bundling the selected records
//! with their cross-references, rather than a lazily-joined query object.

use std::collections::HashSet;

use cognos_core::{AtlasStore, Dtu, Lane, LinkType};
use serde::{Deserialize, Serialize};

use crate::target_selection::TargetIntent;

pub const CORE_MIN: usize = 10;
pub const CORE_MAX: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalPack {
    pub core: Vec<Dtu>,
    pub peripheral: Vec<Dtu>,
    pub citations: Vec<String>,
    pub conflict_pairs: Vec<(String, String)>,
}

impl RetrievalPack {
    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }
}

/// Intent-specific ordering over candidate DTUs: each intent favors the DTUs
/// most relevant to the work it describes.
fn intent_score(dtu: &Dtu, intent: TargetIntent, store: &AtlasStore) -> f64 {
    match intent {
        TargetIntent::FillGaps => {
            let gap = dtu.domain_type.is_none() || dtu.epistemic_class.is_none();
            if gap {
                1.0
            } else {
                0.0
            }
        }
        TargetIntent::ResolveConflicts => store
            .links_from(&dtu.id)
            .iter()
            .filter(|l| l.link_type == LinkType::Contradicts)
            .count() as f64,
        TargetIntent::CompressClusters => dtu.tags.len() as f64,
        TargetIntent::ExtractPatterns => dtu.claims.len() as f64,
        TargetIntent::ElevateHighUsage => store.links_to(&dtu.id).len() as f64,
    }
}

/// Builds the scored core/peripheral selection plus citations and conflict
/// pairs. Core is 10-30 DTUs when the lattice has that many; smaller lattices
/// yield a smaller (possibly empty) core rather than padding with
/// irrelevant records.
pub fn build_retrieval_pack(store: &AtlasStore, intent: TargetIntent) -> RetrievalPack {
    let mut candidates = store.all();
    candidates.sort_by(|a, b| {
        intent_score(b, intent, store)
            .partial_cmp(&intent_score(a, intent, store))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.scores.confidence_overall.partial_cmp(&a.scores.confidence_overall).unwrap_or(std::cmp::Ordering::Equal))
    });

    let core_len = candidates.len().min(CORE_MAX);
    let core: Vec<Dtu> = candidates.drain(..core_len).collect();
    let core_ids: HashSet<String> = core.iter().map(|d| d.id.clone()).collect();

    // Peripheral: anything linked to or from a core DTU that isn't itself core.
    let mut peripheral_ids: HashSet<String> = HashSet::new();
    for dtu in &core {
        for link in store.links_from(&dtu.id) {
            if !core_ids.contains(&link.to_id) {
                peripheral_ids.insert(link.to_id.clone());
            }
        }
        for link in store.links_to(&dtu.id) {
            if !core_ids.contains(&link.from_id) {
                peripheral_ids.insert(link.from_id.clone());
            }
        }
    }
    let peripheral: Vec<Dtu> = peripheral_ids.iter().filter_map(|id| store.get(id)).collect();

    let mut citations: Vec<String> = Vec::new();
    for dtu in &core {
        for claim in &dtu.claims {
            for source in &claim.sources {
                if !citations.contains(source) {
                    citations.push(source.clone());
                }
            }
        }
    }

    let mut conflict_pairs: Vec<(String, String)> = Vec::new();
    for dtu in &core {
        for link in store.links_from(&dtu.id) {
            if link.link_type == LinkType::Contradicts {
                conflict_pairs.push((link.from_id.clone(), link.to_id.clone()));
            }
        }
    }

    RetrievalPack {
        core,
        peripheral,
        citations,
        conflict_pairs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognos_core::{Author, Claim, ClaimType, DtuStatus, EvidenceTier, Lineage, OriginTag, PipelineMeta, Scores};

    fn dtu(id: &str, tags: Vec<&str>) -> Dtu {
        Dtu {
            id: id.to_string(),
            created_at_ms: 0,
            author: Author {
                id: "c".into(),
                display_name: None,
            },
            title: id.to_string(),
            tags: tags.into_iter().map(String::from).collect(),
            claims: vec![Claim {
                claim_type: ClaimType::Fact,
                text: "x".into(),
                evidence_tier: EvidenceTier::Supported,
                sources: vec!["src-1".into()],
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
    fn empty_store_yields_empty_pack() {
        let store = AtlasStore::new();
        let pack = build_retrieval_pack(&store, TargetIntent::FillGaps);
        assert!(pack.is_empty());
    }

    #[test]
    fn citations_are_deduplicated_across_core() {
        let store = AtlasStore::new();
        store.put(dtu("a", vec!["x"]));
        store.put(dtu("b", vec!["x"]));
        let pack = build_retrieval_pack(&store, TargetIntent::CompressClusters);
        assert_eq!(pack.core.len(), 2);
        assert_eq!(pack.citations, vec!["src-1".to_string()]);
    }
}
