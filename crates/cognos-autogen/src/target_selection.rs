//! Stage 0: target selection.
//!
//! New scoring logic (the teacher has no autogen analog); the
//! named-check-plus-score-plus-reason result shape follows the teacher's
//! `red_team::SecurityFinding` (a structured verdict, never a bare bool).

use std::collections::HashMap;

use cognos_core::{AtlasStore, Lane, LinkType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetIntent {
    FillGaps,
    ResolveConflicts,
    CompressClusters,
    ExtractPatterns,
    ElevateHighUsage,
}

impl TargetIntent {
    pub fn as_str(self) -> &'static str {
        match self {
            TargetIntent::FillGaps => "fill_gaps",
            TargetIntent::ResolveConflicts => "resolve_conflicts",
            TargetIntent::CompressClusters => "compress_clusters",
            TargetIntent::ExtractPatterns => "extract_patterns",
            TargetIntent::ElevateHighUsage => "elevate_high_usage",
        }
    }
}

/// Biases a fixed subset of intents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTag {
    Dream,
    Synth,
    Evolution,
}

impl VariantTag {
    fn preferred_intents(self) -> &'static [TargetIntent] {
        match self {
            VariantTag::Dream => &[TargetIntent::ExtractPatterns, TargetIntent::CompressClusters],
            VariantTag::Synth => &[TargetIntent::FillGaps, TargetIntent::ElevateHighUsage],
            VariantTag::Evolution => &[TargetIntent::ResolveConflicts, TargetIntent::ElevateHighUsage],
        }
    }
}

const VARIANT_BIAS: f64 = 30.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSelection {
    pub intent: TargetIntent,
    pub score: f64,
    pub reason: String,
    pub scores_by_intent: HashMap<String, f64>,
}

/// Computes the four raw signals the five intents score against.
struct Signals {
    gap_density: f64,
    largest_tag_cluster: f64,
    conflict_pair_count: f64,
    max_lineage_fan_in: f64,
    repeated_tag_pair_count: f64,
}

fn compute_signals(store: &AtlasStore) -> Signals {
    let all = store.all();
    let total = all.len().max(1) as f64;

    let gaps = all
        .iter()
        .filter(|d| d.domain_type.is_none() || d.epistemic_class.is_none() || d.claims.is_empty())
        .count() as f64;

    let mut tag_counts: HashMap<String, usize> = HashMap::new();
    let mut tag_pair_counts: HashMap<(String, String), usize> = HashMap::new();
    for dtu in &all {
        let mut tags = dtu.tags.clone();
        tags.sort();
        tags.dedup();
        for tag in &tags {
            *tag_counts.entry(tag.clone()).or_insert(0) += 1;
        }
        for i in 0..tags.len() {
            for j in (i + 1)..tags.len() {
                *tag_pair_counts.entry((tags[i].clone(), tags[j].clone())).or_insert(0) += 1;
            }
        }
    }
    let largest_tag_cluster = tag_counts.values().copied().max().unwrap_or(0) as f64;
    let repeated_tag_pair_count = tag_pair_counts.values().filter(|c| **c > 1).count() as f64;

    let mut conflict_pairs: usize = 0;
    let mut fan_in: HashMap<String, usize> = HashMap::new();
    for dtu in &all {
        for link in store.links_from(&dtu.id) {
            if link.link_type == LinkType::Contradicts {
                conflict_pairs += 1;
            }
            *fan_in.entry(link.to_id.clone()).or_insert(0) += 1;
        }
    }
    let max_lineage_fan_in = fan_in.values().copied().max().unwrap_or(0) as f64;

    Signals {
        gap_density: gaps / total,
        largest_tag_cluster,
        conflict_pair_count: conflict_pairs as f64,
        max_lineage_fan_in,
        repeated_tag_pair_count,
    }
}

/// Scores the 5 candidate intents and picks the winner. An empty lattice
/// (across all three lanes) short-circuits to `fill_gaps / score 0 /
/// reason empty_lattice` exactly as spec'd, without computing signals.
pub fn select_target(store: &AtlasStore, variant: Option<VariantTag>) -> TargetSelection {
    if store.all_in_lane(Lane::Local).is_empty()
        && store.all_in_lane(Lane::Global).is_empty()
        && store.all_in_lane(Lane::Marketplace).is_empty()
    {
        let mut scores_by_intent = HashMap::new();
        scores_by_intent.insert(TargetIntent::FillGaps.as_str().to_string(), 0.0);
        return TargetSelection {
            intent: TargetIntent::FillGaps,
            score: 0.0,
            reason: "empty_lattice".to_string(),
            scores_by_intent,
        };
    }

    let signals = compute_signals(store);
    let mut scores: HashMap<TargetIntent, f64> = HashMap::new();
    scores.insert(TargetIntent::FillGaps, signals.gap_density * 100.0);
    scores.insert(TargetIntent::ResolveConflicts, signals.conflict_pair_count * 10.0);
    scores.insert(TargetIntent::CompressClusters, signals.largest_tag_cluster * 5.0);
    scores.insert(TargetIntent::ExtractPatterns, signals.repeated_tag_pair_count * 5.0);
    scores.insert(TargetIntent::ElevateHighUsage, signals.max_lineage_fan_in * 8.0);

    if let Some(variant) = variant {
        for intent in variant.preferred_intents() {
            *scores.entry(*intent).or_insert(0.0) += VARIANT_BIAS;
        }
    }

    let (&winner, &winning_score) = scores
        .iter()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
        .expect("scores map always has all 5 intents");

    let reason = match winner {
        TargetIntent::FillGaps => format!("gap_density={:.3}", signals.gap_density),
        TargetIntent::ResolveConflicts => format!("conflict_pairs={}", signals.conflict_pair_count as u64),
        TargetIntent::CompressClusters => format!("largest_tag_cluster={}", signals.largest_tag_cluster as u64),
        TargetIntent::ExtractPatterns => format!("repeated_tag_pairs={}", signals.repeated_tag_pair_count as u64),
        TargetIntent::ElevateHighUsage => format!("max_lineage_fan_in={}", signals.max_lineage_fan_in as u64),
    };

    TargetSelection {
        intent: winner,
        score: winning_score,
        reason,
        scores_by_intent: scores.into_iter().map(|(k, v)| (k.as_str().to_string(), v)).collect(),
    }
}
