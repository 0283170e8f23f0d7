//! Three-layer epistemic classification, decay, and hard-kernel contradiction (C8, part 1).
//!
//! No direct teacher analog — the teacher has no layered epistemic-confidence
//! model — so this is built in the teacher's doc-comment-table style (see how
//! `knowledge/store.rs` documents its slot table) straight from spec §4.6.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpistemicLayer {
    HardKernel,
    SoftBelief,
    Speculative,
}

/// Per-layer constants. Frozen: never mutated at runtime.
#[derive(Debug, Clone, Copy)]
pub struct LayerProfile {
    pub decay_per_min: f64,
    pub tolerance: f64,
    pub promotion_threshold: f64,
}

impl EpistemicLayer {
    pub fn profile(self) -> LayerProfile {
        match self {
            EpistemicLayer::HardKernel => LayerProfile {
                decay_per_min: 0.0,
                tolerance: 0.0,
                promotion_threshold: 0.95,
            },
            EpistemicLayer::SoftBelief => LayerProfile {
                decay_per_min: 0.01,
                tolerance: 0.3,
                promotion_threshold: 0.6,
            },
            EpistemicLayer::Speculative => LayerProfile {
                decay_per_min: 0.05,
                tolerance: 0.8,
                promotion_threshold: 0.3,
            },
        }
    }
}

const HARD_MARKERS: &[&str] = &["axiom", "theorem", "law", "="];
const SPECULATIVE_MARKERS: &[&str] = &["hypothesis", "perhaps", "might", "maybe", "speculat"];

/// Classifies a claim into one of the three layers using textual markers,
/// tags, and a confidence floor.
pub fn classify(text: &str, tags: &[String], confidence: f64) -> EpistemicLayer {
    let lowered = text.to_lowercase();
    let has_hard_marker = HARD_MARKERS.iter().any(|m| lowered.contains(m))
        || tags.iter().any(|t| t.eq_ignore_ascii_case("hard_kernel"));
    let has_speculative_marker = SPECULATIVE_MARKERS.iter().any(|m| lowered.contains(m))
        || tags.iter().any(|t| t.eq_ignore_ascii_case("speculative"));

    if has_hard_marker && confidence >= EpistemicLayer::HardKernel.profile().promotion_threshold {
        EpistemicLayer::HardKernel
    } else if has_speculative_marker {
        EpistemicLayer::Speculative
    } else {
        EpistemicLayer::SoftBelief
    }
}

/// Exponential decay: `confidence * e^(-rate * dtMinutes)`.
pub fn decay(confidence: f64, layer: EpistemicLayer, dt_minutes: f64) -> f64 {
    let rate = layer.profile().decay_per_min;
    confidence * (-rate * dt_minutes).exp()
}

fn words_over_len(text: &str, min_len: usize) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > min_len)
        .map(|w| w.to_string())
        .collect()
}

/// Dice coefficient over shared words longer than 3 characters.
pub fn subject_overlap(a: &str, b: &str) -> f64 {
    let wa = words_over_len(a, 3);
    let wb = words_over_len(b, 3);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let shared = wa.intersection(&wb).count() as f64;
    2.0 * shared / (wa.len() as f64 + wb.len() as f64)
}

const NEGATION_MARKERS: &[&str] = &["not", "false", "no longer", "isn't", "doesn't", "never"];

fn has_negation(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NEGATION_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Two claims contradict when exactly one asserts negation AND subject overlap
/// (Dice over words > 3 chars) is >= 0.3.
pub fn contradicts(text_a: &str, text_b: &str) -> bool {
    let negation_delta = has_negation(text_a) != has_negation(text_b);
    negation_delta && subject_overlap(text_a, text_b) >= 0.3
}

/// Hard-kernel items tolerate zero contradictions: any `contradicts` against an
/// existing hard-kernel claim blocks promotion.
pub fn blocks_hard_kernel_promotion(candidate_text: &str, existing_hard_kernel_texts: &[String]) -> bool {
    existing_hard_kernel_texts
        .iter()
        .any(|existing| contradicts(candidate_text, existing))
}
