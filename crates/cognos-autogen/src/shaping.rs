//! Stage 5: LLM shaping (optional).
//!
//! Grounded on the teacher's `openrouter_service`-style "optional
//! collaborator, failure is non-fatal" discipline — we don't keep the
//! OpenRouter HTTP client itself (out of scope), only the
//! graceful-degradation shape: absence or failure of the collaborator leaves
//! the candidate untouched and records why in the trace.

use std::collections::HashSet;

use cognos_core::{ClaimType, Dtu, EvidenceTier, LLMClient};
use serde::Deserialize;

/// A claim whose entire support was stripped as invalid is downgraded to
/// `hypothesis` and capped at this confidence.
pub const DOWNGRADED_CONFIDENCE_CAP: f64 = 0.4;

#[derive(Debug, Deserialize)]
struct ShapedClaim {
    text: String,
    support: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ShapedPayload {
    claims: Vec<ShapedClaim>,
}

fn build_prompt(candidate: &Dtu, allowed_ids: &HashSet<String>) -> String {
    let mut ids: Vec<&String> = allowed_ids.iter().collect();
    ids.sort();
    format!(
        "Reshape the following claims for clarity. Return JSON of the form \
         {{\"claims\":[{{\"text\":\"...\",\"support\":[\"id\",...]}}]}}. \
         Every support id must be one of: {:?}.\n\nClaims:\n{}",
        ids,
        candidate
            .claims
            .iter()
            .map(|c| format!("- {}", c.text))
            .collect::<Vec<_>>()
            .join("\n")
    )
}

/// Applies LLM-shaped claim text when available and valid. Invalid support
/// ids are stripped; a claim losing all its support is downgraded rather
/// than dropped. Any failure (no collaborator, call error, invalid JSON) is
/// non-fatal: the candidate is returned unmodified with a trace entry.
pub async fn shape(mut candidate: Dtu, llm: Option<&dyn LLMClient>) -> Dtu {
    let Some(llm) = llm else {
        candidate.meta.critic_trace.push("shaping: no LLMClient configured, skipped".to_string());
        return candidate;
    };
    if !llm.is_available() {
        candidate.meta.critic_trace.push("shaping: LLMClient unavailable, skipped".to_string());
        return candidate;
    }

    let allowed_ids: HashSet<String> = candidate
        .claims
        .iter()
        .flat_map(|c| c.sources.iter().cloned())
        .chain(candidate.lineage.parent_ids.iter().cloned())
        .collect();

    let prompt = build_prompt(&candidate, &allowed_ids);
    let response = match llm.generate(&prompt).await {
        Ok(text) => text,
        Err(err) => {
            candidate.meta.critic_trace.push(format!("shaping: LLM call failed, skipped: {err}"));
            return candidate;
        }
    };

    let shaped: ShapedPayload = match serde_json::from_str(&response) {
        Ok(payload) => payload,
        Err(err) => {
            candidate.meta.critic_trace.push(format!("shaping: LLM response was not valid JSON, skipped: {err}"));
            return candidate;
        }
    };

    if shaped.claims.len() != candidate.claims.len() {
        candidate
            .meta
            .critic_trace
            .push("shaping: claim count mismatch, skipped".to_string());
        return candidate;
    }

    for (original, reshaped) in candidate.claims.iter_mut().zip(shaped.claims.into_iter()) {
        let valid_support: Vec<String> = reshaped
            .support
            .into_iter()
            .filter(|id| allowed_ids.contains(id))
            .collect();

        if valid_support.is_empty() && !original.sources.is_empty() {
            original.claim_type = ClaimType::Hypothesis;
            original.evidence_tier = EvidenceTier::Unsourced;
            original.sources = Vec::new();
        } else {
            original.text = reshaped.text;
            original.sources = valid_support;
        }
    }

    candidate.meta.ollama_shaped = true;
    candidate
}

/// Applies the confidence cap for any claim downgraded during shaping. Split
/// out from `shape` since the cap acts on the DTU-level score, not per-claim.
pub fn apply_downgrade_cap(mut candidate: Dtu) -> Dtu {
    let any_downgraded = candidate
        .claims
        .iter()
        .any(|c| c.claim_type == ClaimType::Hypothesis && c.evidence_tier == EvidenceTier::Unsourced);
    if any_downgraded {
        candidate.scores.confidence_overall = candidate.scores.confidence_overall.min(DOWNGRADED_CONFIDENCE_CAP);
    }
    candidate
}
