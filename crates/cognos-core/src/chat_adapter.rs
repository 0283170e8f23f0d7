//! Read-only retrieval adapter that never creates DTUs (C18).
//!
//! Grounded on the teacher's `ModuleRegistry::get`/read-only accessor pattern
//! (`knowledge/traits.rs`), reused here to enforce that the chat surface can
//! only read, never mutate.

use serde::{Deserialize, Serialize};

use crate::atlas::{self, AtlasStore, Dtu, DtuStatus, Lane, RetrieveMode};
use crate::governance::Actor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceScope {
    Local,
    Global,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatContextItem {
    pub dtu_id: String,
    pub title: String,
    pub source_scope: SourceScope,
    pub scope_label: String,
    /// Only global items include a confidence badge.
    pub confidence_badge: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMeta {
    pub mode: String,
    pub validation_level: String,
    pub contradiction_gate: String,
}

impl Default for ChatMeta {
    fn default() -> Self {
        Self {
            mode: "chat".to_string(),
            validation_level: "OFF".to_string(),
            contradiction_gate: "OFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRetrieveResult {
    pub ok: bool,
    pub context: Vec<ChatContextItem>,
    pub meta: ChatMeta,
}

#[derive(Debug, Clone, Default)]
pub struct ChatRetrieveOpts {
    pub limit: Option<usize>,
}

/// Read-only retrieval: never mutates state, never creates a DTU, never
/// opens a submission.
pub fn chat_retrieve(store: &AtlasStore, query: &str, opts: &ChatRetrieveOpts) -> ChatRetrieveResult {
    let result = atlas::retrieve(store, RetrieveMode::LocalThenGlobal, query, opts.limit);
    let context = result
        .results
        .into_iter()
        .map(|dtu| {
            let source_scope = match dtu.lane {
                Lane::Local => SourceScope::Local,
                _ => SourceScope::Global,
            };
            let confidence_badge = matches!(source_scope, SourceScope::Global)
                .then_some(dtu.scores.confidence_overall);
            ChatContextItem {
                dtu_id: dtu.id,
                title: dtu.title,
                source_scope,
                scope_label: match source_scope {
                    SourceScope::Local => "Local (private)".to_string(),
                    SourceScope::Global => "Global (shared)".to_string(),
                },
                confidence_badge,
            }
        })
        .collect();

    ChatRetrieveResult {
        ok: true,
        context,
        meta: ChatMeta::default(),
    }
}

/// Explicit escalation: creates a Local DTU. Caller must invoke this
/// separately from `chat_retrieve` — it is never triggered implicitly.
pub fn save_as_dtu(title: String, creator_id: String, now_ms: i64) -> Dtu {
    Dtu::new_draft(crate::id_clock::IdClock::mint_id(), title, creator_id, Lane::Local, now_ms)
}

/// Explicit escalation: creates a PENDING Global submission from an existing
/// Local DTU. Caller must invoke this separately; chat retrieval itself has
/// no side effects.
pub fn publish_to_global(
    store: &AtlasStore,
    dtu_id: &str,
    actor: &Actor,
    now_ms: i64,
) -> Result<atlas::Submission, &'static str> {
    let Some(dtu) = store.get(dtu_id) else {
        return Err("dtu_not_found");
    };
    if dtu.lane != Lane::Local {
        return Err("not_a_local_dtu");
    }
    let payload = atlas::SubmissionPayload {
        title: dtu.title.clone(),
        tags: dtu.tags.clone(),
        claims: dtu.claims.clone(),
        domain_type: dtu.domain_type.clone(),
        epistemic_class: dtu.epistemic_class,
    };
    atlas::ScopeRouter::create_submission(
        crate::id_clock::IdClock::mint_id(),
        dtu_id,
        Lane::Local,
        Lane::Global,
        payload,
        &dtu.creator_id,
        actor,
        now_ms,
    )
    .map_err(|_| "submission_failed")
}
