//! Atlas knowledge store (C10, C11, C12): DTU model, entity store, scope
//! routing, and the single write-admission point.

pub mod model;
pub mod router;
pub mod store;
pub mod write_guard;

pub use model::{
    Author, Claim, ClaimType, ContradictionType, Dtu, DtuStatus, DomainTypeClass, EvidenceTier, Lane, Lineage,
    Link, LinkType, OriginTag, PipelineMeta, Provenance, Scores, SealedPayloadMutationError, Severity,
    Submission, SubmissionPayload, SubmissionStatus,
};
pub use router::ScopeRouter;
pub use store::AtlasStore;
pub use write_guard::{WriteContext, WriteGuard, WriteOp, WriteOutcome};

/// Query surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveMode {
    Local,
    Global,
    LocalThenGlobal,
    Marketplace,
}

#[derive(Debug, Clone)]
pub struct RetrieveResult {
    pub ok: bool,
    pub results: Vec<Dtu>,
    pub total: usize,
}

/// `Atlas.retrieve`: results scored and ordered by `confidence_overall` desc
/// then recency. Survives an empty store without accessing any
/// optional field.
pub fn retrieve(store: &AtlasStore, mode: RetrieveMode, query: &str, limit: Option<usize>) -> RetrieveResult {
    let mut results = match mode {
        RetrieveMode::Local => store.all_in_lane(Lane::Local),
        RetrieveMode::Global => store.all_in_lane(Lane::Global),
        RetrieveMode::Marketplace => store.all_in_lane(Lane::Marketplace),
        RetrieveMode::LocalThenGlobal => {
            let mut local = store.all_in_lane(Lane::Local);
            local.extend(store.all_in_lane(Lane::Global));
            local
        }
    };

    if !query.is_empty() {
        let needle = query.to_lowercase();
        results.retain(|d| {
            d.title.to_lowercase().contains(&needle)
                || d.tags.iter().any(|t| t.to_lowercase().contains(&needle))
                || d.claims.iter().any(|c| c.text.to_lowercase().contains(&needle))
        });
    }

    results.sort_by(|a, b| {
        b.scores
            .confidence_overall
            .partial_cmp(&a.scores.confidence_overall)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.created_at_ms.cmp(&a.created_at_ms))
    });

    let total = results.len();
    if let Some(limit) = limit {
        results.truncate(limit);
    }

    RetrieveResult {
        ok: true,
        results,
        total,
    }
}
