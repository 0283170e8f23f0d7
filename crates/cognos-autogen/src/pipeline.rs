//! Orchestrates the six autogen stages end to end, any stage
//! free to abort the run.
//!
//! The run-and-collect-a-trace shape calls each stage in turn and folds the
//! results into one verdict rather than early-returning out of the function.

use cognos_core::{AtlasStore, Dtu, IdClock, LLMClient};

use crate::builder::build_candidate;
use crate::critic::{run_critic, CriticReport};
use crate::error::AutogenResult;
use crate::novelty::{check_novelty, NoveltyLedger, NoveltyOutcome};
use crate::retrieval::{build_retrieval_pack, RetrievalPack};
use crate::shaping::{apply_downgrade_cap, shape};
use crate::synthesizer::synthesize;
use crate::target_selection::{select_target, TargetSelection, VariantTag};
use crate::write_policy::{decide_write_policy, WritePolicy};

/// Final disposition of a pipeline run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Lattice had nothing to select a target from.
    EmptyLattice,
    /// Retrieval pack came back with no core DTUs; builder aborted.
    EmptyRetrievalPack,
    /// Hash collided with a recently-generated candidate.
    RejectedDuplicateGeneration,
    /// Similar enough to a stored DTU to redirect as a patch proposal.
    PatchProposal { against_dtu_id: String, similarity: f64, candidate: Dtu },
    /// Ready for admission at the given write policy.
    Candidate { candidate: Dtu, policy: WritePolicy },
}

/// Full trace of one pipeline run, useful for replay/diffing and for tests
/// asserting on intermediate stage output without re-deriving it.
#[derive(Debug, Clone)]
pub struct RunTrace {
    pub target: TargetSelection,
    pub pack: Option<RetrievalPack>,
    pub critic: Option<CriticReport>,
    pub outcome: RunOutcome,
}

/// Runs stages 0-4 synchronously (target selection through synthesis). LLM
/// shaping (stage 5, async) is applied separately by `run` since it requires
/// an optional collaborator and an async runtime.
fn run_sync_stages(
    store: &AtlasStore,
    id_clock: &IdClock,
    creator_id: &str,
    now_ms: i64,
    variant: Option<VariantTag>,
) -> RunTrace {
    let target = select_target(store, variant);
    if target.reason == "empty_lattice" {
        return RunTrace {
            target,
            pack: None,
            critic: None,
            outcome: RunOutcome::EmptyLattice,
        };
    }

    let pack = build_retrieval_pack(store, target.intent);
    if pack.is_empty() {
        return RunTrace {
            target,
            pack: Some(pack),
            critic: None,
            outcome: RunOutcome::EmptyRetrievalPack,
        };
    }

    let candidate_id = IdClock::mint_id();
    let candidate = match build_candidate(&pack, target.intent, candidate_id, creator_id, now_ms) {
        Ok(candidate) => candidate,
        Err(_) => {
            return RunTrace {
                target,
                pack: Some(pack),
                critic: None,
                outcome: RunOutcome::EmptyRetrievalPack,
            }
        }
    };

    let critic = run_critic(&candidate, &pack);
    let candidate = synthesize(candidate, &critic);
    let _ = id_clock.next_seq();

    RunTrace {
        target,
        pack: Some(pack),
        critic: Some(critic),
        outcome: RunOutcome::Candidate {
            candidate,
            policy: WritePolicy::Shadow, // placeholder, replaced after novelty in `run`
        },
    }
}

/// Runs the full six-stage pipeline, including the optional
/// async LLM-shaping stage. Any abort point (empty lattice, empty pack,
/// duplicate generation) short-circuits with the matching `RunOutcome`
/// without ever calling into `WriteGuard` — write admission is the caller's
/// job once a `Candidate` or `PatchProposal` outcome comes back.
pub async fn run(
    store: &AtlasStore,
    ledger: &NoveltyLedger,
    id_clock: &IdClock,
    creator_id: &str,
    now_ms: i64,
    variant: Option<VariantTag>,
    llm: Option<&dyn LLMClient>,
) -> AutogenResult<RunTrace> {
    let mut trace = run_sync_stages(store, id_clock, creator_id, now_ms, variant);

    let (candidate, critic) = match (trace.outcome, trace.critic.take()) {
        (RunOutcome::Candidate { candidate, .. }, Some(critic)) => (candidate, critic),
        (other, critic) => {
            return Ok(RunTrace {
                target: trace.target,
                pack: trace.pack,
                critic,
                outcome: other,
            });
        }
    };

    let shaped = shape(candidate, llm).await;
    let shaped = apply_downgrade_cap(shaped);

    let outcome = match check_novelty(ledger, store, &shaped) {
        NoveltyOutcome::RejectedDuplicateGeneration => RunOutcome::RejectedDuplicateGeneration,
        NoveltyOutcome::PatchProposal { against_dtu_id, similarity } => RunOutcome::PatchProposal {
            against_dtu_id,
            similarity,
            candidate: shaped,
        },
        NoveltyOutcome::Novel => {
            let policy = decide_write_policy(trace.target.intent, &critic);
            RunOutcome::Candidate { candidate: shaped, policy }
        }
    };

    Ok(RunTrace {
        target: trace.target,
        pack: trace.pack,
        critic: Some(critic),
        outcome,
    })
}
