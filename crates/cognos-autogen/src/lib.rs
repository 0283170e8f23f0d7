//! cognos-autogen: the target-selection -> write-policy candidate-DTU
//! generator.
//!
//! Six stages, any of which may abort the run: target selection, retrieval
//! pack, builder, critic, synthesizer, optional LLM shaping, novelty check,
//! write policy. `pipeline::run` drives all of them; the individual stage
//! modules are public so a host can also invoke a single stage directly (e.g.
//! to preview a retrieval pack without building a candidate).

pub mod builder;
pub mod critic;
pub mod error;
pub mod novelty;
pub mod pipeline;
pub mod retrieval;
pub mod shaping;
pub mod synthesizer;
pub mod target_selection;
pub mod write_policy;

pub use builder::{build_candidate, CONFIDENCE_FLOOR};
pub use critic::{run_critic, CriticIssue, CriticReport, CriticSeverity};
pub use error::{AutogenError, AutogenResult};
pub use novelty::{check_novelty, NoveltyLedger, NoveltyOutcome, RECENT_HASH_CAPACITY};
pub use pipeline::{run, RunOutcome, RunTrace};
pub use retrieval::{build_retrieval_pack, RetrievalPack, CORE_MAX, CORE_MIN};
pub use shaping::{apply_downgrade_cap, shape, DOWNGRADED_CONFIDENCE_CAP};
pub use synthesizer::{synthesize, DEDUPE_THRESHOLD};
pub use target_selection::{select_target, TargetIntent, TargetSelection, VariantTag};
pub use write_policy::{decide_write_policy, WritePolicy};
