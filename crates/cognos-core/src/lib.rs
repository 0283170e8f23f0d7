//! cognos-core: governed cognition substrate core.
//!
//! Atlas knowledge store, epistemic/reality kernels, governance gate,
//! scheduler, event bus, rate budget, replay engine, heartbeat maintenance,
//! time/causality ledger, stability monitor, and the read-only chat adapter.

pub mod atlas;
pub mod bus;
pub mod budget;
pub mod chat_adapter;
pub mod collaborators;
pub mod config;
pub mod epistemic;
pub mod error;
pub mod governance;
pub mod heartbeat;
pub mod id_clock;
pub mod reality;
pub mod replay;
pub mod rights;
pub mod scheduler;
pub mod sharded_store;
pub mod stability;
pub mod time_causality;

pub use atlas::{
    retrieve, AtlasStore, Author, Claim, ClaimType, ContradictionType, Dtu, DtuStatus, DomainTypeClass,
    EvidenceTier, Lane, Lineage, Link, LinkType, OriginTag, PipelineMeta, Provenance, RetrieveMode, RetrieveResult,
    Scores, ScopeRouter, SealedPayloadMutationError, Severity, Submission, SubmissionPayload, SubmissionStatus,
    WriteContext, WriteGuard, WriteOp, WriteOutcome,
};
pub use bus::{CognitionBus, Event, EventMeta, EventQuery, KNOWN_EVENT_TYPES};
pub use budget::{BudgetEntry, ConsumeOutcome, RateBudget};
pub use chat_adapter::{
    chat_retrieve, publish_to_global, save_as_dtu, ChatContextItem, ChatMeta, ChatRetrieveOpts, ChatRetrieveResult,
    SourceScope,
};
pub use collaborators::{
    collaborator_status, CollaboratorError, CollaboratorResult, CollaboratorStatus, EmbeddingService, LLMClient,
    PersistenceStore,
};
pub use config::SubstrateConfig;
pub use epistemic::{EpistemicLayer, LayerProfile};
pub use error::{SubstrateError, SubstrateResult};
pub use governance::{
    Actor, ActorRole, Amendment, AmendmentKind, ConstitutionRule, GateOpts, GateResult, GovernanceGate,
    PowerCreepReport, Vote, GATED_DOMAINS,
};
pub use heartbeat::{Heartbeat, TickCounts, TickResult};
pub use id_clock::{DeterministicRng, IdClock};
pub use reality::{Bound, DimensionalOp, RealityCheckResult};
pub use replay::{replay, Decision, ReplayResult};
pub use rights::{
    can_use, content_hash, custom_license, default_license_for, derivative_rights_ok, verify_origin_integrity,
    Action, License, LicenseType, ProofOfOrigin, RightsArtifact,
};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerTask, TaskStatus};
pub use sharded_store::{ShardedSnapshot, ShardedStore};
pub use stability::{
    Constraint, ConstraintSeverity, DriftSignal, DriftType, GeneratedArtifacts, Guardrail, RegressionTest,
    StabilityMonitor, StructuredFailure,
};
pub use time_causality::{CausalEdge, CausalEdgeKind, StateDiff, TimeCausality, TimelineVersion};
