//! Federation artifact export/import, sandbox-until-trusted gating (C15,
//! spec §4 "Federation" / §6 "Federation envelope").
//!
//! Grounded on the teacher's `federation::{MasterState, SatelliteInfo}`
//! provenance/dispute bookkeeping shape (`pagi-federation/src/federation.rs`),
//! stripped of the gRPC transport it's wrapped in there — wire-level
//! federation transport is out of scope here alongside HTTP routing
//!. `MasterState`'s `DashMap<String, SatelliteInfo>` registry
//! pattern carries over directly as `FederationRegistry`'s import ledger.

use std::sync::Arc;

use cognos_core::{Actor, ActorRole, Dtu, Provenance};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::{FederationError, FederationResult};

pub const ENVELOPE_VERSION: &str = "loaf-federation-v1";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvelopeLicense {
    pub license_type: String,
    pub royalty_pct: f64,
    pub attribution: bool,
    pub terms: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub dtu_id: String,
    pub content_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeRecord {
    pub dispute_id: String,
    pub opened_at_ms: i64,
    pub resolved_at_ms: Option<i64>,
    pub summary: String,
}

impl DisputeRecord {
    pub fn open(summary: String, opened_at_ms: i64) -> Self {
        Self {
            dispute_id: uuid::Uuid::new_v4().to_string(),
            opened_at_ms,
            resolved_at_ms: None,
            summary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reputation {
    pub creator_id: String,
    pub score: f64,
    pub sample_size: u64,
}

/// Federation export envelope: `{version, exportedAt, artifact,
/// provenance, evidence, disputeHistory, license, reputation}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FederationEnvelope {
    pub version: String,
    pub exported_at_ms: i64,
    pub artifact: Dtu,
    pub provenance: Provenance,
    pub evidence: Vec<EvidenceRef>,
    pub dispute_history: Vec<DisputeRecord>,
    pub license: EnvelopeLicense,
    pub reputation: Option<Reputation>,
}

/// Builds an export envelope for an artifact. An artifact missing provenance
/// cannot be exported — the same I7 discipline that forces a provenance-less
/// DTU to QUARANTINED locally applies at the federation boundary.
#[instrument(skip(artifact, evidence, dispute_history, license, reputation))]
pub fn export_artifact(
    artifact: &Dtu,
    evidence: Vec<EvidenceRef>,
    dispute_history: Vec<DisputeRecord>,
    license: EnvelopeLicense,
    reputation: Option<Reputation>,
    now_ms: i64,
) -> FederationResult<FederationEnvelope> {
    let provenance = artifact.provenance.clone().ok_or(FederationError::MissingProvenance)?;
    info!(artifact_id = %artifact.id, "exporting federation envelope");
    Ok(FederationEnvelope {
        version: ENVELOPE_VERSION.to_string(),
        exported_at_ms: now_ms,
        artifact: artifact.clone(),
        provenance,
        evidence,
        dispute_history,
        license,
        reputation,
    })
}

/// Recomputes the artifact's content hash and compares it against the
/// envelope's recorded hash (same discipline as
/// `cognos_core::rights::verify_origin_integrity`), plus a version check.
/// This is the minimum structural check every import runs before sandboxing
/// — it rejects a malformed bundle outright rather than sandboxing it.
pub fn default_verifier(envelope: &FederationEnvelope) -> FederationResult<()> {
    if envelope.version != ENVELOPE_VERSION {
        return Err(FederationError::UnsupportedVersion {
            found: envelope.version.clone(),
            expected: ENVELOPE_VERSION,
        });
    }
    if let Some(recorded_hash) = &envelope.artifact.content_hash {
        let epistemic_class = envelope
            .artifact
            .epistemic_class
            .map(|c| format!("{c:?}"))
            .unwrap_or_default();
        let recomputed = cognos_core::content_hash(
            &envelope.artifact.title,
            envelope.artifact.domain_type.as_deref().unwrap_or(""),
            &epistemic_class,
            &envelope.artifact.tags,
            &envelope.artifact.claims,
            &envelope.artifact.creator_id,
        );
        if recorded_hash != &recomputed {
            return Err(FederationError::VerificationFailed(
                "artifact content_hash does not match recomputed hash".to_string(),
            ));
        }
    }
    Ok(())
}

pub type Verifier = fn(&FederationEnvelope) -> FederationResult<()>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustState {
    Sandboxed,
    Trusted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportedArtifact {
    pub envelope: FederationEnvelope,
    pub state: TrustState,
    pub imported_at_ms: i64,
}

/// Registered roles that may promote a sandboxed import to trusted.
fn may_promote(role: &ActorRole) -> bool {
    matches!(role, ActorRole::Owner | ActorRole::Founder | ActorRole::Admin | ActorRole::Council)
}

/// Per-process federation import ledger, grounded on the teacher's
/// `MasterState` (`DashMap<String, SatelliteInfo>`): no global lock,
/// independent entries per artifact id.
#[derive(Default)]
pub struct FederationRegistry {
    imports: DashMap<String, ImportedArtifact>,
}

impl FederationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Verifies and imports an envelope. Even a verifier-pass import lands
    /// `sandboxed` — verification only screens out structurally
    /// broken bundles, it never itself grants trust.
    #[instrument(skip(self, envelope, verifier))]
    pub fn import(
        &self,
        envelope: FederationEnvelope,
        verifier: Verifier,
        now_ms: i64,
    ) -> FederationResult<ImportedArtifact> {
        verifier(&envelope)?;
        let artifact_id = envelope.artifact.id.clone();
        let imported = ImportedArtifact {
            envelope,
            state: TrustState::Sandboxed,
            imported_at_ms: now_ms,
        };
        self.imports.insert(artifact_id.clone(), imported.clone());
        info!(artifact_id = %artifact_id, "imported federation envelope, sandboxed");
        Ok(imported)
    }

    pub fn get(&self, artifact_id: &str) -> Option<ImportedArtifact> {
        self.imports.get(artifact_id).map(|entry| entry.value().clone())
    }

    pub fn list_sandboxed(&self) -> Vec<ImportedArtifact> {
        self.imports
            .iter()
            .filter(|entry| entry.value().state == TrustState::Sandboxed)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Promotes a sandboxed import to trusted. Fail-closed: a non-privileged
    /// actor is denied, matching the gate's default-deny discipline
    ///.
    #[instrument(skip(self, actor))]
    pub fn promote_to_trusted(&self, artifact_id: &str, actor: &Actor) -> FederationResult<ImportedArtifact> {
        if !may_promote(&actor.role) {
            warn!(artifact_id = %artifact_id, role = ?actor.role, "promotion denied");
            return Err(FederationError::PromotionDenied {
                role: format!("{:?}", actor.role),
            });
        }
        let mut entry = self
            .imports
            .get_mut(artifact_id)
            .ok_or_else(|| FederationError::UnknownImport {
                artifact_id: artifact_id.to_string(),
            })?;
        entry.state = TrustState::Trusted;
        info!(artifact_id = %artifact_id, actor_id = %actor.id, "import promoted to trusted");
        Ok(entry.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cognos_core::{Author, DomainTypeClass, DtuStatus, Lane, Lineage, OriginTag, PipelineMeta, Scores};

    fn artifact_with_provenance() -> Dtu {
        let claims = vec![];
        let epistemic_class = Some(DomainTypeClass::Empirical);
        let tags = vec!["physics".to_string()];
        let content_hash = cognos_core::content_hash("gravity", "physics", "Empirical", &tags, &claims, "alice");
        Dtu {
            id: "artifact-1".into(),
            created_at_ms: 0,
            author: Author {
                id: "alice".into(),
                display_name: None,
            },
            title: "gravity".into(),
            tags,
            claims,
            domain_type: Some("physics".into()),
            epistemic_class,
            lineage: Lineage {
                parent_ids: vec![],
                generation_depth: 0,
                origin: OriginTag::Human,
            },
            scores: Scores::default(),
            status: DtuStatus::Verified,
            lane: Lane::Global,
            content_hash: Some(content_hash),
            license: None,
            creator_id: "alice".into(),
            origin_fingerprint: None,
            meta: PipelineMeta::default(),
            provenance: Some(Provenance {
                source_type: "human".into(),
                source_id: "alice".into(),
                confidence: 0.9,
                created_at_ms: 0,
            }),
        }
    }

    fn license() -> EnvelopeLicense {
        EnvelopeLicense {
            license_type: "ATTRIBUTION_OPEN".into(),
            royalty_pct: 0.0,
            attribution: true,
            terms: "cite on reuse".into(),
        }
    }

    #[test]
    fn export_requires_provenance() {
        let mut artifact = artifact_with_provenance();
        artifact.provenance = None;
        let result = export_artifact(&artifact, vec![], vec![], license(), None, 0);
        assert!(matches!(result, Err(FederationError::MissingProvenance)));
    }

    #[test]
    fn exported_envelope_verifies_and_imports_sandboxed() {
        let artifact = artifact_with_provenance();
        let envelope = export_artifact(&artifact, vec![], vec![], license(), None, 100).unwrap();
        let registry = FederationRegistry::new();
        let imported = registry.import(envelope, default_verifier, 200).unwrap();
        assert_eq!(imported.state, TrustState::Sandboxed);
        assert_eq!(registry.list_sandboxed().len(), 1);
    }

    #[test]
    fn tampered_content_hash_fails_verification() {
        let artifact = artifact_with_provenance();
        let mut envelope = export_artifact(&artifact, vec![], vec![], license(), None, 100).unwrap();
        envelope.artifact.content_hash = Some("0".repeat(64));
        let registry = FederationRegistry::new();
        let result = registry.import(envelope, default_verifier, 200);
        assert!(matches!(result, Err(FederationError::VerificationFailed(_))));
    }

    #[test]
    fn non_privileged_actor_cannot_promote() {
        let artifact = artifact_with_provenance();
        let envelope = export_artifact(&artifact, vec![], vec![], license(), None, 100).unwrap();
        let registry = FederationRegistry::new();
        registry.import(envelope, default_verifier, 200).unwrap();
        let member = Actor {
            id: "bob".into(),
            role: ActorRole::Member,
            verified: true,
            scopes: vec!["*".into()],
        };
        let result = registry.promote_to_trusted("artifact-1", &member);
        assert!(matches!(result, Err(FederationError::PromotionDenied { .. })));
    }

    #[test]
    fn council_actor_promotes_to_trusted() {
        let artifact = artifact_with_provenance();
        let envelope = export_artifact(&artifact, vec![], vec![], license(), None, 100).unwrap();
        let registry = FederationRegistry::new();
        registry.import(envelope, default_verifier, 200).unwrap();
        let council = Actor {
            id: "council-1".into(),
            role: ActorRole::Council,
            verified: true,
            scopes: vec!["*".into()],
        };
        let promoted = registry.promote_to_trusted("artifact-1", &council).unwrap();
        assert_eq!(promoted.state, TrustState::Trusted);
        assert!(registry.list_sandboxed().is_empty());
    }
}
