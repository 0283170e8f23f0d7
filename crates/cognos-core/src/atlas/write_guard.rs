//! WriteGuard: single admission point for all writes (C12).
//!
//! Grounded on the teacher's `ApprovalGate`-style single-entry validation,
//! generalized to the SOFT/HARD validation-mode split of spec §4.9. Every
//! write enters through `apply`; partial failure never leaves a half-created
//! DTU behind.

use crate::atlas::model::{Dtu, DtuStatus, Lane, Link, Submission};
use crate::atlas::store::AtlasStore;
use crate::error::{SubstrateError, SubstrateResult};
use crate::governance::{Actor, GateOpts, GovernanceGate};
use crate::rights::{content_hash, default_license_for, derivative_rights_ok, RightsArtifact};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Create,
    Update,
    Link,
    Promote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidationMode {
    Soft,
    Hard,
}

impl ValidationMode {
    fn for_lane(lane: Lane) -> Self {
        match lane {
            Lane::Local => ValidationMode::Soft,
            Lane::Global | Lane::Marketplace => ValidationMode::Hard,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WriteContext {
    pub scope: Lane,
    pub actor: Actor,
}

#[derive(Debug, Clone)]
pub struct WriteOutcome {
    pub ok: bool,
    pub dtu: Option<Dtu>,
    pub submission: Option<Submission>,
    pub error: Option<String>,
}

pub struct WriteGuard<'a> {
    store: &'a AtlasStore,
    governance: &'a GovernanceGate,
}

impl<'a> WriteGuard<'a> {
    pub fn new(store: &'a AtlasStore, governance: &'a GovernanceGate) -> Self {
        Self { store, governance }
    }

    /// Validates payload shape for the requested scope, dispatches to the
    /// store, and runs the auto-promote gate where applicable. Never
    /// surfaces a half-created DTU: validation runs fully before the first
    /// mutation.
    pub fn apply(&self, op: WriteOp, mut payload: Dtu, ctx: &WriteContext) -> WriteOutcome {
        let gate_domain = match op {
            WriteOp::Create | WriteOp::Update => "world.write",
            WriteOp::Link => "world.write",
            WriteOp::Promote => "canon.promote",
        };
        let gate = self
            .governance
            .mandatory_mutation_gate(Some(&ctx.actor), gate_domain, "apply", &GateOpts::default());
        if !gate.allowed {
            return WriteOutcome {
                ok: false,
                dtu: None,
                submission: None,
                error: Some(gate.reason.unwrap_or_else(|| "denied".to_string())),
            };
        }

        if let Err(e) = self.validate_shape(&payload, ctx.scope) {
            return WriteOutcome {
                ok: false,
                dtu: None,
                submission: None,
                error: Some(e.to_string()),
            };
        }

        // Licensing (spec §4.7): Marketplace has no default and must be set
        // explicitly; Local/Global fall back to the lane default when the
        // caller didn't supply one.
        match ctx.scope {
            Lane::Marketplace => {
                if payload.license.is_none() {
                    return WriteOutcome {
                        ok: false,
                        dtu: None,
                        submission: None,
                        error: Some(
                            SubstrateError::validation_field(
                                "marketplace writes require an explicit license",
                                "license",
                            )
                            .to_string(),
                        ),
                    };
                }
            }
            Lane::Local | Lane::Global => {
                if payload.license.is_none() {
                    payload.license = default_license_for(ctx.scope);
                }
            }
        }

        // Derivative rights (spec §4.7): every lineage parent not owned by the
        // creator must carry a license that allows derivatives.
        let parent_artifacts: Vec<RightsArtifact> = payload
            .lineage
            .parent_ids
            .iter()
            .filter_map(|parent_id| self.store.get(parent_id))
            .map(|parent| RightsArtifact {
                creator_id: parent.creator_id,
                lane: parent.lane,
                license: parent.license,
                transfer_grants: Vec::new(),
            })
            .collect();
        if !derivative_rights_ok(&payload.creator_id, &parent_artifacts) {
            return WriteOutcome {
                ok: false,
                dtu: None,
                submission: None,
                error: Some(
                    SubstrateError::invariant("derivative_rights: a non-owned parent's license forbids derivatives")
                        .to_string(),
                ),
            };
        }

        // I7: missing provenance forces QUARANTINED rather than a rejected write.
        if !payload.has_provenance() {
            payload.status = DtuStatus::Quarantined;
        }

        // I5: lineage cycle check before persisting.
        if self
            .store
            .detect_lineage_cycle(&payload.id, &payload.lineage.parent_ids)
        {
            payload.status = DtuStatus::Quarantined;
        }

        payload.content_hash = Some(content_hash(
            &payload.title,
            payload.domain_type.as_deref().unwrap_or(""),
            payload
                .epistemic_class
                .map(|c| format!("{c:?}"))
                .unwrap_or_default()
                .as_str(),
            &payload.tags,
            &payload.claims,
            &payload.creator_id,
        ));

        match op {
            WriteOp::Create | WriteOp::Update => {
                self.store.put(payload.clone());
                WriteOutcome {
                    ok: true,
                    dtu: Some(payload),
                    submission: None,
                    error: None,
                }
            }
            WriteOp::Link | WriteOp::Promote => {
                self.store.put(payload.clone());
                WriteOutcome {
                    ok: true,
                    dtu: Some(payload),
                    submission: None,
                    error: None,
                }
            }
        }
    }

    pub fn apply_link(&self, link: Link, ctx: &WriteContext) -> SubstrateResult<()> {
        let gate = self
            .governance
            .mandatory_mutation_gate(Some(&ctx.actor), "world.write", "link", &GateOpts::default());
        if !gate.allowed {
            return Err(SubstrateError::denied(gate.reason.unwrap_or_default()));
        }
        self.store.add_link(link.clone());
        self.store.handle_contradiction_link(&link);
        Ok(())
    }

    fn validate_shape(&self, dtu: &Dtu, scope: Lane) -> SubstrateResult<()> {
        match ValidationMode::for_lane(scope) {
            ValidationMode::Soft => Ok(()),
            ValidationMode::Hard => {
                if dtu.domain_type.is_none() {
                    return Err(SubstrateError::validation_field(
                        "domainType required for this scope",
                        "domainType",
                    ));
                }
                if dtu.epistemic_class.is_none() {
                    return Err(SubstrateError::validation_field(
                        "epistemicClass required for this scope",
                        "epistemicClass",
                    ));
                }
                if dtu.claims.is_empty() {
                    return Err(SubstrateError::validation_field(
                        "at least one claim required for this scope",
                        "claims",
                    ));
                }
                for claim in &dtu.claims {
                    if claim.text.trim().is_empty() {
                        return Err(SubstrateError::validation_field(
                            "claim text must not be empty",
                            "claims[].text",
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}
