//! Fail-closed mutation gate and constitution (C7).
//!
//! Grounded on the teacher's pending/authorized/denied `ApprovalGate` vocabulary
//! (`ApprovalStatus`, `ChangeSeverity`) generalized from a single-operator
//! approval queue to the spec's actor/role/scope gate plus a constitution with
//! supermajority amend/revert and a power-creep scan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::instrument;

pub const GATED_DOMAINS: &[&str] = &[
    "experience.write",
    "world.write",
    "transfer.write",
    "canon.promote",
    "economy.distribute",
    "macro.register",
    "scheduler.modify",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Owner,
    Founder,
    Admin,
    Council,
    Member,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
    pub verified: bool,
    /// Scopes: `"*"`, a bare domain, or `"domain.action"`.
    pub scopes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateOpts {
    pub r#override: bool,
    pub internal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateResult {
    pub allowed: bool,
    pub reason: Option<String>,
    pub gated: bool,
}

fn privileged_role(role: &ActorRole) -> bool {
    matches!(
        role,
        ActorRole::Owner | ActorRole::Founder | ActorRole::Admin | ActorRole::Council
    )
}

fn scopes_cover_domain(scopes: &[String], domain: &str) -> bool {
    scopes
        .iter()
        .any(|s| s == "*" || s == domain || s == &format!("{domain}-root"))
}

pub struct GovernanceGate {
    rules: std::sync::RwLock<HashMap<String, ConstitutionRule>>,
    amendments: std::sync::RwLock<Vec<Amendment>>,
}

impl GovernanceGate {
    pub fn new() -> Self {
        Self {
            rules: std::sync::RwLock::new(HashMap::new()),
            amendments: std::sync::RwLock::new(Vec::new()),
        }
    }

    /// Fail-closed check. Non-gated domains short-circuit to
    /// `{allowed:true, gated:false}` without evaluating the actor at all.
    #[instrument(skip(self, actor))]
    pub fn check(&self, actor: Option<&Actor>, domain: &str, _action: &str, opts: &GateOpts) -> GateResult {
        if !GATED_DOMAINS.contains(&domain) {
            return GateResult {
                allowed: true,
                reason: None,
                gated: false,
            };
        }

        let Some(actor) = actor else {
            return GateResult {
                allowed: false,
                reason: Some("no_actor".to_string()),
                gated: true,
            };
        };

        if opts.internal
            && matches!(actor.role, ActorRole::System | ActorRole::Owner | ActorRole::Founder)
        {
            return GateResult {
                allowed: true,
                reason: Some("internal_system_path".to_string()),
                gated: true,
            };
        }

        if !privileged_role(&actor.role) {
            return GateResult {
                allowed: false,
                reason: Some("role_not_privileged".to_string()),
                gated: true,
            };
        }

        if !scopes_cover_domain(&actor.scopes, domain) {
            return GateResult {
                allowed: false,
                reason: Some("scope_not_covered".to_string()),
                gated: true,
            };
        }

        if actor.role == ActorRole::Owner && opts.r#override && actor.verified {
            return GateResult {
                allowed: true,
                reason: Some("owner_override".to_string()),
                gated: true,
            };
        }

        GateResult {
            allowed: true,
            reason: None,
            gated: true,
        }
    }

    /// Alias spec names separately (`mandatoryMutationGate`) for every mutating
    /// call site; behaviourally identical to `check`.
    pub fn mandatory_mutation_gate(
        &self,
        actor: Option<&Actor>,
        domain: &str,
        action: &str,
        opts: &GateOpts,
    ) -> GateResult {
        self.check(actor, domain, action, opts)
    }

    pub fn create_rule(&self, rule: ConstitutionRule) {
        self.rules
            .write()
            .expect("governance lock poisoned")
            .insert(rule.id.clone(), rule);
    }

    pub fn get_rule(&self, id: &str) -> Option<ConstitutionRule> {
        self.rules.read().expect("governance lock poisoned").get(id).cloned()
    }

    /// Supermajority check: total votes >= min_votes AND approve/total >= ratio.
    fn supermajority(votes: &[Vote], min_votes: u32, ratio: f32) -> bool {
        let total = votes.len() as u32;
        if total < min_votes {
            return false;
        }
        let approve = votes.iter().filter(|v| v.approve).count() as f32;
        approve / total as f32 >= ratio
    }

    pub fn amend_rule(
        &self,
        rule_id: &str,
        new_text: String,
        votes: Vec<Vote>,
        min_votes: u32,
        ratio: f32,
        now_ms: i64,
    ) -> Result<ConstitutionRule, &'static str> {
        if !Self::supermajority(&votes, min_votes, ratio) {
            return Err("supermajority_not_reached");
        }
        let mut rules = self.rules.write().expect("governance lock poisoned");
        let Some(rule) = rules.get_mut(rule_id) else {
            return Err("rule_not_found");
        };
        rule.text = new_text;
        rule.version += 1;
        rule.votes = votes.clone();
        self.amendments
            .write()
            .expect("governance lock poisoned")
            .push(Amendment {
                rule_id: rule_id.to_string(),
                kind: AmendmentKind::Amend,
                ts_ms: now_ms,
                votes,
            });
        Ok(rule.clone())
    }

    pub fn revert_rule(
        &self,
        rule_id: &str,
        votes: Vec<Vote>,
        min_votes: u32,
        ratio: f32,
        now_ms: i64,
    ) -> Result<ConstitutionRule, &'static str> {
        if !Self::supermajority(&votes, min_votes, ratio) {
            return Err("supermajority_not_reached");
        }
        let mut rules = self.rules.write().expect("governance lock poisoned");
        let Some(rule) = rules.get_mut(rule_id) else {
            return Err("rule_not_found");
        };
        rule.active = false;
        self.amendments
            .write()
            .expect("governance lock poisoned")
            .push(Amendment {
                rule_id: rule_id.to_string(),
                kind: AmendmentKind::Revert,
                ts_ms: now_ms,
                votes,
            });
        Ok(rule.clone())
    }

    /// Flags (a) any actor with >= 3 amendments in the window, (b) > 10
    /// amendments total in the window.
    pub fn detect_power_creep(&self, window_ms: u64, now_ms: i64) -> PowerCreepReport {
        let amendments = self.amendments.read().expect("governance lock poisoned");
        let in_window: Vec<&Amendment> = amendments
            .iter()
            .filter(|a| (now_ms - a.ts_ms) as u64 <= window_ms)
            .collect();

        let mut per_actor: HashMap<String, u32> = HashMap::new();
        for amendment in &in_window {
            for vote in &amendment.votes {
                if vote.approve {
                    *per_actor.entry(vote.actor_id.clone()).or_insert(0) += 1;
                }
            }
        }
        let flagged_actors: Vec<String> = per_actor
            .into_iter()
            .filter(|(_, count)| *count >= 3)
            .map(|(actor, _)| actor)
            .collect();

        PowerCreepReport {
            total_amendments: in_window.len() as u32,
            exceeds_total_threshold: in_window.len() > 10,
            flagged_actors,
        }
    }
}

impl Default for GovernanceGate {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub actor_id: String,
    pub approve: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmendmentKind {
    Amend,
    Revert,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amendment {
    pub rule_id: String,
    pub kind: AmendmentKind,
    pub ts_ms: i64,
    pub votes: Vec<Vote>,
}

/// `ConstitutionRule`. `DIMS`/`BOUNDS`/`DECAY`/`CONSERVATION`/
/// `MOMENTUM` constants themselves never live here (I9): this struct models
/// the separate, amendable *rules table*, not the frozen constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstitutionRule {
    pub id: String,
    pub text: String,
    pub version: u32,
    pub provenance: String,
    pub votes: Vec<Vote>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerCreepReport {
    pub total_amendments: u32,
    pub exceeds_total_threshold: bool,
    pub flagged_actors: Vec<String>,
}
