//! Stage 7: write policy.
//!
//! Pending/authorized/denied gating reframed as a two-valued shadow/regular
//! write-discipline vocabulary.

use serde::{Deserialize, Serialize};

use crate::critic::CriticReport;
use crate::target_selection::TargetIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Requires council vote + human push before the candidate surfaces.
    Shadow,
    /// Writes through immediately via the normal `WriteGuard` path.
    Regular,
}

/// Decides the write policy for a clean or escalated critic report.
///
/// Rules, checked in order:
/// 1. Any critical critic issue ⇒ always shadow.
/// 2. `fill_gaps` intent with a clean critic ⇒ regular.
/// 3. Any other intent, even with a clean critic, ⇒ still shadow.
pub fn decide_write_policy(intent: TargetIntent, critic: &CriticReport) -> WritePolicy {
    if critic.needs_escalation {
        return WritePolicy::Shadow;
    }
    if intent == TargetIntent::FillGaps {
        return WritePolicy::Regular;
    }
    WritePolicy::Shadow
}
