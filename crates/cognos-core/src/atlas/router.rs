//! ScopeRouter: partitions writes into Local/Global/Marketplace (C11).
//!
//! Grounded on the teacher's `knowledge/store.rs` slot-routing idiom
//! (`KbType::tree_name`), generalized from 9 fixed slots to the three-lane
//! scope model plus sealed-submission scope ascension.

use crate::atlas::model::{Lane, Submission, SubmissionPayload};
use crate::error::{SubstrateError, SubstrateResult};
use crate::governance::Actor;
use crate::rights::content_hash;

pub struct ScopeRouter;

impl ScopeRouter {
    /// Transitions between scopes are never done by mutating a DTU in place;
    /// this produces the sealed Submission object that requests the move
    ///. Marketplace can only be targeted from GLOBAL.
    pub fn create_submission(
        id: String,
        source_dtu_id: &str,
        current_lane: Lane,
        target_scope: Lane,
        payload: SubmissionPayload,
        creator_id: &str,
        _actor: &Actor,
        now_ms: i64,
    ) -> SubstrateResult<Submission> {
        match (current_lane, target_scope) {
            (Lane::Local, Lane::Global) => {}
            (Lane::Global, Lane::Marketplace) => {}
            _ => {
                return Err(SubstrateError::validation(
                    "marketplace can only be targeted from global; local cannot target marketplace directly",
                ));
            }
        }

        let payload_hash = content_hash(
            &payload.title,
            payload.domain_type.as_deref().unwrap_or(""),
            payload
                .epistemic_class
                .map(|c| format!("{c:?}"))
                .unwrap_or_default()
                .as_str(),
            &payload.tags,
            &payload.claims,
            creator_id,
        );
        let source_snapshot_hash = payload_hash.clone();

        Ok(Submission::seal(
            id,
            source_dtu_id.to_string(),
            payload,
            payload_hash,
            source_snapshot_hash,
            target_scope,
        ))
    }

    pub fn lane_for_new_write(requested_scope: Lane) -> Lane {
        requested_scope
    }
}
