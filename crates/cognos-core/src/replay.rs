//! Deterministic replay engine (C4).
//!
//! No direct teacher analog — the teacher has no deterministic-replay
//! component — so this is built straight from spec §4.1's contract in the
//! teacher's idiom: a small struct, a pure function, no hidden state. The only
//! external input besides the event stream is the seed; `modelVersion` is
//! carried as metadata only.

use crate::bus::Event;
use crate::id_clock::DeterministicRng;
use serde::{Deserialize, Serialize};

/// One deterministic decision derived from a single event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub seq: u64,
    pub event_type: String,
    pub action: String,
    pub roll: u64,
}

/// Output of a replay run. `model_version` is metadata for out-of-band
/// diffing; it never feeds into `decisions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayResult {
    pub seed: String,
    pub model_version: Option<String>,
    pub decisions: Vec<Decision>,
}

/// Replays `events` against `seed`, producing a byte-identical `decisions[]`
/// for identical inputs. Each decision's action is derived only from
/// `(event.type, event.payload, rng)` — never from wall-clock `ts`.
pub fn replay(events: &[Event], seed: &str, model_version: Option<&str>) -> ReplayResult {
    let mut rng = DeterministicRng::from_seed(seed);
    let decisions = events
        .iter()
        .map(|event| {
            let roll = rng.next_bounded(1000);
            Decision {
                seq: event.seq,
                event_type: event.event_type.clone(),
                action: derive_action(&event.event_type, &event.payload, roll),
                roll,
            }
        })
        .collect();
    ReplayResult {
        seed: seed.to_string(),
        model_version: model_version.map(|s| s.to_string()),
        decisions,
    }
}

/// Deterministic per-event-type decision function. Payload content only
/// influences the result through its (stable) serialized shape, never through
/// anything time- or host-dependent.
fn derive_action(event_type: &str, payload: &serde_json::Value, roll: u64) -> String {
    let payload_fingerprint = payload.to_string().len() as u64;
    let combined = roll.wrapping_add(payload_fingerprint);
    match event_type {
        "dispute_opened" => {
            if combined % 2 == 0 {
                "escalate".to_string()
            } else {
                "monitor".to_string()
            }
        }
        "council_vote" => "tally".to_string(),
        "world_update_proposed" => {
            if combined % 3 == 0 {
                "reject".to_string()
            } else {
                "accept".to_string()
            }
        }
        _ => "observe".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventMeta;

    fn sample_events() -> Vec<Event> {
        vec![
            Event {
                seq: 1,
                event_type: "episode_recorded".into(),
                payload: serde_json::json!({"x": 1}),
                ts: 0,
                meta: EventMeta::default(),
            },
            Event {
                seq: 2,
                event_type: "council_vote".into(),
                payload: serde_json::json!({"v": "approve"}),
                ts: 0,
                meta: EventMeta::default(),
            },
        ]
    }

    #[test]
    fn replay_is_deterministic_across_runs() {
        let events = sample_events();
        let a = replay(&events, "same", Some("v1"));
        let b = replay(&events, "same", Some("v2"));
        assert_eq!(a.decisions, b.decisions);
    }

    #[test]
    fn different_seed_can_change_decisions() {
        let events = sample_events();
        let a = replay(&events, "seed-a", None);
        let b = replay(&events, "seed-b", None);
        // rolls differ even if the derived action happens to coincide on a given type
        assert_ne!(a.decisions[0].roll, b.decisions[0].roll);
    }

    #[test]
    fn model_version_is_metadata_only() {
        let events = sample_events();
        let a = replay(&events, "same", Some("model-a"));
        let b = replay(&events, "same", Some("model-b"));
        assert_eq!(a.decisions, b.decisions);
        assert_ne!(a.model_version, b.model_version);
    }
}
