//! Append-only typed event log with topic + wildcard subscribers (C3).
//!
//! Grounded on the teacher's `orchestrator/maintenance.rs` maintenance-pulse
//! dispatch (a `Vec` of boxed listener closures invoked synchronously in
//! registration order) generalized from one fixed pulse type to arbitrary
//! typed topics plus a `custom.` escape hatch.

use crate::id_clock::IdClock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};
use tracing::warn;

/// Stable event-type names from spec §6, plus the `custom.` escape hatch for
/// anything not enumerated. Unknown non-`custom.` types are tagged
/// `_unknownType` rather than rejected.
pub const KNOWN_EVENT_TYPES: &[&str] = &[
    "episode_recorded",
    "transfer_extracted",
    "world_update_proposed",
    "dispute_opened",
    "dispute_resolved",
    "council_vote",
    "reward_issued",
    "thread_scheduled",
    "thread_terminated",
    "gate_checked",
    "budget_consumed",
    "provenance_validated",
    "quarantine_added",
    "quarantine_released",
    "contribution_tracked",
    "reflection_assessed",
    "strategy_updated",
    "skill_compiled",
    "sandbox_created",
    "federation_exported",
    "federation_imported",
    "epistemic_classified",
    "reality_check",
    "normative_applied",
    "drift_detected",
    "timeline_forked",
    "causality_updated",
];

/// Per-event metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventMeta {
    pub actor_id: Option<String>,
    pub session_id: Option<String>,
    pub shard: Option<String>,
}

/// One entry in the cognition bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub seq: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
    pub ts: i64,
    pub meta: EventMeta,
}

/// Query filter for `CognitionBus::query`.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub event_type: Option<String>,
    pub since: Option<u64>,
    pub until: Option<u64>,
    pub actor_id: Option<String>,
    pub session_id: Option<String>,
    pub shard: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

type Subscriber = Box<dyn Fn(&Event) + Send + Sync>;

struct TopicSubscription {
    id: u64,
    topic: String,
    callback: Subscriber,
}

/// Bounded append-only log. When full, the oldest entry is evicted; eviction
/// never reuses or invalidates a future `seq`.
pub struct CognitionBus {
    capacity: usize,
    clock: IdClock,
    log: RwLock<VecDeque<Event>>,
    typed_subscribers: RwLock<Vec<TopicSubscription>>,
    wildcard_subscribers: RwLock<Vec<TopicSubscription>>,
    next_sub_id: IdClock,
}

impl CognitionBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            clock: IdClock::new(),
            log: RwLock::new(VecDeque::new()),
            typed_subscribers: RwLock::new(Vec::new()),
            wildcard_subscribers: RwLock::new(Vec::new()),
            next_sub_id: IdClock::new(),
        }
    }

    /// Appends an event, assigns its `seq`, and dispatches to subscribers
    /// synchronously in enqueue order: typed subscribers of the matching topic
    /// first, wildcard subscribers last.
    pub fn emit(&self, event_type: &str, payload: serde_json::Value, meta: EventMeta) -> Event {
        let resolved_type = if event_type.starts_with("custom.")
            || KNOWN_EVENT_TYPES.contains(&event_type)
        {
            event_type.to_string()
        } else {
            format!("_unknownType:{event_type}")
        };
        let event = Event {
            seq: self.clock.next_seq(),
            event_type: resolved_type,
            payload,
            ts: now_millis(),
            meta,
        };

        {
            let mut log = self.log.write().expect("bus log lock poisoned");
            if log.len() >= self.capacity {
                log.pop_front();
            }
            log.push_back(event.clone());
        }

        self.dispatch(&event);
        event
    }

    fn dispatch(&self, event: &Event) {
        let typed = self.typed_subscribers.read().expect("subs lock poisoned");
        for sub in typed.iter().filter(|s| s.topic == event.event_type) {
            dispatch_one(sub, event);
        }
        drop(typed);
        let wildcard = self.wildcard_subscribers.read().expect("subs lock poisoned");
        for sub in wildcard.iter() {
            dispatch_one(sub, event);
        }
    }

    /// Subscribes to a single topic, or `"*"` for wildcard. Returns an
    /// unsubscribe closure.
    pub fn subscribe(
        &self,
        topic_or_wildcard: &str,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> impl FnOnce() + '_ {
        let id = self.next_sub_id.next_seq();
        let entry = TopicSubscription {
            id,
            topic: topic_or_wildcard.to_string(),
            callback: Box::new(callback),
        };
        if topic_or_wildcard == "*" {
            self.wildcard_subscribers
                .write()
                .expect("subs lock poisoned")
                .push(entry);
        } else {
            self.typed_subscribers
                .write()
                .expect("subs lock poisoned")
                .push(entry);
        }
        move || {
            self.typed_subscribers
                .write()
                .expect("subs lock poisoned")
                .retain(|s| s.id != id);
            self.wildcard_subscribers
                .write()
                .expect("subs lock poisoned")
                .retain(|s| s.id != id);
        }
    }

    pub fn query(&self, q: &EventQuery) -> Vec<Event> {
        let log = self.log.read().expect("bus log lock poisoned");
        let mut out: Vec<Event> = log
            .iter()
            .filter(|e| q.event_type.as_deref().map_or(true, |t| e.event_type == t))
            .filter(|e| q.since.map_or(true, |s| e.seq >= s))
            .filter(|e| q.until.map_or(true, |u| e.seq <= u))
            .filter(|e| {
                q.actor_id
                    .as_deref()
                    .map_or(true, |a| e.meta.actor_id.as_deref() == Some(a))
            })
            .filter(|e| {
                q.session_id
                    .as_deref()
                    .map_or(true, |s| e.meta.session_id.as_deref() == Some(s))
            })
            .filter(|e| {
                q.shard
                    .as_deref()
                    .map_or(true, |s| e.meta.shard.as_deref() == Some(s))
            })
            .cloned()
            .collect();
        let offset = q.offset.unwrap_or(0);
        if offset >= out.len() {
            return Vec::new();
        }
        out.drain(0..offset);
        if let Some(limit) = q.limit {
            out.truncate(limit);
        }
        out
    }

    /// Returns all currently-retained events with `fromSeq <= seq <= toSeq`.
    pub fn snapshot(&self, from_seq: u64, to_seq: u64) -> Vec<Event> {
        self.log
            .read()
            .expect("bus log lock poisoned")
            .iter()
            .filter(|e| e.seq >= from_seq && e.seq <= to_seq)
            .cloned()
            .collect()
    }

    pub fn current_seq(&self) -> u64 {
        self.clock.current()
    }

    pub fn len(&self) -> usize {
        self.log.read().expect("bus log lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn dispatch_one(sub: &TopicSubscription, event: &Event) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (sub.callback)(event)));
    if result.is_err() {
        warn!(topic = %sub.topic, seq = event.seq, "bus subscriber panicked; swallowed");
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
