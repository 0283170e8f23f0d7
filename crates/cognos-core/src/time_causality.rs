//! Versioned timelines, forks, diffs, causal graph, counterfactual simulation (C16).
//!
//! No direct teacher analog; built following the teacher's versioned-snapshot
//! idiom in its genetic-memory patch versioning (`{skill}_v{timestamp}`
//! naming) generalized from skill patches to lattice timelines.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineVersion {
    pub id: String,
    pub parent_id: Option<String>,
    pub created_at_ms: i64,
    /// Opaque state snapshot — the substrate doesn't interpret this beyond
    /// diffing; callers (e.g. AtlasStore exports) decide the shape.
    pub state: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDiff {
    pub added_keys: Vec<String>,
    pub removed_keys: Vec<String>,
    pub changed_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CausalEdgeKind {
    Causes,
    Enables,
    Blocks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CausalEdge {
    pub from_version: String,
    pub to_version: String,
    pub kind: CausalEdgeKind,
}

pub struct TimeCausality {
    versions: std::sync::RwLock<HashMap<String, TimelineVersion>>,
    edges: std::sync::RwLock<Vec<CausalEdge>>,
}

impl TimeCausality {
    pub fn new() -> Self {
        Self {
            versions: std::sync::RwLock::new(HashMap::new()),
            edges: std::sync::RwLock::new(Vec::new()),
        }
    }

    pub fn record_version(&self, version: TimelineVersion) {
        self.versions
            .write()
            .expect("time causality lock poisoned")
            .insert(version.id.clone(), version);
    }

    pub fn get_version(&self, id: &str) -> Option<TimelineVersion> {
        self.versions
            .read()
            .expect("time causality lock poisoned")
            .get(id)
            .cloned()
    }

    /// Forks a new timeline branch from `parent_id`'s current state, carrying
    /// the state forward unchanged until the caller mutates it.
    pub fn fork(&self, new_id: String, parent_id: &str, now_ms: i64) -> Option<TimelineVersion> {
        let parent = self.get_version(parent_id)?;
        let forked = TimelineVersion {
            id: new_id,
            parent_id: Some(parent_id.to_string()),
            created_at_ms: now_ms,
            state: parent.state.clone(),
        };
        self.record_version(forked.clone());
        Some(forked)
    }

    /// Shallow key-level diff between two JSON object states.
    pub fn diff(&self, from_id: &str, to_id: &str) -> Option<StateDiff> {
        let from = self.get_version(from_id)?;
        let to = self.get_version(to_id)?;
        let from_obj = from.state.as_object()?;
        let to_obj = to.state.as_object()?;

        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut changed = Vec::new();

        for (key, value) in to_obj {
            match from_obj.get(key) {
                None => added.push(key.clone()),
                Some(old_value) if old_value != value => changed.push(key.clone()),
                _ => {}
            }
        }
        for key in from_obj.keys() {
            if !to_obj.contains_key(key) {
                removed.push(key.clone());
            }
        }
        Some(StateDiff {
            added_keys: added,
            removed_keys: removed,
            changed_keys: changed,
        })
    }

    pub fn add_causal_edge(&self, edge: CausalEdge) {
        self.edges.write().expect("time causality lock poisoned").push(edge);
    }

    pub fn causal_successors(&self, version_id: &str) -> Vec<CausalEdge> {
        self.edges
            .read()
            .expect("time causality lock poisoned")
            .iter()
            .filter(|e| e.from_version == version_id)
            .cloned()
            .collect()
    }

    /// Counterfactual simulation: applies `hypothetical_patch` on top of
    /// `base_id`'s state without recording a new version, returning the
    /// would-be resulting state for the caller to inspect.
    pub fn simulate_counterfactual(
        &self,
        base_id: &str,
        hypothetical_patch: &serde_json::Value,
    ) -> Option<serde_json::Value> {
        let base = self.get_version(base_id)?;
        let mut merged = base.state.clone();
        if let (Some(merged_obj), Some(patch_obj)) = (merged.as_object_mut(), hypothetical_patch.as_object()) {
            for (key, value) in patch_obj {
                merged_obj.insert(key.clone(), value.clone());
            }
        }
        Some(merged)
    }
}

impl Default for TimeCausality {
    fn default() -> Self {
        Self::new()
    }
}
