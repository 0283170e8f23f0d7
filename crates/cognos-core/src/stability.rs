//! Drift/stability detectors and the failure -> test/guardrail/constraint generator (C17).
//!
//! Grounded on the teacher's `red_team::{Severity, SecurityFinding}`
//! detector-returns-structured-verdict shape, generalized from security
//! findings to epistemic drift detectors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriftType {
    EpistemicMonoculture,
    TransferOveruse,
    EconomicBias,
    AttentionCollapse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftSignal {
    pub detected: bool,
    pub score: f64,
    pub threshold: f64,
    #[serde(rename = "type")]
    pub drift_type: DriftType,
    pub detail: String,
}

/// Max domain share of total DTUs/decisions >= 0.7.
pub fn detect_epistemic_monoculture(domain_counts: &HashMap<String, u32>) -> DriftSignal {
    let total: u32 = domain_counts.values().sum();
    let max_share = if total == 0 {
        0.0
    } else {
        *domain_counts.values().max().unwrap_or(&0) as f64 / total as f64
    };
    DriftSignal {
        detected: max_share >= 0.7,
        score: max_share,
        threshold: 0.7,
        drift_type: DriftType::EpistemicMonoculture,
        detail: format!("max domain share = {max_share:.3}"),
    }
}

/// Fraction of learning sourced from transfer >= 0.6.
pub fn detect_transfer_overuse(transfer_sourced: u32, total_learning: u32) -> DriftSignal {
    let ratio = if total_learning == 0 {
        0.0
    } else {
        transfer_sourced as f64 / total_learning as f64
    };
    DriftSignal {
        detected: ratio >= 0.6,
        score: ratio,
        threshold: 0.6,
        drift_type: DriftType::TransferOveruse,
        detail: format!("transfer ratio = {ratio:.3}"),
    }
}

/// Fraction of economic-motivated decisions >= 0.5.
pub fn detect_economic_bias(economic_decisions: u32, total_decisions: u32) -> DriftSignal {
    let ratio = if total_decisions == 0 {
        0.0
    } else {
        economic_decisions as f64 / total_decisions as f64
    };
    DriftSignal {
        detected: ratio >= 0.5,
        score: ratio,
        threshold: 0.5,
        drift_type: DriftType::EconomicBias,
        detail: format!("economic ratio = {ratio:.3}"),
    }
}

/// Top-20%-of-domains attention share >= 0.8.
pub fn detect_attention_collapse(attention_weights: &HashMap<String, f64>) -> DriftSignal {
    let total: f64 = attention_weights.values().sum();
    if total == 0.0 || attention_weights.is_empty() {
        return DriftSignal {
            detected: false,
            score: 0.0,
            threshold: 0.8,
            drift_type: DriftType::AttentionCollapse,
            detail: "no attention data".to_string(),
        };
    }
    let mut weights: Vec<f64> = attention_weights.values().copied().collect();
    weights.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top_count = ((weights.len() as f64 * 0.2).ceil() as usize).max(1);
    let top_sum: f64 = weights.iter().take(top_count).sum();
    let share = top_sum / total;
    DriftSignal {
        detected: share >= 0.8,
        score: share,
        threshold: 0.8,
        drift_type: DriftType::AttentionCollapse,
        detail: format!("top-20% share = {share:.3}"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredFailure {
    pub failure_id: String,
    pub description: String,
    pub drift_type: Option<DriftType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintSeverity {
    Must,
    Should,
    May,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTest {
    pub id: String,
    pub failure_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub id: String,
    pub failure_id: String,
    pub severity: ConstraintSeverity,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Guardrail {
    pub id: String,
    pub failure_id: String,
    pub description: String,
    pub automated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedArtifacts {
    pub test: RegressionTest,
    pub constraint: Constraint,
    pub guardrail: Guardrail,
}

/// On any real failure, emits one regression test, one must-severity
/// constraint, and one automated guardrail — bounded ring buffers cap each
/// list at `ring_capacity`.
pub struct StabilityMonitor {
    ring_capacity: usize,
    tests: std::sync::RwLock<Vec<RegressionTest>>,
    constraints: std::sync::RwLock<Vec<Constraint>>,
    guardrails: std::sync::RwLock<Vec<Guardrail>>,
}

impl StabilityMonitor {
    pub fn new(ring_capacity: usize) -> Self {
        Self {
            ring_capacity: ring_capacity.max(1),
            tests: std::sync::RwLock::new(Vec::new()),
            constraints: std::sync::RwLock::new(Vec::new()),
            guardrails: std::sync::RwLock::new(Vec::new()),
        }
    }

    pub fn generate_from_failure(&self, failure: &StructuredFailure, id_prefix: &str) -> GeneratedArtifacts {
        let test = RegressionTest {
            id: format!("{id_prefix}-test"),
            failure_id: failure.failure_id.clone(),
            description: format!("Regression test for: {}", failure.description),
        };
        let constraint = Constraint {
            id: format!("{id_prefix}-constraint"),
            failure_id: failure.failure_id.clone(),
            severity: ConstraintSeverity::Must,
            description: format!("Must not repeat: {}", failure.description),
        };
        let guardrail = Guardrail {
            id: format!("{id_prefix}-guardrail"),
            failure_id: failure.failure_id.clone(),
            description: format!("Automated guardrail for: {}", failure.description),
            automated: true,
        };

        push_bounded(&self.tests, test.clone(), self.ring_capacity);
        push_bounded(&self.constraints, constraint.clone(), self.ring_capacity);
        push_bounded(&self.guardrails, guardrail.clone(), self.ring_capacity);

        GeneratedArtifacts {
            test,
            constraint,
            guardrail,
        }
    }

    pub fn test_count(&self) -> usize {
        self.tests.read().expect("stability lock poisoned").len()
    }
}

fn push_bounded<T: Clone>(ring: &std::sync::RwLock<Vec<T>>, item: T, capacity: usize) {
    let mut guard = ring.write().expect("stability lock poisoned");
    if guard.len() >= capacity {
        guard.remove(0);
    }
    guard.push(item);
}
