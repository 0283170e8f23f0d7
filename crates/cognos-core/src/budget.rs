//! Per-actor windowed rate budget (C5), the sole admission-control point.
//!
//! Grounded on the teacher's `TaskGovernor` clamped-accumulator style
//! (penalties that reset on a window rather than accumulate forever), adapted
//! from a biological-load penalty to a cost-unit sliding window per spec §4.4.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

fn default_domain_cost(domain: &str) -> f64 {
    match domain {
        "http" => 1.0,
        "macro" => 5.0,
        "kernelTick" => 2.0,
        "background" => 3.0,
        "transfer" => 10.0,
        "world.write" => 8.0,
        "canon.promote" => 15.0,
        "economy.distribute" => 20.0,
        _ => 1.0,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetEntry {
    pub domain: String,
    pub cost: f64,
    pub ts: i64,
}

struct ActorWindow {
    used: f64,
    window_start_ms: AtomicI64,
    entries: std::sync::Mutex<Vec<BudgetEntry>>,
}

/// Outcome of a `consume` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumeOutcome {
    pub allowed: bool,
    pub remaining: f64,
    pub cost: f64,
    pub reason: Option<String>,
    pub reset_in_ms: Option<u64>,
}

/// Single entry point for all rate limiting in the substrate: every HTTP hit, macro call, autogen step, and background
/// cycle must route through `consume`.
pub struct RateBudget {
    window_ms: i64,
    limit: f64,
    actors: DashMap<String, ActorWindow>,
}

impl RateBudget {
    pub fn new(window_ms: u64, limit: f64) -> Self {
        Self {
            window_ms: window_ms as i64,
            limit,
            actors: DashMap::new(),
        }
    }

    /// Consumes `cost` units (or the domain-default cost) from `actor`'s
    /// window. Never blocks — denial is immediate with a reset estimate.
    pub fn consume(&self, actor: &str, domain: &str, cost: Option<f64>, now_ms: i64) -> ConsumeOutcome {
        let cost = cost.unwrap_or_else(|| default_domain_cost(domain));
        let mut entry = self.actors.entry(actor.to_string()).or_insert_with(|| ActorWindow {
            used: 0.0,
            window_start_ms: AtomicI64::new(now_ms),
            entries: std::sync::Mutex::new(Vec::new()),
        });

        let window_start = entry.window_start_ms.load(Ordering::SeqCst);
        if now_ms - window_start >= self.window_ms {
            entry.used = 0.0;
            entry.window_start_ms.store(now_ms, Ordering::SeqCst);
            entry.entries.lock().expect("budget lock poisoned").clear();
        }

        let projected = entry.used + cost;
        if projected > self.limit {
            let window_start = entry.window_start_ms.load(Ordering::SeqCst);
            let elapsed = now_ms - window_start;
            let reset_in_ms = (self.window_ms - elapsed).max(0) as u64;
            return ConsumeOutcome {
                allowed: false,
                remaining: (self.limit - entry.used).max(0.0),
                cost,
                reason: Some("budget_exceeded".to_string()),
                reset_in_ms: Some(reset_in_ms),
            };
        }

        entry.used = projected;
        entry.entries.lock().expect("budget lock poisoned").push(BudgetEntry {
            domain: domain.to_string(),
            cost,
            ts: now_ms,
        });

        ConsumeOutcome {
            allowed: true,
            remaining: self.limit - entry.used,
            cost,
            reason: None,
            reset_in_ms: None,
        }
    }

    pub fn used(&self, actor: &str) -> f64 {
        self.actors.get(actor).map(|e| e.used).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_budget_is_allowed() {
        let budget = RateBudget::new(60_000, 1000.0);
        let outcome = budget.consume("alice", "http", None, 0);
        assert!(outcome.allowed);
        assert_eq!(outcome.cost, 1.0);
    }

    #[test]
    fn over_budget_is_denied_with_reset_estimate() {
        let budget = RateBudget::new(60_000, 15.0);
        let first = budget.consume("alice", "transfer", None, 0);
        assert!(first.allowed);
        let second = budget.consume("alice", "transfer", None, 1000);
        assert!(!second.allowed);
        assert_eq!(second.reason.as_deref(), Some("budget_exceeded"));
        assert!(second.reset_in_ms.unwrap() > 0);
    }

    #[test]
    fn window_elapsing_resets_usage() {
        let budget = RateBudget::new(1000, 10.0);
        budget.consume("alice", "transfer", None, 0);
        assert_eq!(budget.used("alice"), 10.0);
        let after_reset = budget.consume("alice", "http", None, 2000);
        assert!(after_reset.allowed);
        assert_eq!(budget.used("alice"), 1.0);
    }

    #[test]
    fn used_is_monotone_within_a_window() {
        let budget = RateBudget::new(60_000, 1000.0);
        budget.consume("alice", "http", None, 0);
        let before = budget.used("alice");
        budget.consume("alice", "http", None, 10);
        let after = budget.used("alice");
        assert!(after >= before);
    }

    #[test]
    fn actors_are_independent() {
        let budget = RateBudget::new(60_000, 5.0);
        budget.consume("alice", "custom", Some(5.0), 0);
        let bob = budget.consume("bob", "custom", Some(5.0), 0);
        assert!(bob.allowed);
    }
}
