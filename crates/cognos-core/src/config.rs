//! Substrate configuration loaded from the environment.
//!
//! Follows the teacher's `SovereignConfig::from_env` shape: a flat struct with
//! serde defaults, populated from `COGNOS_*` environment variables via small
//! `env_u64`/`env_f32`/`env_usize` helpers, with optional `.env` support through
//! `dotenvy`. None of these values are read by more than one subsystem, so they
//! live in one place rather than being threaded through constructors by hand.

use serde::{Deserialize, Serialize};

fn default_bus_capacity() -> usize {
    100_000
}
fn default_budget_window_ms() -> u64 {
    60_000
}
fn default_budget_limit() -> f64 {
    1000.0
}
fn default_aging_increment() -> f32 {
    0.5
}
fn default_aging_interval_ms() -> u64 {
    5_000
}
fn default_starvation_threshold_ms() -> u64 {
    30_000
}
fn default_starvation_boost_priority() -> f32 {
    9.0
}
fn default_max_background_concurrency() -> usize {
    5
}
fn default_max_thread_lifetime_ms() -> u64 {
    5 * 60 * 1000
}
fn default_heartbeat_local_interval_ms() -> u64 {
    10_000
}
fn default_heartbeat_global_interval_ms() -> u64 {
    30_000
}
fn default_heartbeat_marketplace_interval_ms() -> u64 {
    60_000
}
fn default_supermajority_min_votes() -> u32 {
    3
}
fn default_supermajority_ratio() -> f32 {
    2.0 / 3.0
}
fn default_novelty_ring_capacity() -> usize {
    500
}
fn default_drift_ring_capacity() -> usize {
    200
}

/// Substrate-wide configuration.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | COGNOS_BUS_CAPACITY | 100000 | Bounded ring size of the cognition bus. |
/// | COGNOS_BUDGET_WINDOW_MS | 60000 | Sliding window size for `RateBudget`. |
/// | COGNOS_BUDGET_LIMIT | 1000 | Default per-actor budget units per window. |
/// | COGNOS_AGING_INCREMENT | 0.5 | Priority boost per aging tick. |
/// | COGNOS_AGING_INTERVAL_MS | 5000 | Aging tick interval. |
/// | COGNOS_STARVATION_THRESHOLD_MS | 30000 | Wait time before forced starvation promotion. |
/// | COGNOS_STARVATION_BOOST_PRIORITY | 9.0 | Priority assigned on starvation promotion. |
/// | COGNOS_MAX_BACKGROUND_CONCURRENCY | 5 | Concurrent background task cap. |
/// | COGNOS_MAX_THREAD_LIFETIME_MS | 300000 | Hard thread-lifetime cap. |
/// | COGNOS_HEARTBEAT_LOCAL_INTERVAL_MS | 10000 | `tickLocal` cadence. |
/// | COGNOS_HEARTBEAT_GLOBAL_INTERVAL_MS | 30000 | `tickGlobal` cadence. |
/// | COGNOS_HEARTBEAT_MARKETPLACE_INTERVAL_MS | 60000 | `tickMarketplace` cadence. |
/// | COGNOS_SUPERMAJORITY_MIN_VOTES | 3 | Minimum votes for a constitution amendment/revert. |
/// | COGNOS_SUPERMAJORITY_RATIO | 0.6667 | Approve/total ratio required for supermajority. |
/// | COGNOS_NOVELTY_RING_CAPACITY | 500 | Autogen recent-hash ring size. |
/// | COGNOS_DRIFT_RING_CAPACITY | 200 | Stability monitor alert/guardrail ring size. |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstrateConfig {
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
    #[serde(default = "default_budget_window_ms")]
    pub budget_window_ms: u64,
    #[serde(default = "default_budget_limit")]
    pub budget_limit: f64,
    #[serde(default = "default_aging_increment")]
    pub aging_increment: f32,
    #[serde(default = "default_aging_interval_ms")]
    pub aging_interval_ms: u64,
    #[serde(default = "default_starvation_threshold_ms")]
    pub starvation_threshold_ms: u64,
    #[serde(default = "default_starvation_boost_priority")]
    pub starvation_boost_priority: f32,
    #[serde(default = "default_max_background_concurrency")]
    pub max_background_concurrency: usize,
    #[serde(default = "default_max_thread_lifetime_ms")]
    pub max_thread_lifetime_ms: u64,
    #[serde(default = "default_heartbeat_local_interval_ms")]
    pub heartbeat_local_interval_ms: u64,
    #[serde(default = "default_heartbeat_global_interval_ms")]
    pub heartbeat_global_interval_ms: u64,
    #[serde(default = "default_heartbeat_marketplace_interval_ms")]
    pub heartbeat_marketplace_interval_ms: u64,
    #[serde(default = "default_supermajority_min_votes")]
    pub supermajority_min_votes: u32,
    #[serde(default = "default_supermajority_ratio")]
    pub supermajority_ratio: f32,
    #[serde(default = "default_novelty_ring_capacity")]
    pub novelty_ring_capacity: usize,
    #[serde(default = "default_drift_ring_capacity")]
    pub drift_ring_capacity: usize,
}

impl Default for SubstrateConfig {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
            budget_window_ms: default_budget_window_ms(),
            budget_limit: default_budget_limit(),
            aging_increment: default_aging_increment(),
            aging_interval_ms: default_aging_interval_ms(),
            starvation_threshold_ms: default_starvation_threshold_ms(),
            starvation_boost_priority: default_starvation_boost_priority(),
            max_background_concurrency: default_max_background_concurrency(),
            max_thread_lifetime_ms: default_max_thread_lifetime_ms(),
            heartbeat_local_interval_ms: default_heartbeat_local_interval_ms(),
            heartbeat_global_interval_ms: default_heartbeat_global_interval_ms(),
            heartbeat_marketplace_interval_ms: default_heartbeat_marketplace_interval_ms(),
            supermajority_min_votes: default_supermajority_min_votes(),
            supermajority_ratio: default_supermajority_ratio(),
            novelty_ring_capacity: default_novelty_ring_capacity(),
            drift_ring_capacity: default_drift_ring_capacity(),
        }
    }
}

impl SubstrateConfig {
    /// Loads configuration from the process environment, falling back to defaults.
    /// Reads a `.env` file first (if present) via `dotenvy`, mirroring the teacher.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            bus_capacity: env_usize("COGNOS_BUS_CAPACITY", defaults.bus_capacity),
            budget_window_ms: env_u64("COGNOS_BUDGET_WINDOW_MS", defaults.budget_window_ms),
            budget_limit: env_f64("COGNOS_BUDGET_LIMIT", defaults.budget_limit),
            aging_increment: env_f32("COGNOS_AGING_INCREMENT", defaults.aging_increment),
            aging_interval_ms: env_u64("COGNOS_AGING_INTERVAL_MS", defaults.aging_interval_ms),
            starvation_threshold_ms: env_u64(
                "COGNOS_STARVATION_THRESHOLD_MS",
                defaults.starvation_threshold_ms,
            ),
            starvation_boost_priority: env_f32(
                "COGNOS_STARVATION_BOOST_PRIORITY",
                defaults.starvation_boost_priority,
            ),
            max_background_concurrency: env_usize(
                "COGNOS_MAX_BACKGROUND_CONCURRENCY",
                defaults.max_background_concurrency,
            ),
            max_thread_lifetime_ms: env_u64(
                "COGNOS_MAX_THREAD_LIFETIME_MS",
                defaults.max_thread_lifetime_ms,
            ),
            heartbeat_local_interval_ms: env_u64(
                "COGNOS_HEARTBEAT_LOCAL_INTERVAL_MS",
                defaults.heartbeat_local_interval_ms,
            ),
            heartbeat_global_interval_ms: env_u64(
                "COGNOS_HEARTBEAT_GLOBAL_INTERVAL_MS",
                defaults.heartbeat_global_interval_ms,
            ),
            heartbeat_marketplace_interval_ms: env_u64(
                "COGNOS_HEARTBEAT_MARKETPLACE_INTERVAL_MS",
                defaults.heartbeat_marketplace_interval_ms,
            ),
            supermajority_min_votes: env_u64(
                "COGNOS_SUPERMAJORITY_MIN_VOTES",
                defaults.supermajority_min_votes as u64,
            ) as u32,
            supermajority_ratio: env_f32(
                "COGNOS_SUPERMAJORITY_RATIO",
                defaults.supermajority_ratio,
            ),
            novelty_ring_capacity: env_usize(
                "COGNOS_NOVELTY_RING_CAPACITY",
                defaults.novelty_ring_capacity,
            ),
            drift_ring_capacity: env_usize(
                "COGNOS_DRIFT_RING_CAPACITY",
                defaults.drift_ring_capacity,
            ),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f32(name: &str, default: f32) -> f32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
