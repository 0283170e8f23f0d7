//! Unit/dimensional/mathematical reality checks (C8, part 2).

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn si_base_units() -> HashSet<&'static str> {
    ["m", "kg", "s", "A", "K", "mol", "cd"].into_iter().collect()
}

fn common_derived_units() -> HashSet<&'static str> {
    [
        "N", "J", "W", "Pa", "Hz", "V", "ohm", "C", "T", "Wb", "lm", "lx", "Gy", "Sv", "kat", "m/s",
        "m/s^2", "kg/m^3",
    ]
    .into_iter()
    .collect()
}

/// Validates a unit token against the SI base/derived allow-list, or the
/// `custom:` escape prefix for host-defined units.
pub fn is_allowed_unit(unit: &str) -> bool {
    unit.starts_with("custom:") || si_base_units().contains(unit) || common_derived_units().contains(unit)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimensionalOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// `{add, subtract}` require identical units; `{multiply, divide}` combine
/// symbolically and are always dimensionally consistent at this level of
/// checking.
pub fn dimensionally_consistent(op: DimensionalOp, unit_a: &str, unit_b: &str) -> bool {
    match op {
        DimensionalOp::Add | DimensionalOp::Subtract => unit_a == unit_b,
        DimensionalOp::Multiply | DimensionalOp::Divide => true,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bound {
    pub variable: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Flags contradictory bounds on the same variable (e.g. one claim says
/// `x <= 5`, another says `x >= 10`).
pub fn mathematically_consistent(bounds: &[Bound]) -> bool {
    let mut by_var: std::collections::HashMap<&str, (f64, f64)> = std::collections::HashMap::new();
    for b in bounds {
        let entry = by_var
            .entry(b.variable.as_str())
            .or_insert((f64::NEG_INFINITY, f64::INFINITY));
        if let Some(min) = b.min {
            entry.0 = entry.0.max(min);
        }
        if let Some(max) = b.max {
            entry.1 = entry.1.min(max);
        }
    }
    by_var.values().all(|(min, max)| min <= max)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealityCheckResult {
    pub block_promotion: bool,
    pub auto_open_dispute: bool,
    pub violations: Vec<String>,
}

/// Runs the full reality check: unit allow-list, dimensional consistency for
/// any `(op, unit_a, unit_b)` triples, and mathematical bound consistency. Any
/// violation sets `blockPromotion`; an additional hard-kernel contradiction
/// (passed in by the caller, who owns that check) sets `autoOpenDispute`.
pub fn reality_check(
    units: &[String],
    dimensional_checks: &[(DimensionalOp, String, String)],
    bounds: &[Bound],
    has_hard_kernel_contradiction: bool,
) -> RealityCheckResult {
    let mut violations = Vec::new();

    for unit in units {
        if !is_allowed_unit(unit) {
            violations.push(format!("unit_not_allowed:{unit}"));
        }
    }
    for (op, a, b) in dimensional_checks {
        if !dimensionally_consistent(*op, a, b) {
            violations.push(format!("dimension_mismatch:{a}:{b}"));
        }
    }
    if !mathematically_consistent(bounds) {
        violations.push("contradictory_bounds".to_string());
    }

    let block_promotion = !violations.is_empty();
    RealityCheckResult {
        block_promotion,
        auto_open_dispute: block_promotion && has_hard_kernel_contradiction,
        violations,
    }
}
