//! Weighted multi-factor scoring — the shared primitive under every analyzer.
//!
//! RULES:
//!   - Factor weights live in [0, 1]; out-of-range weights are a bug,
//!     caught at config validation, not clamped here.
//!   - The aggregate is the weighted mean of the factor indicators,
//!     scaled to [0, 100], with the weight sum floored at 1 so an
//!     all-zero-weight list scores 0 instead of dividing by zero.
//!   - Adding a triggered factor with weight > 0 never lowers the score.

use serde::{Deserialize, Serialize};

// ── Levels ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Boundary-exact mapping: 30 is still Low, 31 is Medium, 60 is
    /// Medium, 61 is High, 80 is High, 81 is Critical.
    pub fn for_score(score: f64) -> Self {
        if score > 80.0 {
            Self::Critical
        } else if score > 60.0 {
            Self::High
        } else if score > 30.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

// ── Factors ──────────────────────────────────────────────────────────────────

/// A boolean-triggered fraud signal. Ephemeral, produced fresh per analysis.
#[derive(Debug, Clone, Serialize)]
pub struct RiskFactor {
    pub name: String,
    pub weight: f64,
    pub description: String,
    pub triggered: bool,
}

impl RiskFactor {
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        description: impl Into<String>,
        triggered: bool,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&weight), "factor weight out of range");
        Self {
            name: name.into(),
            weight,
            description: description.into(),
            triggered,
        }
    }
}

/// A continuous capacity signal with an impact in [0, 1].
#[derive(Debug, Clone, Serialize)]
pub struct CapacityFactor {
    pub name: String,
    pub weight: f64,
    pub description: String,
    pub impact: f64,
    pub is_positive: bool,
}

impl CapacityFactor {
    pub fn new(
        name: impl Into<String>,
        weight: f64,
        description: impl Into<String>,
        impact: f64,
        is_positive: bool,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&weight), "factor weight out of range");
        debug_assert!((0.0..=1.0).contains(&impact), "factor impact out of range");
        Self {
            name: name.into(),
            weight,
            description: description.into(),
            impact,
            is_positive,
        }
    }
}

// ── Aggregation ──────────────────────────────────────────────────────────────

/// Combine boolean factors: indicator is 1 when triggered, 0 otherwise.
pub fn aggregate_risk(factors: &[RiskFactor]) -> f64 {
    weighted_score(
        factors
            .iter()
            .map(|f| (f.weight, if f.triggered { 1.0 } else { 0.0 })),
    )
}

/// Combine continuous factors: indicator is the raw impact.
pub fn aggregate_capacity(factors: &[CapacityFactor]) -> f64 {
    weighted_score(factors.iter().map(|f| (f.weight, f.impact)))
}

/// score = (Σ wᵢ·indᵢ) / max(Σ wᵢ, 1) · 100, clamped to [0, 100].
fn weighted_score(pairs: impl Iterator<Item = (f64, f64)>) -> f64 {
    let mut weight_sum = 0.0;
    let mut acc = 0.0;
    for (weight, indicator) in pairs {
        weight_sum += weight;
        acc += weight * indicator;
    }
    ((acc / weight_sum.max(1.0)) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn risk(weight: f64, triggered: bool) -> RiskFactor {
        RiskFactor::new("f", weight, "test factor", triggered)
    }

    #[test]
    fn empty_list_scores_zero() {
        assert_eq!(aggregate_risk(&[]), 0.0);
    }

    #[test]
    fn zero_total_weight_scores_zero() {
        let factors = vec![risk(0.0, true), risk(0.0, true)];
        assert_eq!(aggregate_risk(&factors), 0.0);
    }

    #[test]
    fn single_full_weight_trigger_scores_hundred() {
        let factors = vec![risk(1.0, true), risk(0.0, false)];
        assert_eq!(aggregate_risk(&factors), 100.0);
    }

    #[test]
    fn untriggered_factors_dilute() {
        // 0.5 of 1.0 total weight triggered -> 50.
        let factors = vec![risk(0.5, true), risk(0.5, false)];
        assert!((aggregate_risk(&factors) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn sub_unit_weight_sum_uses_floor_of_one() {
        // Σw = 0.4 < 1, so the divisor is 1: score = 0.4 * 100.
        let factors = vec![risk(0.4, true)];
        assert!((aggregate_risk(&factors) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn continuous_impacts_average() {
        let factors = vec![
            CapacityFactor::new("a", 1.0, "d", 0.2, true),
            CapacityFactor::new("b", 1.0, "d", 0.8, false),
        ];
        assert!((aggregate_capacity(&factors) - 50.0).abs() < 1e-9);
    }
}
