//! Properties of the shared weighted-factor scoring primitive.

use gatecheck_core::factor::{
    aggregate_capacity, aggregate_risk, CapacityFactor, RiskFactor, RiskLevel,
};

fn risk(weight: f64, triggered: bool) -> RiskFactor {
    RiskFactor::new("factor", weight, "test factor", triggered)
}

/// Any factor list lands inside [0, 100].
#[test]
fn score_always_in_range() {
    let cases: Vec<Vec<RiskFactor>> = vec![
        vec![],
        vec![risk(0.0, true)],
        vec![risk(1.0, true); 6],
        vec![risk(1.0, false); 6],
        vec![risk(0.2, true), risk(0.9, false), risk(0.6, true)],
        vec![risk(0.01, true)],
    ];
    for factors in cases {
        let score = aggregate_risk(&factors);
        assert!(
            (0.0..=100.0).contains(&score),
            "score {score} out of range for {} factors",
            factors.len()
        );
    }
}

/// Adding a triggered factor with weight > 0 never decreases the score.
#[test]
fn monotonic_under_triggered_factors() {
    let bases: Vec<Vec<RiskFactor>> = vec![
        vec![],
        vec![risk(0.5, true)],
        vec![risk(0.5, false)],
        vec![risk(1.0, true), risk(1.0, false)],
        vec![risk(0.3, true), risk(0.3, true), risk(0.4, false)],
    ];
    for base in bases {
        let before = aggregate_risk(&base);
        for weight in [0.1, 0.5, 1.0] {
            let mut extended = base.clone();
            extended.push(risk(weight, true));
            let after = aggregate_risk(&extended);
            assert!(
                after >= before - 1e-9,
                "score fell from {before} to {after} after adding weight {weight}"
            );
        }
    }
}

/// Boundary-exact level thresholds.
#[test]
fn level_thresholds_are_boundary_exact() {
    assert_eq!(RiskLevel::for_score(30.0), RiskLevel::Low);
    assert_eq!(RiskLevel::for_score(31.0), RiskLevel::Medium);
    assert_eq!(RiskLevel::for_score(60.0), RiskLevel::Medium);
    assert_eq!(RiskLevel::for_score(61.0), RiskLevel::High);
    assert_eq!(RiskLevel::for_score(80.0), RiskLevel::High);
    assert_eq!(RiskLevel::for_score(81.0), RiskLevel::Critical);
    assert_eq!(RiskLevel::for_score(0.0), RiskLevel::Low);
    assert_eq!(RiskLevel::for_score(100.0), RiskLevel::Critical);
}

/// Continuous impacts are averaged by weight, same clamp and floor.
#[test]
fn capacity_factors_share_the_same_math() {
    let factors = vec![
        CapacityFactor::new("a", 0.5, "d", 1.0, true),
        CapacityFactor::new("b", 0.5, "d", 0.0, false),
    ];
    // Σw = 1.0, Σw·impact = 0.5 -> 50.
    assert!((aggregate_capacity(&factors) - 50.0).abs() < 1e-9);

    let heavy = vec![CapacityFactor::new("a", 1.0, "d", 1.0, true); 3];
    assert_eq!(aggregate_capacity(&heavy), 100.0);
}
