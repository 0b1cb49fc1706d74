//! Check-in risk analysis: factor triggering, decision thresholds, and
//! the blocked-attempt audit side effect.

use chrono::{DateTime, Duration, TimeZone, Utc};
use gatecheck_core::{
    clock::{ManualClock, SharedClock},
    config::EngineConfig,
    engine::DecisionEngine,
    error::EngineError,
    factor::RiskLevel,
    fraud_scorer::{qr_payload, CheckInAttempt},
    providers::{FixedAccuracy, FixedCompetitors, FixedDemand, FixedWeather, WeatherKind},
    store::{EngineStore, EventRecord},
};
use std::sync::Arc;

const EVENT: &str = "evt-101";
const TENANT: &str = "tn-1";
const VENUE: (f64, f64) = (10.7769, 106.7009);

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap()
}

fn build_engine(config: EngineConfig) -> (DecisionEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(anchor()));
    let store = EngineStore::in_memory().unwrap();
    store.migrate().unwrap();
    let engine = DecisionEngine::with_providers(
        store,
        config,
        clock.clone() as SharedClock,
        Arc::new(FixedWeather(WeatherKind::Cloudy)),
        Arc::new(FixedAccuracy(1.0)),
        Arc::new(FixedDemand(1.0)),
        Arc::new(FixedCompetitors(vec![])),
    )
    .unwrap();
    (engine, clock)
}

fn seed_event(engine: &DecisionEngine) {
    engine
        .store
        .insert_event(&EventRecord {
            event_id: EVENT.into(),
            tenant_id: TENANT.into(),
            name: "Launch Night".into(),
            event_type: "conference".into(),
            venue_lat: VENUE.0,
            venue_lon: VENUE.1,
            starts_at: anchor() + Duration::hours(1),
            ends_at: anchor() + Duration::hours(7),
            max_guests: 100,
            base_price: 100_000.0,
            registrations: 60,
            is_holiday: false,
        })
        .unwrap();
}

fn clean_attempt(guest: &str) -> CheckInAttempt {
    CheckInAttempt {
        guest_id: guest.into(),
        event_id: EVENT.into(),
        device_id: "dev-1".into(),
        ip: "203.0.113.5".into(),
        latitude: VENUE.0,
        longitude: VENUE.1,
        qr_payload: qr_payload(EVENT, guest, "a1b2c3d4e5"),
        occurred_at: anchor(),
    }
}

#[test]
fn clean_guest_scores_low_and_passes() {
    let (engine, _clock) = build_engine(EngineConfig::default());
    seed_event(&engine);

    let decision = engine.fraud.analyze_check_in(&clean_attempt("g-1")).unwrap();
    assert_eq!(decision.score, 0.0);
    assert_eq!(decision.level, RiskLevel::Low);
    assert!(!decision.should_block);
    assert!(!decision.requires_manual_review);
    assert_eq!(decision.factors.len(), 6);
    assert!(decision.factors.iter().all(|f| !f.triggered));
}

/// Velocity alone at weight 1.0 (all other weights zero) saturates the
/// score and crosses the block line.
#[test]
fn velocity_at_full_weight_blocks() {
    let mut config = EngineConfig::default();
    config.check_in.weights.velocity = 1.0;
    config.check_in.weights.device_reputation = 0.0;
    config.check_in.weights.geo_distance = 0.0;
    config.check_in.weights.behavior = 0.0;
    config.check_in.weights.qr_integrity = 0.0;
    config.check_in.weights.time_window = 0.0;

    let (engine, _clock) = build_engine(config);
    seed_event(&engine);

    // Four check-ins in the last five minutes, one more incoming.
    for i in 1..=4 {
        engine
            .store
            .record_check_in(
                &format!("ci-{i}"),
                "g-1",
                EVENT,
                "dev-1",
                "203.0.113.5",
                VENUE.0,
                VENUE.1,
                anchor() - Duration::minutes(i),
            )
            .unwrap();
    }

    let decision = engine.fraud.analyze_check_in(&clean_attempt("g-1")).unwrap();
    assert_eq!(decision.score, 100.0);
    assert_eq!(decision.level, RiskLevel::Critical);
    assert!(decision.should_block);
    assert!(decision.requires_manual_review);

    // The block left an audit trail and a merged profile behind.
    assert!(engine
        .fraud
        .is_suspicious_activity("g-1", "check_in_blocked")
        .unwrap());
    let profile = engine.fraud.risk_profile("g-1").unwrap().unwrap();
    assert_eq!(profile.flag_count, 1);
    assert_eq!(profile.peak_score, 100.0);
    assert_eq!(engine.metrics.snapshot().critical_alerts, 1);
}

/// Several co-triggered factors reach review territory without blocking.
#[test]
fn co_triggered_factors_require_review_not_block() {
    let (engine, _clock) = build_engine(EngineConfig::default());
    seed_event(&engine);

    // Velocity: four rapid check-ins by the same guest.
    for i in 1..=4 {
        engine
            .store
            .record_check_in(
                &format!("ci-fast-{i}"),
                "g-rev",
                "evt-other",
                "dev-own",
                "203.0.113.5",
                VENUE.0,
                VENUE.1,
                anchor() - Duration::minutes(i),
            )
            .unwrap();
    }
    // Device reputation: six other guests on the shared device this week.
    for i in 1..=6 {
        engine
            .store
            .record_check_in(
                &format!("ci-dev-{i}"),
                &format!("g-dev-{i}"),
                EVENT,
                "dev-shared",
                "203.0.113.5",
                VENUE.0,
                VENUE.1,
                anchor() - Duration::days(i),
            )
            .unwrap();
    }

    let attempt = CheckInAttempt {
        guest_id: "g-rev".into(),
        event_id: EVENT.into(),
        device_id: "dev-shared".into(),
        ip: "198.51.100.7".into(),
        latitude: 21.0278, // ~1,100 km away
        longitude: 105.8342,
        qr_payload: "not-a-qr-payload".into(),
        occurred_at: anchor(),
    };
    let decision = engine.fraud.analyze_check_in(&attempt).unwrap();

    // velocity 0.25 + device 0.20 + geo 0.15 + qr 0.20 = 0.80 of 1.0.
    assert!((decision.score - 80.0).abs() < 1e-9, "score {}", decision.score);
    assert_eq!(decision.level, RiskLevel::High);
    assert!(decision.requires_manual_review);
    assert!(!decision.should_block);
}

#[test]
fn early_arrival_trips_only_the_window_factor() {
    let (engine, _clock) = build_engine(EngineConfig::default());
    // Event three days out; the attempt happens now.
    engine
        .store
        .insert_event(&EventRecord {
            event_id: EVENT.into(),
            tenant_id: TENANT.into(),
            name: "Launch Night".into(),
            event_type: "conference".into(),
            venue_lat: VENUE.0,
            venue_lon: VENUE.1,
            starts_at: anchor() + Duration::days(3),
            ends_at: anchor() + Duration::days(3) + Duration::hours(6),
            max_guests: 100,
            base_price: 100_000.0,
            registrations: 60,
            is_holiday: false,
        })
        .unwrap();

    let decision = engine.fraud.analyze_check_in(&clean_attempt("g-1")).unwrap();
    let triggered: Vec<&str> = decision
        .factors
        .iter()
        .filter(|f| f.triggered)
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(triggered, vec!["time_window"]);
    assert!((decision.score - 10.0).abs() < 1e-9);
    assert_eq!(decision.level, RiskLevel::Low);
}

#[test]
fn time_of_day_deviation_triggers_with_enough_history() {
    let (engine, _clock) = build_engine(EngineConfig::default());
    seed_event(&engine);

    // Five historical check-ins around 02:00; the new attempt is at noon.
    for i in 1..=5 {
        engine
            .store
            .record_check_in(
                &format!("ci-night-{i}"),
                "g-owl",
                "evt-old",
                "dev-own",
                "203.0.113.5",
                VENUE.0,
                VENUE.1,
                Utc.with_ymd_and_hms(2026, 8, 10 - i, 2, 0, 0).unwrap(),
            )
            .unwrap();
    }

    let decision = engine.fraud.analyze_check_in(&clean_attempt("g-owl")).unwrap();
    let behavior = decision
        .factors
        .iter()
        .find(|f| f.name == "behavior")
        .unwrap();
    assert!(behavior.triggered);
}

#[test]
fn unknown_event_is_a_permanent_error() {
    let (engine, _clock) = build_engine(EngineConfig::default());

    let err = engine
        .fraud
        .analyze_check_in(&clean_attempt("g-1"))
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "event", .. }));
    assert!(!err.is_transient());
}

/// The invariant holds over every decision this suite produced.
#[test]
fn blocking_always_implies_review() {
    let mut config = EngineConfig::default();
    config.check_in.weights.velocity = 1.0;
    config.check_in.weights.device_reputation = 0.0;
    config.check_in.weights.geo_distance = 0.0;
    config.check_in.weights.behavior = 0.0;
    config.check_in.weights.qr_integrity = 0.0;
    config.check_in.weights.time_window = 0.0;
    let (engine, _clock) = build_engine(config);
    seed_event(&engine);

    for i in 1..=4 {
        engine
            .store
            .record_check_in(
                &format!("ci-{i}"),
                "g-1",
                EVENT,
                "dev-1",
                "203.0.113.5",
                VENUE.0,
                VENUE.1,
                anchor() - Duration::minutes(i),
            )
            .unwrap();
    }

    let blocked = engine.fraud.analyze_check_in(&clean_attempt("g-1")).unwrap();
    let clean = engine.fraud.analyze_check_in(&clean_attempt("g-2")).unwrap();
    for decision in [&blocked, &clean] {
        assert!(!decision.should_block || decision.requires_manual_review);
    }
}
