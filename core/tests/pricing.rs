//! Dynamic pricing: the multiplicative model, rounding, and the
//! competitor ceiling.

use chrono::{DateTime, Duration, TimeZone, Utc, Weekday};
use gatecheck_core::{
    clock::{ManualClock, SharedClock},
    config::EngineConfig,
    engine::DecisionEngine,
    providers::{FixedAccuracy, FixedCompetitors, FixedDemand, FixedWeather, WeatherKind},
    store::{EngineStore, EventRecord},
};
use std::sync::Arc;

const EVENT: &str = "evt-401";
const TENANT: &str = "tn-1";

fn anchor() -> DateTime<Utc> {
    // A Monday.
    Utc.with_ymd_and_hms(2026, 8, 10, 12, 0, 0).unwrap()
}

fn build_engine(demand: f64, competitors: Vec<f64>) -> (DecisionEngine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(anchor()));
    let store = EngineStore::in_memory().unwrap();
    store.migrate().unwrap();
    let engine = DecisionEngine::with_providers(
        store,
        EngineConfig::default(),
        clock.clone() as SharedClock,
        Arc::new(FixedWeather(WeatherKind::Cloudy)),
        Arc::new(FixedAccuracy(1.0)),
        Arc::new(FixedDemand(demand)),
        Arc::new(FixedCompetitors(competitors)),
    )
    .unwrap();
    (engine, clock)
}

fn seed_event(
    engine: &DecisionEngine,
    starts_at: DateTime<Utc>,
    max_guests: i64,
    registrations: i64,
    base_price: f64,
    is_holiday: bool,
) {
    engine
        .store
        .insert_event(&EventRecord {
            event_id: EVENT.into(),
            tenant_id: TENANT.into(),
            name: "Night Market".into(),
            event_type: "festival".into(),
            venue_lat: 10.7769,
            venue_lon: 106.7009,
            starts_at,
            ends_at: starts_at + Duration::hours(6),
            max_guests,
            base_price,
            registrations,
            is_holiday,
        })
        .unwrap();
}

/// Base 100k, 5 days out, 85% full, Saturday, no holiday, demand 1.0,
/// competitor ratio 1.0125: multiplier ≈ 1.816 → 182,000 after rounding.
#[test]
fn urgent_busy_saturday_prices_up() {
    let (engine, _clock) = build_engine(1.0, vec![101_250.0]);
    let saturday = Utc.with_ymd_and_hms(2026, 8, 15, 18, 0, 0).unwrap();
    seed_event(&engine, saturday, 100, 85, 100_000.0, false);

    let price = engine.pricing.calculate_dynamic_price(EVENT).unwrap();
    assert_eq!(price.factors.day_of_week, Weekday::Sat);
    assert_eq!(price.factors.days_until_event, 5);
    assert!((price.factors.current_occupancy - 0.85).abs() < 1e-9);
    assert!((price.multiplier - 1.816_425).abs() < 1e-6);
    assert!((price.recommended_price - 182_000.0).abs() < 1e-6);
}

/// Whatever the inputs, the recommended price lands on a 1000 boundary.
#[test]
fn price_is_always_a_multiple_of_1000() {
    let cases = [
        (1.0, vec![], 100_000.0, 85, 5i64),
        (1.13, vec![97_321.0, 114_950.0], 123_456.0, 40, 12),
        (0.87, vec![55_000.0], 77_700.0, 5, 60),
        (1.29, vec![250_000.0, 180_000.0, 90_000.0], 149_999.0, 99, 2),
    ];
    for (demand, competitors, base, registrations, days_out) in cases {
        let (engine, _clock) = build_engine(demand, competitors);
        seed_event(
            &engine,
            anchor() + Duration::days(days_out),
            100,
            registrations,
            base,
            false,
        );
        let price = engine.pricing.calculate_dynamic_price(EVENT).unwrap();
        let remainder = price.recommended_price.rem_euclid(1000.0);
        assert!(
            remainder < 1e-6 || (1000.0 - remainder) < 1e-6,
            "price {} is not a multiple of 1000",
            price.recommended_price
        );
    }
}

#[test]
fn distant_quiet_weekday_event_is_discounted() {
    let (engine, _clock) = build_engine(1.0, vec![]);
    // Tuesday, 43 days out, 10% full.
    let tuesday = Utc.with_ymd_and_hms(2026, 9, 22, 18, 0, 0).unwrap();
    seed_event(&engine, tuesday, 100, 10, 100_000.0, false);

    let price = engine.pricing.calculate_dynamic_price(EVENT).unwrap();
    assert_eq!(price.factors.day_of_week, Weekday::Tue);
    assert!((price.multiplier - 0.9).abs() < 1e-9);
    assert!((price.recommended_price - 90_000.0).abs() < 1e-6);
}

#[test]
fn competitor_ceiling_caps_at_one_point_five() {
    let (engine, _clock) = build_engine(1.0, vec![300_000.0]);
    // Neutral everything else: Tuesday, far out, mid occupancy.
    let tuesday = Utc.with_ymd_and_hms(2026, 9, 22, 18, 0, 0).unwrap();
    seed_event(&engine, tuesday, 100, 50, 100_000.0, false);

    let price = engine.pricing.calculate_dynamic_price(EVENT).unwrap();
    assert!((price.multiplier - 1.5).abs() < 1e-9, "multiplier {}", price.multiplier);
    assert!((price.recommended_price - 150_000.0).abs() < 1e-6);
}

#[test]
fn holiday_multiplier_applies() {
    let (engine, _clock) = build_engine(1.0, vec![]);
    let tuesday = Utc.with_ymd_and_hms(2026, 9, 22, 18, 0, 0).unwrap();
    seed_event(&engine, tuesday, 100, 50, 100_000.0, true);

    let price = engine.pricing.calculate_dynamic_price(EVENT).unwrap();
    assert!((price.multiplier - 1.25).abs() < 1e-9);
    assert!((price.recommended_price - 125_000.0).abs() < 1e-6);
}

#[test]
fn soon_window_uses_the_milder_urgency_bump() {
    let (engine, _clock) = build_engine(1.0, vec![]);
    // 23 days out: inside 30 but outside 7.
    let wednesday = Utc.with_ymd_and_hms(2026, 9, 2, 18, 0, 0).unwrap();
    seed_event(&engine, wednesday, 100, 50, 100_000.0, false);

    let price = engine.pricing.calculate_dynamic_price(EVENT).unwrap();
    assert_eq!(price.factors.day_of_week, Weekday::Wed);
    assert!((price.multiplier - 1.1).abs() < 1e-9);
    assert!((price.recommended_price - 110_000.0).abs() < 1e-6);
}

/// Occupancy comes from the capacity module's view, so both analyzers
/// agree on the same number.
#[test]
fn occupancy_matches_the_capacity_view() {
    let (engine, _clock) = build_engine(1.0, vec![]);
    let saturday = Utc.with_ymd_and_hms(2026, 8, 15, 18, 0, 0).unwrap();
    seed_event(&engine, saturday, 200, 130, 100_000.0, false);

    let factors = engine.pricing.pricing_factors(EVENT).unwrap();
    let view = engine.capacity.occupancy(EVENT).unwrap();
    assert!((factors.current_occupancy - view.ratio).abs() < 1e-12);
    assert_eq!(factors.max_guests, view.max_guests);
    assert_eq!(factors.current_registrations, view.registrations);
}
