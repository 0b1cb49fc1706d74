//! risk-runner: headless demo driver for the gatecheck decision engine.
//!
//! Seeds a small tenant (one event, a handful of guests, some history),
//! then exercises every analyzer the way the check-in, payment and
//! planning workflows would:
//!
//!   risk-runner --db run.db --seed 42 --config engine.json

use anyhow::Result;
use chrono::{Duration, Utc};
use gatecheck_core::{
    clock::{SharedClock, SystemClock},
    config::EngineConfig,
    engine::DecisionEngine,
    fraud_scorer::{qr_payload, CheckInAttempt, PaymentAttempt},
    store::{EngineStore, EventRecord, GuestRecord},
};
use std::env;
use std::path::Path;
use std::sync::Arc;

const DEMO_TENANT: &str = "tn-demo";
const DEMO_EVENT: &str = "evt-aurora-gala";

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let seed = arg_value(&args, "--seed")
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(42);

    let mut config = match arg_value(&args, "--config") {
        Some(path) => EngineConfig::from_json_file(Path::new(path))?,
        None => EngineConfig::default(),
    };
    config.signal_seed = seed;

    println!("gatecheck — risk-runner");
    println!("  db:   {db}");
    println!("  seed: {seed}");
    println!();

    let store = if db == ":memory:" {
        EngineStore::in_memory()?
    } else {
        EngineStore::open(db)?
    };
    store.migrate()?;
    seed_demo_data(&store)?;

    let clock: SharedClock = Arc::new(SystemClock);
    let engine = DecisionEngine::build(store, config, clock)?;

    run_check_in_scenarios(&engine)?;
    run_payment_scenario(&engine)?;
    run_planning_scenarios(&engine)?;
    print_report_and_metrics(&engine)?;

    Ok(())
}

// ── Scenarios ────────────────────────────────────────────────────────────────

fn run_check_in_scenarios(engine: &DecisionEngine) -> Result<()> {
    let now = Utc::now();

    // A guest with a clean history and a valid QR code.
    let clean = CheckInAttempt {
        guest_id: "g-001".into(),
        event_id: DEMO_EVENT.into(),
        device_id: "dev-phone-1".into(),
        ip: "203.113.131.4".into(),
        latitude: 10.7772,
        longitude: 106.7010,
        qr_payload: qr_payload(DEMO_EVENT, "g-001", "a1b2c3d4e5f6"),
        occurred_at: now,
    };
    let decision = engine.fraud.analyze_check_in(&clean)?;
    print_decision("check-in (clean guest)", &decision);

    // Same guest hammering the kiosk that has already served many guests,
    // from far away, with a QR bound to someone else.
    let hot = CheckInAttempt {
        guest_id: "g-002".into(),
        event_id: DEMO_EVENT.into(),
        device_id: "dev-kiosk-9".into(),
        ip: "198.51.100.23".into(),
        latitude: 21.0278, // Hanoi, ~1,100 km from the venue
        longitude: 105.8342,
        qr_payload: qr_payload(DEMO_EVENT, "g-999", "ffffffffffff"),
        occurred_at: now,
    };
    let decision = engine.fraud.analyze_check_in(&hot)?;
    print_decision("check-in (hot device, bad QR, wrong city)", &decision);

    let suspicious = engine
        .fraud
        .is_suspicious_activity("g-002", "check_in_blocked")?;
    println!("  g-002 flagged in last 24h: {suspicious}");
    println!();
    Ok(())
}

fn run_payment_scenario(engine: &DecisionEngine) -> Result<()> {
    let attempt = PaymentAttempt {
        guest_id: "g-003".into(),
        event_id: DEMO_EVENT.into(),
        device_id: "dev-phone-3".into(),
        ip: "203.113.131.9".into(),
        ip_country: "VN".into(),
        card_suffix: "4242".into(),
        card_country: "US".into(),
        amount: 900_000.0, // 6x the ticket price
        occurred_at: Utc::now(),
    };
    let decision = engine.fraud.analyze_payment(&attempt)?;
    print_decision("payment (shared card, inflated amount, hot device)", &decision);

    let suspicious = engine
        .fraud
        .is_suspicious_activity("g-003", "payment_blocked")?;
    println!("  g-003 flagged in last 24h: {suspicious}");
    println!();
    Ok(())
}

fn run_planning_scenarios(engine: &DecisionEngine) -> Result<()> {
    let rec = engine.capacity.capacity_recommendation(DEMO_EVENT)?;
    println!("capacity recommendation for {DEMO_EVENT}:");
    println!(
        "  no-show rate:    {:.1}%",
        rec.result.historical_no_show_rate * 100.0
    );
    println!(
        "  overbooking:     {:.1}% ({})",
        rec.result.recommended_overbooking_rate * 100.0,
        rec.result.strategy.strategy_type.as_str()
    );
    println!("  capacity:        {}", rec.result.recommended_capacity);
    println!("  expected guests: {}", rec.result.expected_attendance);
    println!(
        "  net profit:      {:+.0}",
        rec.result.revenue_impact.net_profit_increase
    );
    println!("  confidence:      {:.0}%", rec.confidence_level * 100.0);
    for warning in &rec.warnings {
        println!("  warning: {warning}");
    }
    println!("  {}", rec.result.recommendation);
    println!();

    let price = engine.pricing.calculate_dynamic_price(DEMO_EVENT)?;
    println!("dynamic price for {DEMO_EVENT}:");
    println!("  base:        {:.0}", price.base_price);
    println!("  multiplier:  {:.4}", price.multiplier);
    println!("  recommended: {:.0}", price.recommended_price);
    println!();
    Ok(())
}

fn print_report_and_metrics(engine: &DecisionEngine) -> Result<()> {
    let now = Utc::now();
    let report = engine
        .fraud
        .generate_fraud_report(now - Duration::hours(24), now + Duration::minutes(1))?;
    println!("fraud report (last 24h):");
    println!("  transactions: {}", report.total_transactions);
    println!("  suspicious:   {}", report.suspicious_count);
    println!("  blocked:      {}", report.blocked_count);
    println!(
        "  by level:     low={} medium={} high={} critical={}",
        report.by_level.low, report.by_level.medium, report.by_level.high,
        report.by_level.critical
    );
    println!();

    println!("rule catalogue: {} active rules", engine.fraud.active_fraud_rules()?.len());
    println!();

    let metrics = engine.metrics.snapshot();
    println!("analyzer metrics:");
    let mut names: Vec<_> = metrics.analyzers.keys().collect();
    names.sort();
    for name in names {
        let stats = &metrics.analyzers[name];
        println!(
            "  {name}: {} calls, {} failures, {}ms total",
            stats.calls, stats.failures, stats.total_duration_ms
        );
    }
    println!("  critical alerts: {}", metrics.critical_alerts);

    Ok(())
}

fn print_decision(label: &str, decision: &gatecheck_core::fraud_scorer::RiskScore) {
    println!("{label}:");
    println!(
        "  score {:.0} ({}) — block={} review={}",
        decision.score,
        decision.level.as_str(),
        decision.should_block,
        decision.requires_manual_review
    );
    for factor in decision.factors.iter().filter(|f| f.triggered) {
        println!("  triggered: {} — {}", factor.name, factor.description);
    }
    println!("  {}", decision.recommendation);
}

// ── Demo data ────────────────────────────────────────────────────────────────

fn seed_demo_data(store: &EngineStore) -> Result<()> {
    let now = Utc::now();

    store.insert_event(&EventRecord {
        event_id: DEMO_EVENT.into(),
        tenant_id: DEMO_TENANT.into(),
        name: "Aurora Gala".into(),
        event_type: "conference".into(),
        venue_lat: 10.7769, // Ho Chi Minh City
        venue_lon: 106.7009,
        starts_at: now + Duration::days(5),
        ends_at: now + Duration::days(5) + Duration::hours(6),
        max_guests: 200,
        base_price: 150_000.0,
        registrations: 170,
        is_holiday: false,
    })?;

    // Past conferences: roughly one in five invitees never shows.
    let history: [(i64, i64); 4] = [(180, 150), (220, 170), (160, 130), (250, 200)];
    for (i, (invited, attended)) in history.iter().enumerate() {
        store.insert_attendance(
            &format!("hist-{i:03}"),
            DEMO_TENANT,
            "conference",
            3 + i as u32,
            *invited,
            *attended,
        )?;
    }

    for i in 1..=9 {
        store.insert_guest(&GuestRecord {
            guest_id: format!("g-{i:03}"),
            tenant_id: DEMO_TENANT.into(),
            name: format!("Demo Guest {i}"),
            created_at: now - Duration::days(90),
        })?;
    }

    // dev-kiosk-9 has served eight different guests this week.
    for i in 1..=8 {
        store.record_check_in(
            &uuid::Uuid::new_v4().to_string(),
            &format!("g-{i:03}"),
            DEMO_EVENT,
            "dev-kiosk-9",
            "198.51.100.23",
            10.7769,
            106.7009,
            now - Duration::days(i),
        )?;
    }

    // g-002 has been hammering the kiosk for the last few minutes.
    for i in 1..=4 {
        store.record_check_in(
            &uuid::Uuid::new_v4().to_string(),
            "g-002",
            DEMO_EVENT,
            "dev-kiosk-9",
            "198.51.100.23",
            10.7769,
            106.7009,
            now - Duration::minutes(i),
        )?;
    }

    // The 4242 card has paid for four different guests this month.
    for i in 1..=4 {
        store.record_payment(
            &uuid::Uuid::new_v4().to_string(),
            &format!("g-{i:03}"),
            DEMO_EVENT,
            &format!("dev-phone-{i}"),
            "203.113.131.9",
            "4242",
            150_000.0,
            true,
            now - Duration::days(i * 2),
        )?;
    }

    // And g-003 just burned through four attempts, three of them declined.
    for i in 1..=4i64 {
        store.record_payment(
            &uuid::Uuid::new_v4().to_string(),
            "g-003",
            DEMO_EVENT,
            "dev-phone-3",
            "203.113.131.9",
            "4242",
            150_000.0,
            i == 1,
            now - Duration::minutes(i * 2),
        )?;
    }

    seed_rule_catalogue(store)?;
    Ok(())
}

fn seed_rule_catalogue(store: &EngineStore) -> Result<()> {
    use gatecheck_core::fraud_scorer::FraudRule;

    let rules = [
        FraudRule {
            rule_id: "r-velocity".into(),
            name: "Check-in velocity".into(),
            description: "More check-ins than a human produces in five minutes".into(),
            condition: "check_ins_5m > 3".into(),
            risk_weight: 0.25,
            is_active: true,
            rule_type: "check_in".into(),
        },
        FraudRule {
            rule_id: "r-card-share".into(),
            name: "Card sharing".into(),
            description: "One card paying for many unrelated guests".into(),
            condition: "distinct_guests_30d > 3".into(),
            risk_weight: 0.20,
            is_active: true,
            rule_type: "payment".into(),
        },
        FraudRule {
            rule_id: "r-retired".into(),
            name: "Legacy geo rule".into(),
            description: "Superseded by the distance factor".into(),
            condition: "distance_km > 100".into(),
            risk_weight: 0.15,
            is_active: false,
            rule_type: "check_in".into(),
        },
    ];
    for rule in &rules {
        store.insert_fraud_rule(rule)?;
    }
    Ok(())
}

// ── Arg parsing ──────────────────────────────────────────────────────────────

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}
