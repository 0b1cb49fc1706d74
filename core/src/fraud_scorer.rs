//! Fraud risk scoring for check-in and payment attempts.
//!
//! This analyzer:
//!   1. Scores check-in attempts over six weighted signals
//!   2. Scores payment attempts over six payment-specific signals
//!   3. Flags suspicious activity when a decision crosses the block line
//!   4. Maintains per-guest risk profiles (merge, never overwrite)
//!   5. Aggregates fraud reports over a time window
//!   6. Serves the declarative rule catalogue for audit display
//!
//! Scoring is stateless per attempt; the only write is the audit append
//! plus the profile merge, and neither failure ever flips the primary
//! allow/review/block decision.

use crate::{
    cache::SignalCache,
    clock::SharedClock,
    config::EngineConfig,
    error::{EngineError, EngineResult},
    factor::{aggregate_risk, RiskFactor, RiskLevel},
    metrics::EngineMetrics,
    store::EngineStore,
    types::{DeviceId, EventId, GuestId},
};
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

// ── Constants ────────────────────────────────────────────────────────────────

/// Activity-log entries at or below this score never mark a guest suspicious.
const SUSPICIOUS_SCORE_FLOOR: f64 = 70.0;
/// How far back the suspicious-activity check looks.
const ACTIVITY_LOOKBACK_HOURS: i64 = 24;
/// How many past check-ins feed the time-of-day profile.
const BEHAVIOR_SAMPLE: usize = 50;
/// QR payload version prefix accepted by the integrity check.
const QR_PREFIX: &str = "GC1";

// ── Input value objects ──────────────────────────────────────────────────────

/// Caller-supplied snapshot of one check-in attempt. Never mutated.
#[derive(Debug, Clone)]
pub struct CheckInAttempt {
    pub guest_id: GuestId,
    pub event_id: EventId,
    pub device_id: DeviceId,
    pub ip: String,
    pub latitude: f64,
    pub longitude: f64,
    pub qr_payload: String,
    pub occurred_at: DateTime<Utc>,
}

/// Caller-supplied snapshot of one payment attempt. Never mutated.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    pub guest_id: GuestId,
    pub event_id: EventId,
    pub device_id: DeviceId,
    pub ip: String,
    pub ip_country: String,
    pub card_suffix: String,
    pub card_country: String,
    pub amount: f64,
    pub occurred_at: DateTime<Utc>,
}

// ── Decision objects ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RiskScore {
    pub score: f64,
    pub level: RiskLevel,
    pub factors: Vec<RiskFactor>,
    pub recommendation: String,
    pub requires_manual_review: bool,
    pub should_block: bool,
}

impl RiskScore {
    fn decide(factors: Vec<RiskFactor>, block_above: f64, review_above: f64) -> Self {
        let score = aggregate_risk(&factors);
        let level = RiskLevel::for_score(score);
        let should_block = score > block_above;
        let requires_manual_review = should_block || score > review_above;
        let recommendation = match level {
            RiskLevel::Critical => "Block the attempt and alert the fraud team".to_string(),
            RiskLevel::High => "Hold for manual review before completing".to_string(),
            RiskLevel::Medium => "Proceed with additional verification".to_string(),
            RiskLevel::Low => "Proceed".to_string(),
        };
        Self {
            score,
            level,
            factors,
            recommendation,
            requires_manual_review,
            should_block,
        }
    }

    /// Conservative stand-in when signal stores are unavailable: hold for
    /// manual review, never block, never silently allow.
    fn degraded(review_above: f64, reason: String) -> Self {
        let score = review_above;
        Self {
            score,
            level: RiskLevel::for_score(score),
            factors: vec![RiskFactor::new("signals_degraded", 0.0, reason, false)],
            recommendation: "Signal stores unavailable; hold for manual review".to_string(),
            requires_manual_review: true,
            should_block: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspiciousActivity {
    pub activity_id: String,
    pub guest_id: GuestId,
    pub activity_type: String,
    pub description: String,
    pub risk_score: f64,
    pub occurred_at: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskProfile {
    pub guest_id: GuestId,
    pub peak_score: f64,
    pub flag_count: i64,
    pub last_flagged_at: DateTime<Utc>,
}

/// Declarative rule catalogue entry. Loaded read-only for audit display;
/// the scoring functions above do not evaluate rule conditions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudRule {
    pub rule_id: String,
    pub name: String,
    pub description: String,
    pub condition: String,
    pub risk_weight: f64,
    pub is_active: bool,
    pub rule_type: String,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LevelCounts {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub critical: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FraudReport {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total_transactions: i64,
    pub suspicious_count: i64,
    pub blocked_count: i64,
    pub by_level: LevelCounts,
}

// ── Analyzer ─────────────────────────────────────────────────────────────────

pub struct FraudRiskScorer {
    store: Arc<EngineStore>,
    config: Arc<EngineConfig>,
    clock: SharedClock,
    metrics: Arc<EngineMetrics>,
    activity_log: SignalCache<Vec<SuspiciousActivity>>,
    profiles: SignalCache<Option<RiskProfile>>,
    reports: SignalCache<FraudReport>,
    rules: SignalCache<Vec<FraudRule>>,
}

impl FraudRiskScorer {
    pub fn new(
        store: Arc<EngineStore>,
        config: Arc<EngineConfig>,
        clock: SharedClock,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        let wait = config.cache.wait_timeout();
        Self {
            activity_log: SignalCache::new("activity_log", clock.clone(), wait),
            profiles: SignalCache::new("risk_profiles", clock.clone(), wait),
            reports: SignalCache::new("fraud_reports", clock.clone(), wait),
            rules: SignalCache::new("fraud_rules", clock.clone(), wait),
            store,
            config,
            clock,
            metrics,
        }
    }

    // ── Check-in analysis ──────────────────────────────────────

    /// Score a check-in attempt. Fails closed on transient store trouble:
    /// the caller gets a review-required decision instead of an error.
    pub fn analyze_check_in(&self, attempt: &CheckInAttempt) -> EngineResult<RiskScore> {
        let started = Instant::now();
        match self.score_check_in(attempt) {
            Ok(decision) => {
                self.metrics.observe("analyze_check_in", started, true);
                Ok(decision)
            }
            Err(e) if e.is_transient() => {
                log::warn!(
                    "check-in analysis degraded for guest {}: {e}",
                    attempt.guest_id
                );
                self.metrics.observe("analyze_check_in", started, false);
                Ok(RiskScore::degraded(
                    self.config.check_in.review_above,
                    format!("transient signal failure: {e}"),
                ))
            }
            Err(e) => {
                self.metrics.observe("analyze_check_in", started, false);
                Err(e)
            }
        }
    }

    fn score_check_in(&self, attempt: &CheckInAttempt) -> EngineResult<RiskScore> {
        let rules = &self.config.check_in;
        let event = self
            .store
            .get_event(&attempt.event_id)?
            .ok_or_else(|| EngineError::NotFound {
                kind: "event",
                id: attempt.event_id.clone(),
            })?;

        let mut factors = Vec::with_capacity(6);

        let since = attempt.occurred_at - Duration::minutes(rules.velocity_window_minutes);
        let recent = self
            .store
            .count_check_ins_for_guest_since(&attempt.guest_id, since)?;
        factors.push(RiskFactor::new(
            "velocity",
            rules.weights.velocity,
            format!(
                "{recent} check-ins in the last {} minutes",
                rules.velocity_window_minutes
            ),
            recent > rules.velocity_max_check_ins,
        ));

        let since = attempt.occurred_at - Duration::days(rules.device_window_days);
        let device_guests = self
            .store
            .count_distinct_guests_for_device_since(&attempt.device_id, since)?;
        factors.push(RiskFactor::new(
            "device_reputation",
            rules.weights.device_reputation,
            format!(
                "device used by {device_guests} distinct guests in {} days",
                rules.device_window_days
            ),
            device_guests > rules.device_max_guests,
        ));

        let distance_km = haversine_km(
            attempt.latitude,
            attempt.longitude,
            event.venue_lat,
            event.venue_lon,
        );
        factors.push(RiskFactor::new(
            "geo_distance",
            rules.weights.geo_distance,
            format!("{distance_km:.1} km from the venue"),
            distance_km > rules.geo_max_distance_km,
        ));

        let hours = self
            .store
            .guest_check_in_hours(&attempt.guest_id, BEHAVIOR_SAMPLE)?;
        let behavior_triggered = if hours.len() >= rules.behavior_min_history {
            let typical = circular_mean_hour(&hours);
            let drift =
                circular_hour_distance(f64::from(attempt.occurred_at.hour()), typical);
            drift > rules.behavior_max_hour_drift
        } else {
            false
        };
        factors.push(RiskFactor::new(
            "behavior",
            rules.weights.behavior,
            format!(
                "time-of-day compared against {} historical check-ins",
                hours.len()
            ),
            behavior_triggered,
        ));

        let qr_ok = qr_payload_matches(&attempt.qr_payload, &attempt.event_id, &attempt.guest_id);
        factors.push(RiskFactor::new(
            "qr_integrity",
            rules.weights.qr_integrity,
            "QR payload well-formed and bound to this guest and event",
            !qr_ok,
        ));

        let earliest = event.starts_at - Duration::hours(rules.early_entry_grace_hours);
        let out_of_window = attempt.occurred_at < earliest || attempt.occurred_at > event.ends_at;
        factors.push(RiskFactor::new(
            "time_window",
            rules.weights.time_window,
            format!(
                "attempt at {} against window {} .. {}",
                attempt.occurred_at, earliest, event.ends_at
            ),
            out_of_window,
        ));

        let decision = RiskScore::decide(factors, rules.block_above, rules.review_above);

        if decision.should_block {
            let activity = SuspiciousActivity {
                activity_id: Uuid::new_v4().to_string(),
                guest_id: attempt.guest_id.clone(),
                activity_type: "check_in_blocked".to_string(),
                description: blocked_description("Check-in", &decision),
                risk_score: decision.score,
                occurred_at: attempt.occurred_at,
                metadata: HashMap::from([
                    ("event_id".to_string(), attempt.event_id.clone()),
                    ("device_id".to_string(), attempt.device_id.clone()),
                    ("ip".to_string(), attempt.ip.clone()),
                ]),
            };
            // Audit failure must not change the block decision itself.
            if let Err(e) = self.flag_suspicious_activity(&activity) {
                log::error!(
                    "failed to flag blocked check-in for guest {}: {e}",
                    attempt.guest_id
                );
            }
        }

        Ok(decision)
    }

    // ── Payment analysis ───────────────────────────────────────

    /// Score a payment attempt before capture. Fails closed like
    /// [`Self::analyze_check_in`].
    pub fn analyze_payment(&self, attempt: &PaymentAttempt) -> EngineResult<RiskScore> {
        let started = Instant::now();
        match self.score_payment(attempt) {
            Ok(decision) => {
                self.metrics.observe("analyze_payment", started, true);
                Ok(decision)
            }
            Err(e) if e.is_transient() => {
                log::warn!(
                    "payment analysis degraded for guest {}: {e}",
                    attempt.guest_id
                );
                self.metrics.observe("analyze_payment", started, false);
                Ok(RiskScore::degraded(
                    self.config.payment.review_above,
                    format!("transient signal failure: {e}"),
                ))
            }
            Err(e) => {
                self.metrics.observe("analyze_payment", started, false);
                Err(e)
            }
        }
    }

    fn score_payment(&self, attempt: &PaymentAttempt) -> EngineResult<RiskScore> {
        let rules = &self.config.payment;
        let event = self
            .store
            .get_event(&attempt.event_id)?
            .ok_or_else(|| EngineError::NotFound {
                kind: "event",
                id: attempt.event_id.clone(),
            })?;

        let mut factors = Vec::with_capacity(6);

        let since = attempt.occurred_at - Duration::minutes(rules.velocity_window_minutes);
        let recent = self
            .store
            .count_payments_for_guest_since(&attempt.guest_id, since)?;
        factors.push(RiskFactor::new(
            "velocity",
            rules.weights.velocity,
            format!(
                "{recent} payment attempts in the last {} minutes",
                rules.velocity_window_minutes
            ),
            recent > rules.velocity_max_payments,
        ));

        let since = attempt.occurred_at - Duration::days(rules.card_window_days);
        let card_guests = self
            .store
            .count_distinct_guests_for_card_since(&attempt.card_suffix, since)?;
        factors.push(RiskFactor::new(
            "card_reputation",
            rules.weights.card_reputation,
            format!(
                "card ending {} used by {card_guests} distinct guests in {} days",
                attempt.card_suffix, rules.card_window_days
            ),
            card_guests > rules.card_max_guests,
        ));

        let expected = event.base_price;
        let amount_anomalous = expected > 0.0
            && (attempt.amount > expected * rules.amount_high_ratio
                || attempt.amount < expected * rules.amount_low_ratio);
        factors.push(RiskFactor::new(
            "amount_anomaly",
            rules.weights.amount_anomaly,
            format!(
                "amount {:.0} against expected ticket price {expected:.0}",
                attempt.amount
            ),
            amount_anomalous,
        ));

        let geo_mismatch = !attempt.ip_country.is_empty()
            && !attempt.card_country.is_empty()
            && attempt.ip_country != attempt.card_country;
        factors.push(RiskFactor::new(
            "geo_mismatch",
            rules.weights.geo_mismatch,
            format!(
                "IP country '{}' vs card country '{}'",
                attempt.ip_country, attempt.card_country
            ),
            geo_mismatch,
        ));

        let since = attempt.occurred_at - Duration::days(rules.device_window_days);
        let device_failures = self
            .store
            .count_failed_payments_for_device_since(&attempt.device_id, since)?;
        factors.push(RiskFactor::new(
            "device_history",
            rules.weights.device_history,
            format!(
                "{device_failures} failed payments from this device in {} days",
                rules.device_window_days
            ),
            device_failures > rules.device_max_failures,
        ));

        let (total, failed) = self.store.guest_payment_totals(&attempt.guest_id)?;
        let failure_rate_triggered = total >= rules.failure_rate_min_attempts
            && (failed as f64 / total as f64) > rules.failure_rate_threshold;
        factors.push(RiskFactor::new(
            "failure_rate",
            rules.weights.failure_rate,
            format!("{failed} of {total} past payment attempts failed"),
            failure_rate_triggered,
        ));

        let decision = RiskScore::decide(factors, rules.block_above, rules.review_above);

        if decision.should_block {
            let activity = SuspiciousActivity {
                activity_id: Uuid::new_v4().to_string(),
                guest_id: attempt.guest_id.clone(),
                activity_type: "payment_blocked".to_string(),
                description: blocked_description("Payment", &decision),
                risk_score: decision.score,
                occurred_at: attempt.occurred_at,
                metadata: HashMap::from([
                    ("event_id".to_string(), attempt.event_id.clone()),
                    ("device_id".to_string(), attempt.device_id.clone()),
                    ("card_suffix".to_string(), attempt.card_suffix.clone()),
                    ("amount".to_string(), format!("{:.2}", attempt.amount)),
                ]),
            };
            if let Err(e) = self.flag_suspicious_activity(&activity) {
                log::error!(
                    "failed to flag blocked payment for guest {}: {e}",
                    attempt.guest_id
                );
            }
        }

        Ok(decision)
    }

    // ── Suspicious-activity surface ────────────────────────────

    /// True iff the guest's 24-hour activity log holds an entry of the
    /// given type that crossed the suspicious-score floor.
    pub fn is_suspicious_activity(
        &self,
        guest_id: &str,
        activity_type: &str,
    ) -> EngineResult<bool> {
        let since = self.clock.now() - Duration::hours(ACTIVITY_LOOKBACK_HOURS);
        let ttl = self
            .config
            .cache
            .ttl(self.config.cache.activity_log_ttl_secs);
        let entries = self.activity_log.get_or_compute(guest_id, ttl, || {
            self.store
                .suspicious_activities_for_guest_since(guest_id, since)
        })?;
        Ok(entries.iter().any(|a| {
            a.activity_type == activity_type && a.risk_score > SUSPICIOUS_SCORE_FLOOR
        }))
    }

    /// Append the audit record, merge the guest's risk profile and refresh
    /// its cache entry, and raise a critical alert when warranted.
    pub fn flag_suspicious_activity(&self, activity: &SuspiciousActivity) -> EngineResult<()> {
        self.store.append_suspicious_activity(activity)?;
        let profile = self.store.merge_risk_profile(
            &activity.guest_id,
            activity.risk_score,
            activity.occurred_at,
        )?;
        let ttl = self.config.cache.ttl(self.config.cache.profile_ttl_secs);
        self.profiles
            .insert(&activity.guest_id, Some(profile), ttl);

        if RiskLevel::for_score(activity.risk_score) == RiskLevel::Critical {
            self.metrics.record_critical_alert();
            log::error!(
                "critical suspicious activity '{}' for guest {}: {}",
                activity.activity_type,
                activity.guest_id,
                activity.description
            );
        } else {
            log::warn!(
                "suspicious activity '{}' for guest {} (score {:.0})",
                activity.activity_type,
                activity.guest_id,
                activity.risk_score
            );
        }
        Ok(())
    }

    /// The guest's merged risk profile, if any flags exist (cached 24 h).
    pub fn risk_profile(&self, guest_id: &str) -> EngineResult<Option<RiskProfile>> {
        let ttl = self.config.cache.ttl(self.config.cache.profile_ttl_secs);
        self.profiles
            .get_or_compute(guest_id, ttl, || self.store.get_risk_profile(guest_id))
    }

    // ── Reporting ──────────────────────────────────────────────

    /// Purely derived aggregate over the window; no mutation, cached 1 h.
    pub fn generate_fraud_report(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> EngineResult<FraudReport> {
        let started = Instant::now();
        let key = format!("{}..{}", from.timestamp(), to.timestamp());
        let ttl = self.config.cache.ttl(self.config.cache.report_ttl_secs);
        let block_above = self.config.check_in.block_above;
        let result = self.reports.get_or_compute(&key, ttl, || {
            let check_ins = self.store.count_check_ins_between(from, to)?;
            let payments = self.store.count_payments_between(from, to)?;
            let scores = self.store.suspicious_scores_between(from, to)?;

            let mut by_level = LevelCounts::default();
            for score in &scores {
                match RiskLevel::for_score(*score) {
                    RiskLevel::Low => by_level.low += 1,
                    RiskLevel::Medium => by_level.medium += 1,
                    RiskLevel::High => by_level.high += 1,
                    RiskLevel::Critical => by_level.critical += 1,
                }
            }
            let blocked = scores.iter().filter(|s| **s > block_above).count() as i64;

            Ok(FraudReport {
                window_start: from,
                window_end: to,
                total_transactions: check_ins + payments,
                suspicious_count: scores.len() as i64,
                blocked_count: blocked,
                by_level,
            })
        });
        self.metrics
            .observe("generate_fraud_report", started, result.is_ok());
        result
    }

    /// The active rule catalogue (cached 6 h). Rules with out-of-range
    /// weights are dropped with a warning instead of poisoning audits.
    pub fn active_fraud_rules(&self) -> EngineResult<Vec<FraudRule>> {
        let ttl = self.config.cache.ttl(self.config.cache.rules_ttl_secs);
        self.rules.get_or_compute("active", ttl, || {
            let loaded = self.store.active_fraud_rules()?;
            let mut rules = Vec::with_capacity(loaded.len());
            for rule in loaded {
                if (0.0..=1.0).contains(&rule.risk_weight) {
                    rules.push(rule);
                } else {
                    log::warn!(
                        "fraud rule '{}' has weight {} outside [0, 1]; ignoring",
                        rule.rule_id,
                        rule.risk_weight
                    );
                }
            }
            Ok(rules)
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn blocked_description(kind: &str, decision: &RiskScore) -> String {
    let triggered: Vec<&str> = decision
        .factors
        .iter()
        .filter(|f| f.triggered)
        .map(|f| f.name.as_str())
        .collect();
    format!(
        "{kind} blocked at score {:.0}; triggered factors: {}",
        decision.score,
        if triggered.is_empty() {
            "none".to_string()
        } else {
            triggered.join(", ")
        }
    )
}

/// Great-circle distance between two coordinates, in kilometres.
fn haversine_km(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat_b - lat_a).to_radians();
    let d_lon = (lon_b - lon_a).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Mean hour-of-day on the 24-hour circle.
fn circular_mean_hour(hours: &[u32]) -> f64 {
    let (mut sin_sum, mut cos_sum) = (0.0, 0.0);
    for hour in hours {
        let angle = f64::from(*hour) / 24.0 * std::f64::consts::TAU;
        sin_sum += angle.sin();
        cos_sum += angle.cos();
    }
    let mean_angle = sin_sum.atan2(cos_sum);
    (mean_angle / std::f64::consts::TAU * 24.0).rem_euclid(24.0)
}

/// Distance between two hours on the 24-hour circle (0..=12).
fn circular_hour_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(24.0);
    diff.min(24.0 - diff)
}

/// Expected payload shape: `GC1:<event_id>:<guest_id>:<token>`.
fn qr_payload_matches(payload: &str, event_id: &str, guest_id: &str) -> bool {
    let mut parts = payload.splitn(4, ':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(prefix), Some(evt), Some(guest), Some(token)) => {
            prefix == QR_PREFIX && evt == event_id && guest == guest_id && token.len() >= 8
        }
        _ => false,
    }
}

/// Build the payload the check-in workflow encodes into a guest's QR code.
pub fn qr_payload(event_id: &str, guest_id: &str, token: &str) -> String {
    format!("{QR_PREFIX}:{event_id}:{guest_id}:{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
        // Hanoi to Ho Chi Minh City is roughly 1,140 km.
        let d = haversine_km(21.0278, 105.8342, 10.7769, 106.7009);
        assert!((1100.0..1200.0).contains(&d), "distance {d}");
    }

    #[test]
    fn haversine_zero_for_same_point() {
        assert!(haversine_km(10.0, 106.0, 10.0, 106.0) < 1e-9);
    }

    #[test]
    fn circular_distance_wraps_midnight() {
        assert!((circular_hour_distance(23.0, 1.0) - 2.0).abs() < 1e-9);
        assert!((circular_hour_distance(1.0, 23.0) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn circular_mean_of_clustered_hours() {
        let mean = circular_mean_hour(&[22, 23, 0, 1, 2]);
        let drift = circular_hour_distance(mean, 0.0);
        assert!(drift < 1.0, "mean {mean}");
    }

    #[test]
    fn qr_payload_round_trips() {
        let payload = qr_payload("evt-1", "g-1", "deadbeefcafe");
        assert!(qr_payload_matches(&payload, "evt-1", "g-1"));
        assert!(!qr_payload_matches(&payload, "evt-2", "g-1"));
        assert!(!qr_payload_matches(&payload, "evt-1", "g-2"));
        assert!(!qr_payload_matches("garbage", "evt-1", "g-1"));
        assert!(!qr_payload_matches("GC1:evt-1:g-1:short", "evt-1", "g-1"));
    }

    #[test]
    fn degraded_score_reviews_but_never_blocks() {
        let decision = RiskScore::degraded(70.0, "store unavailable".to_string());
        assert!(decision.requires_manual_review);
        assert!(!decision.should_block);
    }
}
