//! Engine configuration: decision thresholds, factor weights, adjustment
//! tables and cache TTLs.
//!
//! Compiled-in defaults cover the standard deployment; a JSON file with
//! any subset of the fields can override them. Every lookup table the
//! analyzers consult (day-of-week, weather, event-type) is plain data
//! here, never a match arm buried in scoring code.

use crate::error::{EngineError, EngineResult};
use crate::providers::WeatherKind;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Master seed for the simulated signal providers.
    pub signal_seed: u64,
    /// Price the simulated competitor market clusters around.
    pub simulated_anchor_price: f64,
    pub check_in: CheckInRules,
    pub payment: PaymentRules,
    pub capacity: CapacityRules,
    pub pricing: PricingRules,
    pub adjustments: AdjustmentTables,
    pub cache: CacheSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signal_seed: 42,
            simulated_anchor_price: 100_000.0,
            check_in: CheckInRules::default(),
            payment: PaymentRules::default(),
            capacity: CapacityRules::default(),
            pricing: PricingRules::default(),
            adjustments: AdjustmentTables::default(),
            cache: CacheSettings::default(),
        }
    }
}

// ── Check-in scoring ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInRules {
    pub block_above: f64,
    pub review_above: f64,
    pub weights: CheckInWeights,
    pub velocity_window_minutes: i64,
    pub velocity_max_check_ins: i64,
    pub device_window_days: i64,
    pub device_max_guests: i64,
    pub geo_max_distance_km: f64,
    pub behavior_min_history: usize,
    pub behavior_max_hour_drift: f64,
    pub early_entry_grace_hours: i64,
}

impl Default for CheckInRules {
    fn default() -> Self {
        Self {
            block_above: 90.0,
            review_above: 70.0,
            weights: CheckInWeights::default(),
            velocity_window_minutes: 5,
            velocity_max_check_ins: 3,
            device_window_days: 7,
            device_max_guests: 5,
            geo_max_distance_km: 50.0,
            behavior_min_history: 5,
            behavior_max_hour_drift: 6.0,
            early_entry_grace_hours: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckInWeights {
    pub velocity: f64,
    pub device_reputation: f64,
    pub geo_distance: f64,
    pub behavior: f64,
    pub qr_integrity: f64,
    pub time_window: f64,
}

impl Default for CheckInWeights {
    fn default() -> Self {
        Self {
            velocity: 0.25,
            device_reputation: 0.20,
            geo_distance: 0.15,
            behavior: 0.10,
            qr_integrity: 0.20,
            time_window: 0.10,
        }
    }
}

// ── Payment scoring ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRules {
    pub block_above: f64,
    pub review_above: f64,
    pub weights: PaymentWeights,
    pub velocity_window_minutes: i64,
    pub velocity_max_payments: i64,
    pub card_window_days: i64,
    pub card_max_guests: i64,
    /// Triggered when amount > base_price * high_ratio
    /// or amount < base_price * low_ratio.
    pub amount_high_ratio: f64,
    pub amount_low_ratio: f64,
    pub device_window_days: i64,
    pub device_max_failures: i64,
    pub failure_rate_threshold: f64,
    pub failure_rate_min_attempts: i64,
}

impl Default for PaymentRules {
    fn default() -> Self {
        Self {
            block_above: 85.0,
            review_above: 60.0,
            weights: PaymentWeights::default(),
            velocity_window_minutes: 10,
            velocity_max_payments: 3,
            card_window_days: 30,
            card_max_guests: 3,
            amount_high_ratio: 3.0,
            amount_low_ratio: 0.25,
            device_window_days: 30,
            device_max_failures: 2,
            failure_rate_threshold: 0.30,
            failure_rate_min_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentWeights {
    pub velocity: f64,
    pub card_reputation: f64,
    pub amount_anomaly: f64,
    pub geo_mismatch: f64,
    pub device_history: f64,
    pub failure_rate: f64,
}

impl Default for PaymentWeights {
    fn default() -> Self {
        Self {
            velocity: 0.20,
            card_reputation: 0.20,
            amount_anomaly: 0.25,
            geo_mismatch: 0.15,
            device_history: 0.10,
            failure_rate: 0.10,
        }
    }
}

// ── Capacity optimization ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CapacityRules {
    pub max_no_show_rate: f64,
    /// Used when an event type has no attendance history at all.
    pub default_no_show_rate: f64,
    pub conservative_factor: f64,
    pub moderate_factor: f64,
    pub aggressive_factor: f64,
    pub max_overbooking_rate: f64,
    pub aggressive_above: f64,
    pub moderate_above: f64,
    /// Variable cost of admitting one extra guest.
    pub cost_per_guest: f64,
    pub holiday_months: Vec<u32>,
    pub summer_months: Vec<u32>,
    pub holiday_no_show_multiplier: f64,
    pub summer_no_show_multiplier: f64,
    pub september_no_show_multiplier: f64,
    /// Below this no-show rate, overbooking is not worth the risk.
    pub min_no_show_for_overbooking: f64,
}

impl Default for CapacityRules {
    fn default() -> Self {
        Self {
            max_no_show_rate: 0.40,
            default_no_show_rate: 0.10,
            conservative_factor: 0.70,
            moderate_factor: 0.90,
            aggressive_factor: 1.20,
            max_overbooking_rate: 0.30,
            aggressive_above: 0.25,
            moderate_above: 0.15,
            cost_per_guest: 20_000.0,
            holiday_months: vec![1, 12],
            summer_months: vec![6, 7, 8],
            holiday_no_show_multiplier: 1.2,
            summer_no_show_multiplier: 1.1,
            september_no_show_multiplier: 0.9,
            min_no_show_for_overbooking: 0.05,
        }
    }
}

impl CapacityRules {
    /// Seasonal multiplier applied both to the raw no-show rate and as
    /// one of the five contextual adjustment terms.
    pub fn seasonal_multiplier(&self, month: u32) -> f64 {
        if self.holiday_months.contains(&month) {
            self.holiday_no_show_multiplier
        } else if self.summer_months.contains(&month) {
            self.summer_no_show_multiplier
        } else if month == 9 {
            self.september_no_show_multiplier
        } else {
            1.0
        }
    }
}

// ── Dynamic pricing ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingRules {
    pub urgent_days: i64,
    pub urgent_multiplier: f64,
    pub soon_days: i64,
    pub soon_multiplier: f64,
    pub high_occupancy: f64,
    pub high_occupancy_multiplier: f64,
    pub low_occupancy: f64,
    pub low_occupancy_multiplier: f64,
    pub weekend_multiplier: f64,
    pub holiday_multiplier: f64,
    /// Ceiling on avg-competitor-price / base-price.
    pub competitor_cap: f64,
    /// Final price is rounded to the nearest multiple of this.
    pub rounding_unit: f64,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            urgent_days: 7,
            urgent_multiplier: 1.3,
            soon_days: 30,
            soon_multiplier: 1.1,
            high_occupancy: 0.8,
            high_occupancy_multiplier: 1.2,
            low_occupancy: 0.3,
            low_occupancy_multiplier: 0.9,
            weekend_multiplier: 1.15,
            holiday_multiplier: 1.25,
            competitor_cap: 1.5,
            rounding_unit: 1000.0,
        }
    }
}

// ── Adjustment tables ────────────────────────────────────────────────────────

/// Explicit enum-to-multiplier maps; unknown keys fall back to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjustmentTables {
    pub day_of_week: HashMap<String, f64>,
    pub weather: HashMap<WeatherKind, f64>,
    pub event_type: HashMap<String, f64>,
}

impl Default for AdjustmentTables {
    fn default() -> Self {
        let day_of_week = [
            ("monday", 1.0),
            ("tuesday", 1.0),
            ("wednesday", 1.0),
            ("thursday", 1.0),
            ("friday", 0.95),
            ("saturday", 0.90),
            ("sunday", 0.95),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let weather = [
            (WeatherKind::Sunny, 0.95),
            (WeatherKind::Cloudy, 1.0),
            (WeatherKind::Rainy, 1.15),
            (WeatherKind::Stormy, 1.25),
        ]
        .into_iter()
        .collect();

        let event_type = [
            ("conference", 1.10),
            ("meetup", 1.20),
            ("concert", 0.90),
            ("festival", 1.0),
            ("wedding", 0.80),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            day_of_week,
            weather,
            event_type,
        }
    }
}

impl AdjustmentTables {
    pub fn day_multiplier(&self, day: Weekday) -> f64 {
        let key = match day {
            Weekday::Mon => "monday",
            Weekday::Tue => "tuesday",
            Weekday::Wed => "wednesday",
            Weekday::Thu => "thursday",
            Weekday::Fri => "friday",
            Weekday::Sat => "saturday",
            Weekday::Sun => "sunday",
        };
        self.day_of_week.get(key).copied().unwrap_or(1.0)
    }

    pub fn weather_multiplier(&self, weather: WeatherKind) -> f64 {
        self.weather.get(&weather).copied().unwrap_or(1.0)
    }

    pub fn event_type_multiplier(&self, event_type: &str) -> f64 {
        self.event_type.get(event_type).copied().unwrap_or(1.0)
    }
}

// ── Cache settings ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// How long a coalesced waiter blocks on an in-flight computation.
    pub wait_timeout_ms: u64,
    pub no_show_ttl_secs: i64,
    pub strategy_ttl_secs: i64,
    pub weather_ttl_secs: i64,
    pub demand_ttl_secs: i64,
    pub competitor_ttl_secs: i64,
    pub activity_log_ttl_secs: i64,
    pub profile_ttl_secs: i64,
    pub report_ttl_secs: i64,
    pub rules_ttl_secs: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            wait_timeout_ms: 2_000,
            no_show_ttl_secs: 7_200,
            strategy_ttl_secs: 3_600,
            weather_ttl_secs: 3_600,
            demand_ttl_secs: 3_600,
            competitor_ttl_secs: 21_600,
            activity_log_ttl_secs: 300,
            profile_ttl_secs: 86_400,
            report_ttl_secs: 3_600,
            rules_ttl_secs: 21_600,
        }
    }
}

impl CacheSettings {
    pub fn wait_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn ttl(&self, secs: i64) -> chrono::Duration {
        chrono::Duration::seconds(secs)
    }
}

// ── Loading and validation ───────────────────────────────────────────────────

impl EngineConfig {
    /// Load overrides from a JSON file on top of the defaults.
    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make scoring meaningless.
    pub fn validate(&self) -> EngineResult<()> {
        let weights = [
            ("check_in.velocity", self.check_in.weights.velocity),
            ("check_in.device_reputation", self.check_in.weights.device_reputation),
            ("check_in.geo_distance", self.check_in.weights.geo_distance),
            ("check_in.behavior", self.check_in.weights.behavior),
            ("check_in.qr_integrity", self.check_in.weights.qr_integrity),
            ("check_in.time_window", self.check_in.weights.time_window),
            ("payment.velocity", self.payment.weights.velocity),
            ("payment.card_reputation", self.payment.weights.card_reputation),
            ("payment.amount_anomaly", self.payment.weights.amount_anomaly),
            ("payment.geo_mismatch", self.payment.weights.geo_mismatch),
            ("payment.device_history", self.payment.weights.device_history),
            ("payment.failure_rate", self.payment.weights.failure_rate),
        ];
        for (name, weight) in weights {
            if !(0.0..=1.0).contains(&weight) {
                return Err(EngineError::Invariant(format!(
                    "weight {name} = {weight} outside [0, 1]"
                )));
            }
        }

        for (name, threshold) in [
            ("check_in.block_above", self.check_in.block_above),
            ("check_in.review_above", self.check_in.review_above),
            ("payment.block_above", self.payment.block_above),
            ("payment.review_above", self.payment.review_above),
        ] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(EngineError::Invariant(format!(
                    "threshold {name} = {threshold} outside [0, 100]"
                )));
            }
        }

        if self.check_in.review_above > self.check_in.block_above
            || self.payment.review_above > self.payment.block_above
        {
            return Err(EngineError::Invariant(
                "review threshold above block threshold".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.capacity.max_overbooking_rate)
            || !(0.0..=1.0).contains(&self.capacity.max_no_show_rate)
        {
            return Err(EngineError::Invariant(
                "capacity rate bounds outside [0, 1]".into(),
            ));
        }

        if self.pricing.rounding_unit <= 0.0 {
            return Err(EngineError::Invariant("rounding_unit must be positive".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn bad_weight_rejected() {
        let mut config = EngineConfig::default();
        config.payment.weights.amount_anomaly = 1.7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn review_above_block_rejected() {
        let mut config = EngineConfig::default();
        config.check_in.review_above = 95.0;
        assert!(config.validate().is_err());
    }
}
