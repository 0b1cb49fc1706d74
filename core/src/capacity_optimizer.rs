//! Capacity and overbooking optimization.
//!
//! This analyzer:
//!   1. Estimates the historical no-show rate for an event's type
//!   2. Derives conservative/moderate/aggressive overbooking rates
//!   3. Adjusts the moderate rate by five contextual multipliers
//!   4. Quantifies the revenue impact of a chosen rate
//!   5. Wraps everything into a recommendation with confidence and warnings
//!
//! This is the single authoritative capacity module: the pricing analyzer
//! consumes its occupancy view instead of recomputing its own.

use crate::{
    cache::SignalCache,
    clock::SharedClock,
    config::EngineConfig,
    error::{EngineError, EngineResult},
    factor::CapacityFactor,
    metrics::EngineMetrics,
    providers::{AccuracyProvider, WeatherKind, WeatherProvider},
    store::{EngineStore, EventRecord},
    types::EventId,
};
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    Conservative,
    Moderate,
    Aggressive,
}

impl StrategyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conservative => "conservative",
            Self::Moderate => "moderate",
            Self::Aggressive => "aggressive",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OverbookingStrategy {
    pub conservative_rate: f64,
    pub moderate_rate: f64,
    pub aggressive_rate: f64,
    /// Always within [0, max_overbooking_rate].
    pub recommended_rate: f64,
    pub strategy_type: StrategyType,
    /// The five contextual multipliers that shaped the recommendation.
    pub risk_factors: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevenueImpact {
    pub current_revenue: f64,
    pub optimized_revenue: f64,
    pub revenue_increase: f64,
    pub percentage_increase: f64,
    pub additional_guests: i64,
    pub cost_per_guest: f64,
    pub net_profit_increase: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationResult {
    pub event_id: EventId,
    pub recommended_capacity: i64,
    pub expected_attendance: i64,
    pub revenue_impact: RevenueImpact,
    pub recommended_overbooking_rate: f64,
    pub historical_no_show_rate: f64,
    pub weather_forecast: WeatherKind,
    pub recommendation: String,
    pub factors: Vec<CapacityFactor>,
    pub strategy: OverbookingStrategy,
}

#[derive(Debug, Clone, Serialize)]
pub struct CapacityRecommendation {
    pub result: OptimizationResult,
    /// Weighted fraction of positive factors, in [0, 1].
    pub confidence_level: f64,
    pub warnings: Vec<String>,
}

/// Pricing-relevant occupancy view of an event.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct OccupancyView {
    pub registrations: i64,
    pub max_guests: i64,
    pub ratio: f64,
}

pub struct CapacityOptimizer {
    store: Arc<EngineStore>,
    config: Arc<EngineConfig>,
    metrics: Arc<EngineMetrics>,
    weather: Arc<dyn WeatherProvider>,
    accuracy: Arc<dyn AccuracyProvider>,
    no_show_cache: SignalCache<f64>,
    strategy_cache: SignalCache<OverbookingStrategy>,
    forecast_cache: SignalCache<WeatherKind>,
}

impl CapacityOptimizer {
    pub fn new(
        store: Arc<EngineStore>,
        config: Arc<EngineConfig>,
        clock: SharedClock,
        metrics: Arc<EngineMetrics>,
        weather: Arc<dyn WeatherProvider>,
        accuracy: Arc<dyn AccuracyProvider>,
    ) -> Self {
        let wait = config.cache.wait_timeout();
        Self {
            no_show_cache: SignalCache::new("no_show_rate", clock.clone(), wait),
            strategy_cache: SignalCache::new("overbooking_strategy", clock.clone(), wait),
            forecast_cache: SignalCache::new("weather_forecast", clock, wait),
            store,
            config,
            metrics,
            weather,
            accuracy,
        }
    }

    fn event(&self, event_id: &str) -> EngineResult<EventRecord> {
        self.store
            .get_event(event_id)?
            .ok_or_else(|| EngineError::NotFound {
                kind: "event",
                id: event_id.to_string(),
            })
    }

    // ── No-show model ──────────────────────────────────────────

    /// `1 − attended/invited` over past events of the same type, scaled
    /// by the seasonal multiplier and capped. Cached 2 h.
    pub fn historical_no_show_rate(&self, event_id: &str) -> EngineResult<f64> {
        let event = self.event(event_id)?;
        let rules = &self.config.capacity;
        let ttl = self.config.cache.ttl(self.config.cache.no_show_ttl_secs);
        self.no_show_cache.get_or_compute(event_id, ttl, || {
            let rows = self.store.attendance_for_type(&event.event_type)?;
            let (invited, attended) = rows
                .iter()
                .fold((0i64, 0i64), |(i, a), row| (i + row.invited, a + row.attended));
            let raw = if invited > 0 {
                1.0 - attended as f64 / invited as f64
            } else {
                log::debug!(
                    "no attendance history for event type '{}'; using default no-show",
                    event.event_type
                );
                rules.default_no_show_rate
            };
            let seasonal = rules.seasonal_multiplier(event.starts_at.month());
            Ok((raw * seasonal).clamp(0.0, rules.max_no_show_rate))
        })
    }

    fn forecast(&self, event: &EventRecord) -> EngineResult<WeatherKind> {
        let ttl = self.config.cache.ttl(self.config.cache.weather_ttl_secs);
        self.forecast_cache.get_or_compute(&event.event_id, ttl, || {
            Ok(self.weather.forecast(&event.event_id, event.starts_at))
        })
    }

    // ── Overbooking strategy ───────────────────────────────────

    /// Rate ladder plus contextual adjustment. Cached 1 h.
    pub fn overbooking_strategy(&self, event_id: &str) -> EngineResult<OverbookingStrategy> {
        let event = self.event(event_id)?;
        let ttl = self.config.cache.ttl(self.config.cache.strategy_ttl_secs);
        self.strategy_cache.get_or_compute(event_id, ttl, || {
            let rules = &self.config.capacity;
            let tables = &self.config.adjustments;
            let no_show = self.historical_no_show_rate(event_id)?;

            let conservative_rate = no_show * rules.conservative_factor;
            let moderate_rate = no_show * rules.moderate_factor;
            let aggressive_rate = no_show * rules.aggressive_factor;

            let weather_mult = tables.weather_multiplier(self.forecast(&event)?);
            let day_mult = tables.day_multiplier(event.starts_at.weekday());
            let type_mult = tables.event_type_multiplier(&event.event_type);
            let season_mult = rules.seasonal_multiplier(event.starts_at.month());
            let accuracy_mult = self.accuracy.accuracy_adjustment(event_id);

            let adjustment =
                (weather_mult + day_mult + type_mult + season_mult + accuracy_mult) / 5.0;

            let recommended_rate =
                (moderate_rate * adjustment).clamp(0.0, rules.max_overbooking_rate);

            let strategy_type = if recommended_rate > rules.aggressive_above {
                StrategyType::Aggressive
            } else if recommended_rate > rules.moderate_above {
                StrategyType::Moderate
            } else {
                StrategyType::Conservative
            };

            let risk_factors = BTreeMap::from([
                ("weather".to_string(), weather_mult),
                ("day_of_week".to_string(), day_mult),
                ("event_type".to_string(), type_mult),
                ("season".to_string(), season_mult),
                ("historical_accuracy".to_string(), accuracy_mult),
            ]);

            log::debug!(
                "event {event_id}: no_show={no_show:.3} adjustment={adjustment:.3} \
                 recommended={recommended_rate:.3} ({})",
                strategy_type.as_str()
            );

            Ok(OverbookingStrategy {
                conservative_rate,
                moderate_rate,
                aggressive_rate,
                recommended_rate,
                strategy_type,
                risk_factors,
            })
        })
    }

    // ── Revenue model ──────────────────────────────────────────

    /// Linear model over the base capacity and per-guest economics.
    pub fn revenue_impact(
        &self,
        overbooking_rate: f64,
        event_id: &str,
    ) -> EngineResult<RevenueImpact> {
        let event = self.event(event_id)?;
        let base = event.max_guests as f64;
        let additional_guests = (base * overbooking_rate).floor() as i64;
        let cost_per_guest = self.config.capacity.cost_per_guest;

        let current_revenue = base * event.base_price;
        let optimized_revenue = (base + additional_guests as f64) * event.base_price;
        let revenue_increase = optimized_revenue - current_revenue;
        let percentage_increase = if current_revenue > 0.0 {
            revenue_increase / current_revenue * 100.0
        } else {
            0.0
        };
        let net_profit_increase = revenue_increase - additional_guests as f64 * cost_per_guest;

        Ok(RevenueImpact {
            current_revenue,
            optimized_revenue,
            revenue_increase,
            percentage_increase,
            additional_guests,
            cost_per_guest,
            net_profit_increase,
        })
    }

    // ── Composition ────────────────────────────────────────────

    pub fn optimize_event_capacity(&self, event_id: &str) -> EngineResult<OptimizationResult> {
        let started = Instant::now();
        let result = self.build_optimization(event_id);
        self.metrics
            .observe("optimize_event_capacity", started, result.is_ok());
        result
    }

    fn build_optimization(&self, event_id: &str) -> EngineResult<OptimizationResult> {
        let event = self.event(event_id)?;
        let strategy = self.overbooking_strategy(event_id)?;
        let no_show = self.historical_no_show_rate(event_id)?;
        let forecast = self.forecast(&event)?;
        let rate = strategy.recommended_rate;

        let factors = self.capacity_factors(&event, no_show, forecast);
        let revenue_impact = self.revenue_impact(rate, event_id)?;

        let base = event.max_guests as f64;
        let recommended_capacity = (base * (1.0 + rate)).floor() as i64;
        let expected_attendance = (base * (1.0 - no_show)).floor() as i64;

        let positive_share = weighted_positive_share(&factors);
        let recommendation = if rate >= 0.20 && positive_share >= 0.6 {
            format!(
                "Conditions support aggressive overbooking: admit up to {recommended_capacity} \
                 registrations ({:.0}% over capacity)",
                rate * 100.0
            )
        } else if rate >= 0.10 {
            format!(
                "Moderate overbooking recommended: admit up to {recommended_capacity} \
                 registrations ({:.0}% over capacity)",
                rate * 100.0
            )
        } else {
            format!(
                "Keep overbooking minimal: expected attendance {expected_attendance} \
                 of {} seats",
                event.max_guests
            )
        };

        Ok(OptimizationResult {
            event_id: event_id.to_string(),
            recommended_capacity,
            expected_attendance,
            revenue_impact,
            recommended_overbooking_rate: rate,
            historical_no_show_rate: no_show,
            weather_forecast: forecast,
            recommendation,
            factors,
            strategy,
        })
    }

    /// Recommendation wrapper: confidence plus human-readable warnings.
    pub fn capacity_recommendation(
        &self,
        event_id: &str,
    ) -> EngineResult<CapacityRecommendation> {
        let result = self.optimize_event_capacity(event_id)?;
        let rules = &self.config.capacity;

        let confidence_level = weighted_positive_share(&result.factors);
        let mut warnings = Vec::new();

        if result.recommended_overbooking_rate > rules.aggressive_above {
            warnings.push(format!(
                "Recommended rate {:.0}% exceeds the {:.0}% caution line; \
                 denied-entry compensation becomes likely",
                result.recommended_overbooking_rate * 100.0,
                rules.aggressive_above * 100.0
            ));
        }
        if result.historical_no_show_rate < rules.min_no_show_for_overbooking {
            warnings.push(format!(
                "No-show rate {:.1}% is too low to justify overbooking",
                result.historical_no_show_rate * 100.0
            ));
        }
        if result.weather_forecast.is_bad() {
            warnings.push(format!(
                "Forecast is {}; attendance may swing sharply",
                result.weather_forecast.as_str()
            ));
        }
        let heavy_negatives = result
            .factors
            .iter()
            .filter(|f| !f.is_positive && f.weight >= 0.2)
            .count();
        if heavy_negatives >= 2 {
            warnings.push(format!(
                "{heavy_negatives} heavily weighted factors argue against overbooking"
            ));
        }

        Ok(CapacityRecommendation {
            result,
            confidence_level,
            warnings,
        })
    }

    // ── Occupancy view (consumed by pricing) ───────────────────

    pub fn occupancy(&self, event_id: &str) -> EngineResult<OccupancyView> {
        let event = self.event(event_id)?;
        let ratio = if event.max_guests > 0 {
            event.registrations as f64 / event.max_guests as f64
        } else {
            0.0
        };
        Ok(OccupancyView {
            registrations: event.registrations,
            max_guests: event.max_guests,
            ratio,
        })
    }

    // ── Factor discovery ───────────────────────────────────────

    fn capacity_factors(
        &self,
        event: &EventRecord,
        no_show: f64,
        forecast: WeatherKind,
    ) -> Vec<CapacityFactor> {
        let rules = &self.config.capacity;
        let tables = &self.config.adjustments;

        let occupancy_ratio = if event.max_guests > 0 {
            (event.registrations as f64 / event.max_guests as f64).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let day_mult = tables.day_multiplier(event.starts_at.weekday());
        let type_mult = tables.event_type_multiplier(&event.event_type);

        vec![
            CapacityFactor::new(
                "no_show_history",
                0.30,
                "room the historical no-show rate leaves for overbooking",
                (no_show / rules.max_no_show_rate).clamp(0.0, 1.0),
                no_show >= rules.min_no_show_for_overbooking,
            ),
            CapacityFactor::new(
                "weather",
                0.20,
                format!("forecast for the event date: {}", forecast.as_str()),
                if forecast.is_bad() { 0.8 } else { 0.2 },
                !forecast.is_bad(),
            ),
            CapacityFactor::new(
                "occupancy",
                0.20,
                "current registrations against nominal capacity",
                occupancy_ratio,
                occupancy_ratio >= 0.5,
            ),
            CapacityFactor::new(
                "day_of_week",
                0.15,
                "attendance reliability for this day of the week",
                ((day_mult - 0.8) / 0.4).clamp(0.0, 1.0),
                day_mult <= 1.0,
            ),
            CapacityFactor::new(
                "event_type",
                0.15,
                format!("no-show tendency of '{}' events", event.event_type),
                ((type_mult - 0.8) / 0.4).clamp(0.0, 1.0),
                type_mult <= 1.0,
            ),
        ]
    }
}

/// Σ weight over positive factors / Σ weight, in [0, 1].
fn weighted_positive_share(factors: &[CapacityFactor]) -> f64 {
    let total: f64 = factors.iter().map(|f| f.weight).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let positive: f64 = factors
        .iter()
        .filter(|f| f.is_positive)
        .map(|f| f.weight)
        .sum();
    positive / total
}
