//! Dynamic ticket pricing.
//!
//! A multiplicative model over the event's base price: urgency, occupancy,
//! weekend, holiday, historical demand and a competitor ceiling. Occupancy
//! comes from the capacity module's view so both analyzers agree on it.

use crate::{
    cache::SignalCache,
    capacity_optimizer::CapacityOptimizer,
    clock::SharedClock,
    config::EngineConfig,
    error::{EngineError, EngineResult},
    metrics::EngineMetrics,
    providers::{CompetitorPriceProvider, DemandProvider},
    store::EngineStore,
    types::EventId,
};
use chrono::{Datelike, Weekday};
use std::sync::Arc;
use std::time::Instant;

/// Everything the price model looked at, for explainability.
#[derive(Debug, Clone)]
pub struct PricingFactors {
    pub days_until_event: i64,
    pub current_occupancy: f64,
    pub day_of_week: Weekday,
    pub historical_demand: f64,
    pub competitor_prices: Vec<f64>,
    pub is_holiday: bool,
    pub base_price: f64,
    pub max_guests: i64,
    pub current_registrations: i64,
}

#[derive(Debug, Clone)]
pub struct PriceRecommendation {
    pub event_id: EventId,
    pub base_price: f64,
    /// Always a multiple of the configured rounding unit.
    pub recommended_price: f64,
    pub multiplier: f64,
    pub factors: PricingFactors,
}

pub struct PricingOptimizer {
    store: Arc<EngineStore>,
    config: Arc<EngineConfig>,
    clock: SharedClock,
    metrics: Arc<EngineMetrics>,
    capacity: Arc<CapacityOptimizer>,
    demand: Arc<dyn DemandProvider>,
    competitors: Arc<dyn CompetitorPriceProvider>,
    demand_cache: SignalCache<f64>,
    competitor_cache: SignalCache<Vec<f64>>,
}

impl PricingOptimizer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<EngineStore>,
        config: Arc<EngineConfig>,
        clock: SharedClock,
        metrics: Arc<EngineMetrics>,
        capacity: Arc<CapacityOptimizer>,
        demand: Arc<dyn DemandProvider>,
        competitors: Arc<dyn CompetitorPriceProvider>,
    ) -> Self {
        let wait = config.cache.wait_timeout();
        Self {
            demand_cache: SignalCache::new("historical_demand", clock.clone(), wait),
            competitor_cache: SignalCache::new("competitor_prices", clock.clone(), wait),
            store,
            config,
            clock,
            metrics,
            capacity,
            demand,
            competitors,
        }
    }

    /// Assemble the model inputs. Demand is cached 1 h, competitor
    /// prices 6 h; the rest is read fresh.
    pub fn pricing_factors(&self, event_id: &str) -> EngineResult<PricingFactors> {
        let event = self
            .store
            .get_event(event_id)?
            .ok_or_else(|| EngineError::NotFound {
                kind: "event",
                id: event_id.to_string(),
            })?;
        let occupancy = self.capacity.occupancy(event_id)?;

        let days_until_event = (event.starts_at - self.clock.now()).num_days().max(0);

        let demand_ttl = self.config.cache.ttl(self.config.cache.demand_ttl_secs);
        let historical_demand = self.demand_cache.get_or_compute(event_id, demand_ttl, || {
            Ok(self.demand.demand_multiplier(event_id))
        })?;

        let competitor_ttl = self.config.cache.ttl(self.config.cache.competitor_ttl_secs);
        let competitor_prices = self
            .competitor_cache
            .get_or_compute(event_id, competitor_ttl, || {
                Ok(self.competitors.competitor_prices(event_id))
            })?;

        Ok(PricingFactors {
            days_until_event,
            current_occupancy: occupancy.ratio,
            day_of_week: event.starts_at.weekday(),
            historical_demand,
            competitor_prices,
            is_holiday: event.is_holiday,
            base_price: event.base_price,
            max_guests: occupancy.max_guests,
            current_registrations: occupancy.registrations,
        })
    }

    pub fn calculate_dynamic_price(&self, event_id: &str) -> EngineResult<PriceRecommendation> {
        let started = Instant::now();
        let result = self.build_price(event_id);
        self.metrics
            .observe("calculate_dynamic_price", started, result.is_ok());
        result
    }

    fn build_price(&self, event_id: &str) -> EngineResult<PriceRecommendation> {
        let factors = self.pricing_factors(event_id)?;
        let rules = &self.config.pricing;

        let mut multiplier = 1.0;

        if factors.days_until_event <= rules.urgent_days {
            multiplier *= rules.urgent_multiplier;
        } else if factors.days_until_event <= rules.soon_days {
            multiplier *= rules.soon_multiplier;
        }

        if factors.current_occupancy > rules.high_occupancy {
            multiplier *= rules.high_occupancy_multiplier;
        } else if factors.current_occupancy < rules.low_occupancy {
            multiplier *= rules.low_occupancy_multiplier;
        }

        if matches!(factors.day_of_week, Weekday::Sat | Weekday::Sun) {
            multiplier *= rules.weekend_multiplier;
        }

        if factors.is_holiday {
            multiplier *= rules.holiday_multiplier;
        }

        multiplier *= factors.historical_demand;

        if !factors.competitor_prices.is_empty() && factors.base_price > 0.0 {
            let avg: f64 = factors.competitor_prices.iter().sum::<f64>()
                / factors.competitor_prices.len() as f64;
            multiplier *= (avg / factors.base_price).min(rules.competitor_cap);
        }

        let unit = rules.rounding_unit;
        let recommended_price = (factors.base_price * multiplier / unit).round() * unit;

        log::debug!(
            "event {event_id}: base={:.0} multiplier={multiplier:.4} price={recommended_price:.0}",
            factors.base_price
        );

        Ok(PriceRecommendation {
            event_id: event_id.to_string(),
            base_price: factors.base_price,
            recommended_price,
            multiplier,
            factors,
        })
    }
}
