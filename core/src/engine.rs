//! The decision engine facade — wires every analyzer to one store, one
//! config, one clock and one metrics sink.
//!
//! RULES:
//!   - Analyzers never construct their own store or cache handles;
//!     everything shared is injected here.
//!   - `build()` wires the simulated signal providers from the config
//!     seed; `with_providers()` is the seam for real data sources.
//!   - The config is validated once, before anything can score.

use crate::{
    capacity_optimizer::CapacityOptimizer,
    clock::SharedClock,
    config::EngineConfig,
    error::EngineResult,
    fraud_scorer::FraudRiskScorer,
    metrics::EngineMetrics,
    pricing_optimizer::PricingOptimizer,
    providers::{
        AccuracyProvider, CompetitorPriceProvider, DemandProvider, SimulatedAccuracy,
        SimulatedCompetitors, SimulatedDemand, SimulatedWeather, WeatherProvider,
    },
    store::EngineStore,
};
use std::sync::Arc;

pub struct DecisionEngine {
    pub store: Arc<EngineStore>,
    pub config: Arc<EngineConfig>,
    pub metrics: Arc<EngineMetrics>,
    pub fraud: FraudRiskScorer,
    pub capacity: Arc<CapacityOptimizer>,
    pub pricing: PricingOptimizer,
}

impl DecisionEngine {
    /// Build a fully wired engine with the simulated signal providers.
    pub fn build(
        store: EngineStore,
        config: EngineConfig,
        clock: SharedClock,
    ) -> EngineResult<Self> {
        let seed = config.signal_seed;
        let anchor = config.simulated_anchor_price;
        Self::with_providers(
            store,
            config,
            clock,
            Arc::new(SimulatedWeather::new(seed)),
            Arc::new(SimulatedAccuracy::new(seed)),
            Arc::new(SimulatedDemand::new(seed)),
            Arc::new(SimulatedCompetitors::new(seed, anchor)),
        )
    }

    /// Build with explicit providers (production data sources or test fixtures).
    pub fn with_providers(
        store: EngineStore,
        config: EngineConfig,
        clock: SharedClock,
        weather: Arc<dyn WeatherProvider>,
        accuracy: Arc<dyn AccuracyProvider>,
        demand: Arc<dyn DemandProvider>,
        competitors: Arc<dyn CompetitorPriceProvider>,
    ) -> EngineResult<Self> {
        config.validate()?;

        let store = Arc::new(store);
        let config = Arc::new(config);
        let metrics = Arc::new(EngineMetrics::new());

        let capacity = Arc::new(CapacityOptimizer::new(
            store.clone(),
            config.clone(),
            clock.clone(),
            metrics.clone(),
            weather,
            accuracy,
        ));
        let fraud = FraudRiskScorer::new(
            store.clone(),
            config.clone(),
            clock.clone(),
            metrics.clone(),
        );
        let pricing = PricingOptimizer::new(
            store.clone(),
            config.clone(),
            clock,
            metrics.clone(),
            capacity.clone(),
            demand,
            competitors,
        );

        Ok(Self {
            store,
            config,
            metrics,
            fraud,
            capacity,
            pricing,
        })
    }
}
