//! Injectable signal providers for external predictive inputs.
//!
//! Weather, historical demand, competitor prices and the forecast-accuracy
//! adjustment are not owned by this engine; production deployments plug a
//! real data source in behind these traits. The shipped `Simulated*`
//! implementations stand in for them with deterministic, id-seeded values,
//! so every analysis stays reproducible. The accuracy adjustment in
//! particular is a placeholder until a real forecast-scoring source exists.

use crate::rng::SignalRng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherKind {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
}

impl WeatherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
            Self::Stormy => "stormy",
        }
    }

    pub fn is_bad(&self) -> bool {
        matches!(self, Self::Rainy | Self::Stormy)
    }
}

pub trait WeatherProvider: Send + Sync {
    fn forecast(&self, event_id: &str, event_date: DateTime<Utc>) -> WeatherKind;
}

pub trait DemandProvider: Send + Sync {
    /// Historical demand as a direct price multiplier, roughly [0.8, 1.3].
    fn demand_multiplier(&self, event_id: &str) -> f64;
}

pub trait CompetitorPriceProvider: Send + Sync {
    /// Competitor ticket prices for comparable events. May be empty.
    fn competitor_prices(&self, event_id: &str) -> Vec<f64>;
}

pub trait AccuracyProvider: Send + Sync {
    /// How well past forecasts matched reality, as a multiplier around 1.0.
    fn accuracy_adjustment(&self, event_id: &str) -> f64;
}

// ── Simulated implementations ────────────────────────────────────────────────

pub struct SimulatedWeather {
    seed: u64,
}

impl SimulatedWeather {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl WeatherProvider for SimulatedWeather {
    fn forecast(&self, event_id: &str, event_date: DateTime<Utc>) -> WeatherKind {
        let key = format!("weather:{event_id}:{}", event_date.date_naive());
        let mut rng = SignalRng::for_key(self.seed, &key);
        // Skewed towards decent weather; storms are rare.
        let roll = rng.next_f64();
        if roll < 0.45 {
            WeatherKind::Sunny
        } else if roll < 0.75 {
            WeatherKind::Cloudy
        } else if roll < 0.95 {
            WeatherKind::Rainy
        } else {
            WeatherKind::Stormy
        }
    }
}

pub struct SimulatedDemand {
    seed: u64,
}

impl SimulatedDemand {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl DemandProvider for SimulatedDemand {
    fn demand_multiplier(&self, event_id: &str) -> f64 {
        let mut rng = SignalRng::for_key(self.seed, &format!("demand:{event_id}"));
        rng.in_range(0.8, 1.3)
    }
}

pub struct SimulatedCompetitors {
    seed: u64,
    /// Reference price the simulated market clusters around.
    pub anchor_price: f64,
}

impl SimulatedCompetitors {
    pub fn new(seed: u64, anchor_price: f64) -> Self {
        Self { seed, anchor_price }
    }
}

impl CompetitorPriceProvider for SimulatedCompetitors {
    fn competitor_prices(&self, event_id: &str) -> Vec<f64> {
        let mut rng = SignalRng::for_key(self.seed, &format!("competitors:{event_id}"));
        let count = 2 + (rng.next_f64() * 3.0) as usize;
        (0..count)
            .map(|_| self.anchor_price * rng.in_range(0.85, 1.35))
            .collect()
    }
}

pub struct SimulatedAccuracy {
    seed: u64,
}

impl SimulatedAccuracy {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl AccuracyProvider for SimulatedAccuracy {
    fn accuracy_adjustment(&self, event_id: &str) -> f64 {
        let mut rng = SignalRng::for_key(self.seed, &format!("accuracy:{event_id}"));
        rng.in_range(0.9, 1.1)
    }
}

// ── Fixed implementations (tests and pinned deployments) ─────────────────────

pub struct FixedWeather(pub WeatherKind);

impl WeatherProvider for FixedWeather {
    fn forecast(&self, _event_id: &str, _event_date: DateTime<Utc>) -> WeatherKind {
        self.0
    }
}

pub struct FixedDemand(pub f64);

impl DemandProvider for FixedDemand {
    fn demand_multiplier(&self, _event_id: &str) -> f64 {
        self.0
    }
}

pub struct FixedCompetitors(pub Vec<f64>);

impl CompetitorPriceProvider for FixedCompetitors {
    fn competitor_prices(&self, _event_id: &str) -> Vec<f64> {
        self.0.clone()
    }
}

pub struct FixedAccuracy(pub f64);

impl AccuracyProvider for FixedAccuracy {
    fn accuracy_adjustment(&self, _event_id: &str) -> f64 {
        self.0
    }
}
