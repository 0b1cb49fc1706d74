//! Instrumentation sink: per-analyzer call counters and durations.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug, Default, Clone, Serialize)]
pub struct AnalyzerStats {
    pub calls: u64,
    pub failures: u64,
    pub total_duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub analyzers: HashMap<String, AnalyzerStats>,
    pub critical_alerts: u64,
}

#[derive(Default)]
pub struct EngineMetrics {
    analyzers: RwLock<HashMap<&'static str, AnalyzerStats>>,
    critical_alerts: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one analyzer invocation.
    pub fn observe(&self, analyzer: &'static str, started: Instant, succeeded: bool) {
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let mut analyzers = self.analyzers.write();
        let stats = analyzers.entry(analyzer).or_default();
        stats.calls += 1;
        if !succeeded {
            stats.failures += 1;
        }
        stats.total_duration_ms += elapsed_ms;
    }

    pub fn record_critical_alert(&self) {
        self.critical_alerts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let analyzers = self
            .analyzers
            .read()
            .iter()
            .map(|(name, stats)| (name.to_string(), stats.clone()))
            .collect();
        MetricsSnapshot {
            analyzers,
            critical_alerts: self.critical_alerts.load(Ordering::Relaxed),
        }
    }
}
