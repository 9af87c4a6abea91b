//! ABOUTME: Threshold-based alert generation with rolling per-type de-duplication (§4.8)

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use ragcore_adapters::relational_store::RelationalStore;
use ragcore_config::AlertConfig;
use ragcore_core::{Alert, AlertSeverity, Result};
use std::collections::HashMap;
use std::sync::Arc;

const P95_LATENCY_ALERT: &str = "p95_latency_exceeded";
const ERROR_RATE_ALERT: &str = "error_rate_exceeded";
const CACHE_HIT_RATE_ALERT: &str = "cache_hit_rate_degraded";
fn dedup_window() -> Duration {
    Duration::hours(1)
}

/// Snapshot of the metrics an alert rule compares against its threshold.
/// `cache_hit_rate` is reported separately from `RealTimeMetrics`/`DailyMetrics`
/// because the cache layer, not the tracer, is the natural owner of that number.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertInputs {
    pub p95_latency_ms: i64,
    pub error_rate: f64,
    pub cache_hit_rate: f64,
}

/// Compares dashboard metrics against configured thresholds and raises
/// alerts, suppressing repeats of the same alert type within a rolling
/// one-hour window so a sustained breach doesn't spam the alert store.
pub struct AlertGenerator {
    config: AlertConfig,
    last_fired: Mutex<HashMap<&'static str, DateTime<Utc>>>,
    relational_store: Option<Arc<dyn RelationalStore>>,
}

impl AlertGenerator {
    #[must_use]
    pub fn new(config: AlertConfig, relational_store: Option<Arc<dyn RelationalStore>>) -> Self {
        Self { config, last_fired: Mutex::new(HashMap::new()), relational_store }
    }

    /// Evaluates thresholds against `inputs` at time `now`, persists any
    /// newly-raised alerts, and returns them. Returns an empty vec when
    /// every breach is still within its de-duplication window.
    pub async fn check(&self, inputs: AlertInputs, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let mut raised = Vec::new();

        if inputs.p95_latency_ms > self.config.p95_latency_ms && self.should_fire(P95_LATENCY_ALERT, now) {
            raised.push(
                Alert::new(
                    P95_LATENCY_ALERT,
                    AlertSeverity::Warning,
                    format!(
                        "p95 latency {}ms exceeds threshold {}ms",
                        inputs.p95_latency_ms, self.config.p95_latency_ms
                    ),
                )
                .with_metadata("p95_latency_ms", inputs.p95_latency_ms)
                .with_metadata("threshold_ms", self.config.p95_latency_ms),
            );
        }

        if inputs.error_rate > self.config.error_rate && self.should_fire(ERROR_RATE_ALERT, now) {
            raised.push(
                Alert::new(
                    ERROR_RATE_ALERT,
                    AlertSeverity::Error,
                    format!("error rate {:.3} exceeds threshold {:.3}", inputs.error_rate, self.config.error_rate),
                )
                .with_metadata("error_rate", inputs.error_rate)
                .with_metadata("threshold", self.config.error_rate),
            );
        }

        if inputs.cache_hit_rate < self.config.cache_hit_rate && self.should_fire(CACHE_HIT_RATE_ALERT, now) {
            raised.push(
                Alert::new(
                    CACHE_HIT_RATE_ALERT,
                    AlertSeverity::Info,
                    format!(
                        "cache hit rate {:.3} below threshold {:.3}",
                        inputs.cache_hit_rate, self.config.cache_hit_rate
                    ),
                )
                .with_metadata("cache_hit_rate", inputs.cache_hit_rate)
                .with_metadata("threshold", self.config.cache_hit_rate),
            );
        }

        if let Some(store) = &self.relational_store {
            for alert in &raised {
                store.persist_alert(alert.clone()).await?;
            }
        }

        Ok(raised)
    }

    fn should_fire(&self, alert_type: &'static str, now: DateTime<Utc>) -> bool {
        let mut last_fired = self.last_fired.lock();
        let fire = match last_fired.get(alert_type) {
            Some(last) => now - *last >= dedup_window(),
            None => true,
        };
        if fire {
            last_fired.insert(alert_type, now);
        }
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaching_inputs() -> AlertInputs {
        AlertInputs { p95_latency_ms: 9000, error_rate: 0.2, cache_hit_rate: 0.1 }
    }

    #[tokio::test]
    async fn raises_one_alert_per_breached_threshold() {
        let generator = AlertGenerator::new(AlertConfig::default(), None);
        let alerts = generator.check(breaching_inputs(), Utc::now()).await.unwrap();
        assert_eq!(alerts.len(), 3);
    }

    #[tokio::test]
    async fn healthy_inputs_raise_nothing() {
        let generator = AlertGenerator::new(AlertConfig::default(), None);
        let healthy = AlertInputs { p95_latency_ms: 100, error_rate: 0.0, cache_hit_rate: 0.9 };
        let alerts = generator.check(healthy, Utc::now()).await.unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn repeated_breach_within_an_hour_does_not_refire() {
        let generator = AlertGenerator::new(AlertConfig::default(), None);
        let now = Utc::now();
        let first = generator.check(breaching_inputs(), now).await.unwrap();
        assert_eq!(first.len(), 3);

        let second = generator.check(breaching_inputs(), now + Duration::minutes(30)).await.unwrap();
        assert!(second.is_empty());

        let third = generator.check(breaching_inputs(), now + Duration::hours(2)).await.unwrap();
        assert_eq!(third.len(), 3);
    }
}
