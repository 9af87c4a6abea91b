//! ABOUTME: Tracing and observability (C8): span/trace lifecycle, sampling,
//! ABOUTME: background persistence, dashboard aggregation, and threshold alerting

mod aggregation;
mod alerts;
mod hashing;
mod sampling;
mod tracer;

pub use aggregation::{component_latencies, daily_metrics, query_distribution, real_time_metrics, DailyMetrics, RealTimeMetrics};
pub use alerts::{AlertGenerator, AlertInputs};
pub use hashing::hash_user_id;
pub use sampling::should_sample;
pub use tracer::{TraceHandle, Tracer};
