//! ABOUTME: Pipeline orchestrator (C10): wires C2-C8 into one per-request state
//! ABOUTME: machine and owns the scoped relational-session-context discipline (§9)

mod pipeline;
mod session_guard;

pub use pipeline::{Pipeline, PipelineRequest, PipelineResponse, PipelineStream, StreamOutcome};
pub use session_guard::SessionContextGuard;
