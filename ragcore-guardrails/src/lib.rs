//! ABOUTME: Input validation/sanitization (C3) and output groundedness/citation/redaction
//! ABOUTME: checks (C7), both pure-config-driven with no adapter dependencies

mod patterns;
mod rate_limit;

pub mod input;
pub mod output;

pub use input::{InputGuardrails, InputValidation};
pub use output::{compute_groundedness, OutputGuardrails, OutputValidation};
