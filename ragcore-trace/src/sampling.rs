//! ABOUTME: Bernoulli sampling decision for trace collection

use rand::Rng;

/// Decides whether a trace should be collected at the given sample rate.
///
/// `rate <= 0.0` always skips, `rate >= 1.0` always samples; values in
/// between are a Bernoulli draw so the long-run sampled fraction converges
/// on `rate`.
#[must_use]
pub fn should_sample(rate: f64) -> bool {
    if rate <= 0.0 {
        return false;
    }
    if rate >= 1.0 {
        return true;
    }
    rand::thread_rng().gen_bool(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_samples() {
        for _ in 0..50 {
            assert!(!should_sample(0.0));
        }
    }

    #[test]
    fn full_rate_always_samples() {
        for _ in 0..50 {
            assert!(should_sample(1.0));
        }
    }

    #[test]
    fn negative_rate_is_treated_as_zero() {
        assert!(!should_sample(-0.5));
    }

    #[test]
    fn rate_above_one_is_treated_as_one() {
        assert!(should_sample(1.5));
    }
}
