//! Normal deviates by the Box-Muller transform.

use crate::context::Context;
use crate::float::Float;
use crate::random::RandomSource;
use crate::store::{Constant, Value};

/// Uniform draws carry at least this many bits.
const MIN_DRAW_BITS: u32 = 64;

impl Context {
    /// Draws `mean + sigma * sqrt(-2 ln(1 - u1)) * cos(2 pi u2)` from two
    /// uniform values of the standard generator.
    ///
    /// Sampling counts as statistics for [`crate::CheckPrecisionMode`].
    pub fn gaussian_random(&mut self, mean: &Value, sigma: &Value) -> Value {
        let w = self.guard_precision().max(MIN_DRAW_BITS);
        let generator = self.standard_generator_mut();
        let u1 = generator.random_float(w);
        let u2 = generator.random_float(w);

        let complement = Float::one(w).add_to(&-u1, w);
        let log = self.ln_float(&complement, w);
        if self.should_check(true) {
            self.verify_log("gaussian_random", &complement, &log, w);
        }
        let radius = (-log).mul_2exp(1).sqrt_magnitude();

        let pi = self.wide_constant(Constant::Pi, u64::from(w));
        let angle = pi.float().mul_to(&u2, w).mul_2exp(1);
        let cosine = self.cos_float(&angle, w);

        let deviation = sigma.mul_to(&radius.mul_to(&cosine, w), w);
        Value::new(mean.add_to(&deviation, self.precision()))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::SQRT_2;

    use rstest::rstest;

    use super::*;
    use crate::context::CheckPrecisionMode;
    use crate::random::{Generator, Mode};
    use crate::store::{cached_count, live_count, verify_accounting};
    use crate::tests::*;

    const TOLERANCE: f64 = 0.01;

    fn normal_cdf(x: f64, mean: f64, variance: f64) -> f64 {
        0.5 * (1.0 + erf((x - mean) / (variance.sqrt() * SQRT_2)))
    }

    #[rstest]
    #[case(0.0, 1.0)]
    #[case(0.0, 0.1)]
    #[case(1.0, 1.0)]
    #[case(1.1234, 0.2213)]
    #[case(5342.1, 121.01)]
    fn test_empirical_distribution(
        n_experiments: usize,
        #[case] mean: f64,
        #[case] variance: f64,
    ) {
        let mut ctx = Context::new();
        let owned = live_count() - cached_count();
        let mu = ctx.value_from_f64(mean).unwrap();
        let sigma = ctx.value_from_f64(variance).unwrap().sqrt().unwrap();

        let mut samples: Vec<f64> = (0..n_experiments)
            .map(|_| ctx.gaussian_random(&mu, &sigma).to_f64())
            .collect();
        samples.sort_by(f64::total_cmp);

        let n = n_experiments as f64;
        for (i, &x) in samples.iter().enumerate() {
            let cdf = normal_cdf(x, mean, variance);
            assert!(
                cdf >= i as f64 / n - TOLERANCE && cdf <= (i + 1) as f64 / n + TOLERANCE,
                "sample {i} of N({mean}, {variance}) at {x}: cdf {cdf}"
            );
        }
        assert!(!ctx.is_increase_precision_recommended());

        drop((mu, sigma));
        verify_accounting(owned).unwrap();
    }

    #[test]
    fn test_draws_are_reproducible() {
        let mut a = Context::new();
        let mut b = Context::new();
        b.set_standard_generator(Generator::standard(0, Mode::Precise));
        let (mean, sigma) = (a.zero(), a.one());
        for _ in 0..100 {
            assert_eq!(a.gaussian_random(&mean, &sigma), b.gaussian_random(&mean, &sigma));
        }

        a.standard_generator_mut().set_seed(42);
        let first = a.gaussian_random(&mean, &sigma);
        a.standard_generator_mut().set_seed(42);
        assert_eq!(a.gaussian_random(&mean, &sigma), first);
    }

    #[test]
    fn test_zero_sigma_returns_mean() {
        let mut ctx = Context::new();
        ctx.set_check_precision_mode(CheckPrecisionMode::Always);
        let mean = ctx.value_from_f64(2.5).unwrap();
        let sigma = ctx.zero();
        for _ in 0..10 {
            assert_eq!(ctx.gaussian_random(&mean, &sigma), 2.5);
        }
        assert!(!ctx.is_increase_precision_recommended());
    }
}
