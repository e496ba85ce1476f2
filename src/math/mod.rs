//! # Transcendental Library
//!
//! Elementary functions on [`Value`]s, written as [`Context`] methods.
//!
//! Every function works at the guard precision of the context (working
//! precision plus safety margin) plus a few bits of its own, then rounds once
//! to the working precision. When a series runs out of iterations, when a
//! range reduction cannot make up for cancellation, or when an inverse check
//! fails, the result is still returned and the context's increase precision
//! flag is raised.
//!
//! ```rust
//! use apcalc::Context;
//!
//! let mut ctx = Context::new();
//! ctx.set_initial_precision(96);
//! let x = ctx.value_from_f64(2.0).unwrap();
//! let y = ctx.log_e(&x).unwrap();
//! assert!((ctx.exp(&y).to_f64() - 2.0).abs() < 1e-20);
//! ```

use crate::context::Context;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::store::{Constant, Value, constant};

mod exp_log;
mod gaussian;
mod inverse_trig;
mod pow;
mod trig;

/// Bits every kernel adds on top of the guard precision.
const EXTRA_BITS: u32 = 16;

fn saturating_bits(bits: u64) -> u32 {
    u32::try_from(bits).unwrap_or(u32::MAX)
}

/// Whether `term` is too small to change `sum` at `precision` bits.
fn negligible(term: &Float, sum: &Float, precision: u32) -> bool {
    match (term.top_exponent(), sum.top_exponent()) {
        (None, _) => term.is_zero(),
        (Some(_), None) => false,
        (Some(term), Some(sum)) => term < sum - i64::from(precision) - 2,
    }
}

fn iteration_limit(precision: u32) -> usize {
    4 * precision as usize + 64
}

/// Sums `term(0) + term(1) + ...` at `precision` bits up to the first
/// negligible term. The flag is `false` when the iteration bound came first.
fn series(precision: u32, mut term: impl FnMut(usize) -> Float) -> (Float, bool) {
    let mut sum = term(0).with_precision(precision);
    for k in 1..iteration_limit(precision) {
        let next = term(k);
        if negligible(&next, &sum, precision) {
            return (sum, true);
        }
        sum = sum.add_to(&next, precision);
    }
    (sum, false)
}

/// The finite float behind `x`, or a domain error naming `operation`.
fn finite<'a>(operation: &'static str, x: &'a Value) -> Result<&'a Float> {
    if x.is_infinity() {
        return Err(Error::domain(operation, "infinite argument"));
    }
    Ok(x.float())
}

impl Context {
    /// Precision the kernels evaluate at.
    fn working_bits(&self) -> u32 {
        self.guard_precision().saturating_add(EXTRA_BITS)
    }

    /// `which` with at least `bits` bits. Requests are rounded up to a multiple
    /// of 32 so nearby precisions share a cache entry.
    fn wide_constant(&self, which: Constant, bits: u64) -> Value {
        constant(which, saturating_bits(bits.div_ceil(32) * 32), self.safety_margin())
    }

    /// Rounds a kernel result to the working precision.
    fn finish(&self, result: Float) -> Value {
        Value::new(result.with_precision(self.precision()))
    }

    fn check_convergence(&mut self, operation: &'static str, converged: bool) {
        if !converged {
            self.flag(operation, "series did not converge");
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;
    use crate::store::{cached_count, live_count, verify_accounting};

    pub const LOW_PRECISION: u32 = 256;
    pub const HIGH_PRECISION: u32 = 512;
    const MARGIN: u32 = 128;
    const MAX_ERROR: f64 = 1e-6;

    /// Random arguments drawn per function by the consistency tests.
    pub const N_ARGUMENTS: usize = 48;

    /// Random arguments checked against the `f64` functions.
    pub const N_REFERENCE_ARGUMENTS: usize = 1000;

    pub fn context(precision: u32) -> Context {
        let mut ctx = Context::new();
        ctx.set_initial_precision(precision);
        ctx.set_safety_margin(MARGIN);
        ctx
    }

    /// Uniform in `(0, 1]`.
    pub fn unit(rng: &mut impl Rng) -> f64 {
        1.0 - rng.random::<f64>()
    }

    pub fn signed(rng: &mut impl Rng, value: f64) -> f64 {
        if rng.random_bool(0.5) { -value } else { value }
    }

    /// `10^u` with `u` uniform in `[-50, 3)`.
    pub fn reference_magnitude(rng: &mut impl Rng) -> f64 {
        10f64.powf(rng.random_range(-50.0..3.0))
    }

    /// Error against a double reference: relative above one, absolute below.
    #[track_caller]
    pub fn assert_close(message: &str, value: f64, reference: f64) {
        let error = (value - reference).abs() / reference.abs().max(1.0);
        assert!(
            error < MAX_ERROR,
            "{message}: {value:e} vs {reference:e} (error {error:e})"
        );
    }

    /// Evaluates `function` at `x` in a 256 and a 512 bit context and checks
    /// that both results agree, and that no value handle leaked.
    #[track_caller]
    pub fn assert_consistent(
        name: &str,
        function: impl Fn(&mut Context, &Value) -> Result<Value>,
        x: f64,
    ) {
        let owned = live_count() - cached_count();
        {
            let mut low = context(LOW_PRECISION);
            let mut high = context(HIGH_PRECISION);
            let x_low = low.value_from_f64(x).unwrap();
            let x_high = high.value_from_f64(x).unwrap();
            match (function(&mut low, &x_low), function(&mut high, &x_high)) {
                (Err(_), Err(_)) => {}
                (Ok(a), Ok(b)) => assert_agree(&format!("{name}({x:e})"), &a, &b),
                (a, b) => panic!("{name}({x:e}): {a:?} vs {b:?}"),
            }
        }
        verify_accounting(owned).unwrap();
    }

    /// Relative error for results above one, absolute error below, and at
    /// least a fifth of the low precision in agreeing bits.
    #[track_caller]
    pub fn assert_agree(message: &str, a: &Value, b: &Value) {
        if a.is_infinity() || b.is_infinity() {
            assert_eq!(a, b, "{message}");
            return;
        }
        let diff = a.add_to(&-b.float(), 2 * HIGH_PRECISION);
        let Some(diff_top) = diff.top_exponent() else {
            return;
        };
        let scale = a.float().abs().max(b.float().abs());
        let scale_top = scale.top_exponent().unwrap_or(1).max(1);
        let agreed = scale_top - diff_top;
        assert!(
            agreed > i64::from(LOW_PRECISION) / 5,
            "{message}: only {agreed} bits agree ({a:?} vs {b:?})"
        );

        let unit = Float::one(64);
        let denominator = if scale > 1.0 { &scale } else { &unit };
        let error = diff.div_to(denominator, 64).to_f64().abs();
        assert!(error < MAX_ERROR, "{message}: error {error:e}");
    }

    #[test]
    fn test_negligible_terms() {
        let sum = Float::one(64);
        assert!(negligible(&Float::zero(64), &sum, 64));
        assert!(negligible(&Float::new(1.into(), -70, 64), &sum, 64));
        assert!(!negligible(&Float::new(1.into(), -60, 64), &sum, 64));
        assert!(!negligible(&sum, &Float::zero(64), 64));
    }

    #[test]
    fn test_series_reports_exhaustion() {
        // Geometric series with ratio 1/2 converges, a constant one does not.
        let mut term = Float::one(64);
        let (sum, converged) = series(64, |k| {
            if k > 0 {
                term = term.mul_2exp(-1);
            }
            term.clone()
        });
        assert!(converged);
        assert_eq!(sum, 2.0);

        let (_, converged) = series(8, |_| Float::one(8));
        assert!(!converged);
    }

    #[test]
    fn test_wide_constant_rounds_precision_up() {
        let ctx = Context::new();
        let pi = ctx.wide_constant(Constant::Pi, 70);
        assert_eq!(pi.precision(), 96);
        assert!(ctx.wide_constant(Constant::Pi, 90).ptr_eq(&pi));
    }
}
