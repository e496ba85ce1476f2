//! Exponential and logarithms.
//!
//! `exp x = 2^n exp(r)^(2^8)` with `x = n ln2 + 2^8 r`, and
//! `ln x = k ln2 + 2 atanh((m - 1) / (m + 1))` with `x = m 2^k` and
//! `m` in `[sqrt(1/2), sqrt(2))`.

use std::f64::consts::FRAC_1_SQRT_2;

use num_bigint::BigInt;
use num_traits::{One, ToPrimitive};
use tracing::warn;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::math::{saturating_bits, series};
use crate::store::{Constant, Value};

const SQUARINGS: i64 = 8;

/// Arguments with a larger top exponent overflow or underflow the exponent range.
const EXP_TOP_LIMIT: i64 = 60;

impl Context {
    /// `exp(+inf) = +inf`, `exp(-inf) = 0`. Results beyond the exponent range
    /// become `+inf` or zero.
    pub fn exp(&mut self, x: &Value) -> Value {
        if x.is_zero() {
            return self.one();
        }
        if x.is_infinity() {
            return if x.is_negative() {
                self.zero()
            } else {
                self.plus_infinity()
            };
        }
        let w = self.working_bits();
        let result = self.exp_float(x, w);
        self.finish(result)
    }

    /// Natural logarithm, checked against `exp(log x) = x` unless disabled by
    /// the check precision mode.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] for `x <= 0`.
    pub fn log_e(&mut self, x: &Value) -> Result<Value> {
        if !x.is_positive() {
            return Err(Error::domain("log_e", "argument must be positive"));
        }
        if x.is_infinity() {
            return Ok(self.plus_infinity());
        }
        if *x == 1.0 {
            return Ok(self.zero());
        }
        let w = self.working_bits();
        let log = self.ln_float(x, w);
        if self.should_check(false) {
            self.verify_log("log_e", x, &log, w);
        }
        Ok(self.finish(log))
    }

    /// Fast double approximation of `log2 x`.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] for `x <= 0`.
    pub fn log2_f64(&self, x: &Value) -> Result<f64> {
        if !x.is_positive() {
            return Err(Error::domain("log2_f64", "argument must be positive"));
        }
        let Some(top) = x.top_exponent() else {
            return Ok(f64::INFINITY);
        };
        let mut k = top;
        let mut m = x.float().mul_2exp(-top).to_f64();
        if m < FRAC_1_SQRT_2 {
            m *= 2.0;
            k -= 1;
        }
        Ok(k as f64 + m.log2())
    }

    pub(super) fn exp_float(&mut self, x: &Float, w: u32) -> Float {
        let top = match x.top_exponent() {
            None if x.is_zero() => return Float::one(w),
            None => return overflow(x.is_negative(), w),
            Some(top) if top > EXP_TOP_LIMIT => return overflow(x.is_negative(), w),
            Some(top) => top.max(0) as u64,
        };

        let ln2 = self.wide_constant(Constant::Ln2, u64::from(w) + top + 8);
        let ln2 = ln2.float();
        let Some(n) = x
            .div_to(ln2, saturating_bits(top + 16))
            .round_to_integer()
            .and_then(|n| n.to_i64())
        else {
            return overflow(x.is_negative(), w);
        };
        let multiple = ln2.mul_to(&Float::from_i64(n, 64), ln2.precision().saturating_add(64));
        let r = x.add_to(&-multiple, w).mul_2exp(-SQUARINGS);

        let mut term = Float::one(w);
        let (sum, converged) = series(w, |k| {
            if k > 0 {
                term = term.mul_to(&r, w).div_to(&Float::from_u64(k as u64, 64), w);
            }
            term.clone()
        });
        self.check_convergence("exp", converged);

        let mut result = sum;
        for _ in 0..SQUARINGS {
            result = result.mul_to(&result, w);
        }
        result.mul_2exp(n)
    }

    /// Natural logarithm of a positive finite `x` at `w` bits.
    pub(super) fn ln_float(&mut self, x: &Float, w: u32) -> Float {
        let Some(top) = x.top_exponent() else {
            return Float::zero(w);
        };
        if *x == 1.0 {
            return Float::zero(w);
        }

        let mut m = x.mul_2exp(-top);
        let mut k = top;
        let half = Float::new(BigInt::one(), -1, 2);
        if m.mul_to(&m, m.precision().saturating_mul(2).saturating_add(2)) < half {
            m = m.mul_2exp(1);
            k -= 1;
        }

        let one = Float::one(w);
        let t = m.add_to(&-&one, w).div_to(&m.add_to(&one, w), w);
        let square = t.mul_to(&t, w);
        let mut power = t;
        let (sum, converged) = series(w, |j| {
            if j > 0 {
                power = power.mul_to(&square, w);
            }
            power.div_to(&Float::from_u64(2 * j as u64 + 1, 64), w)
        });
        self.check_convergence("log_e", converged);

        let mut log = sum.mul_2exp(1);
        if k != 0 {
            let k_bits = 64 - k.unsigned_abs().leading_zeros();
            let ln2 = self.wide_constant(Constant::Ln2, u64::from(w) + u64::from(k_bits) + 8);
            let ln2 = ln2.float();
            let scaled = ln2.mul_to(&Float::from_i64(k, 64), ln2.precision().saturating_add(64));
            log = scaled.add_to(&log, w);
        }
        log
    }

    /// Raises the flag when `exp(log)` misses `x` in the working precision.
    pub(super) fn verify_log(&mut self, operation: &'static str, x: &Float, log: &Float, w: u32) {
        let back = self.exp_float(log, w);
        let diff = back.add_to(&-x, w);
        let required = i64::from(self.precision()) + 2;
        let agrees = match (diff.top_exponent(), x.top_exponent()) {
            (None, _) => diff.is_zero(),
            (Some(diff), Some(top)) => diff <= top - required,
            (Some(_), None) => false,
        };
        if !agrees {
            self.flag(operation, "exp(log x) does not reproduce x");
        }
    }
}

fn overflow(negative: bool, w: u32) -> Float {
    if negative {
        Float::zero(w)
    } else {
        warn!("exp overflows the exponent range, returning infinity");
        Float::pos_infinity(w)
    }
}
