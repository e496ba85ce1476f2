//! Integer and real powers.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::store::Value;

/// Result exponents beyond this bound go through `exp(n ln|b|)` instead of
/// repeated squaring.
const SQUARING_EXPONENT_LIMIT: i128 = 1 << 60;

impl Context {
    /// `base^n` by repeated squaring, carrying `bits(n)` extra guard bits.
    ///
    /// `0^0 = 1` and `inf^0 = 1`; infinite bases follow sign and parity.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] for a zero base with a negative exponent.
    pub fn pow_int(&mut self, base: &Value, n: i64) -> Result<Value> {
        if n == 0 {
            return Ok(self.one());
        }
        let negative = base.is_negative() && n % 2 != 0;
        if base.is_zero() {
            if n < 0 {
                return Err(Error::domain("pow_int", "zero base with a negative exponent"));
            }
            return Ok(self.zero());
        }
        if base.is_infinity() {
            return Ok(match (n < 0, negative) {
                (true, _) => self.zero(),
                (false, true) => self.minus_infinity(),
                (false, false) => self.plus_infinity(),
            });
        }
        if base.float().abs() == 1.0 {
            return Ok(if negative { -self.one() } else { self.one() });
        }

        let top = base.top_exponent().unwrap_or(0);
        let scale = i128::from(top.abs().max((top - 1).abs())) * i128::from(n.unsigned_abs());
        if scale > SQUARING_EXPONENT_LIMIT {
            let magnitude = self.pow_magnitude(&base.float().abs(), &Float::from_i64(n, 64));
            return Ok(self.finish(if negative { -magnitude } else { magnitude }));
        }

        let n_bits = 64 - n.unsigned_abs().leading_zeros();
        let w = self.working_bits().saturating_add(n_bits + 8);
        let mut result = Float::one(w);
        let mut square = base.float().with_precision(w);
        let mut remaining = n.unsigned_abs();
        while remaining != 0 {
            if remaining & 1 == 1 {
                result = result.mul_to(&square, w);
            }
            remaining >>= 1;
            if remaining != 0 {
                square = square.mul_to(&square, w);
            }
        }
        if n < 0 {
            result = result.recip();
        }
        Ok(self.finish(result))
    }

    /// `base^exponent` as `exp(exponent ln|base|)`.
    ///
    /// Integral exponents that fit an `i64` go through [`Context::pow_int`].
    /// A negative base needs an integral exponent; the parity gives the sign.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] for a negative base with a non-integral exponent and
    /// for a zero base with a negative exponent.
    pub fn pow(&mut self, base: &Value, exponent: &Value) -> Result<Value> {
        if exponent.is_zero() {
            return Ok(self.one());
        }
        if let Some(n) = exponent.to_i64() {
            return self.pow_int(base, n);
        }

        let negative = if base.is_negative() {
            if !exponent.is_integer() {
                return Err(Error::domain("pow", "negative base with a non-integral exponent"));
            }
            // Canonical mantissas are odd, so an odd integer has exponent zero.
            exponent.exponent() == Some(0)
        } else {
            false
        };
        if base.is_zero() {
            if exponent.is_negative() {
                return Err(Error::domain("pow", "zero base with a negative exponent"));
            }
            return Ok(self.zero());
        }

        let magnitude = base.float().abs();
        if magnitude == 1.0 {
            return Ok(if negative { -self.one() } else { self.one() });
        }
        if base.is_infinity() || exponent.is_infinity() {
            let grows = (magnitude > 1.0) == exponent.is_positive();
            return Ok(match (grows, negative) {
                (false, _) => self.zero(),
                (true, true) => self.minus_infinity(),
                (true, false) => self.plus_infinity(),
            });
        }

        let result = self.pow_magnitude(&magnitude, exponent);
        Ok(self.finish(if negative { -result } else { result }))
    }

    /// `magnitude^exponent` for a positive finite magnitude other than one.
    fn pow_magnitude(&mut self, magnitude: &Float, exponent: &Float) -> Float {
        let w = self.working_bits();
        let exponent_top = exponent.top_exponent().unwrap_or(0).max(0) as u64;
        // ln|b| is about top(b) ln 2, so its integer part needs that many bits.
        let log_top = 64 - magnitude.top_exponent().unwrap_or(0).unsigned_abs().leading_zeros();
        let log_bits = u64::from(w) + exponent_top + u64::from(log_top) + 16;
        let log_bits = u32::try_from(log_bits).unwrap_or(u32::MAX);

        let log = self.ln_float(magnitude, log_bits);
        let product = log.mul_to(exponent, log_bits);
        self.exp_float(&product, w)
    }
}
