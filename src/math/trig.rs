//! Sine, cosine and tangent.
//!
//! Arguments are reduced to `r = x - k pi/2` with `|r|` about `pi/4`, using a
//! pi wide enough to cover the integer part of `x`. When `r` lost more leading
//! bits than that budget allowed, the reduction is repeated with a wider pi.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::math::{finite, saturating_bits, series};
use crate::store::{Constant, Value};

const REDUCTION_ATTEMPTS: usize = 4;

impl Context {
    /// # Errors
    ///
    /// [`Error::Domain`] for infinite arguments.
    pub fn sin(&mut self, x: &Value) -> Result<Value> {
        let x = finite("sin", x)?;
        let w = self.working_bits();
        let sin = self.sin_float(x, w);
        Ok(self.finish(sin))
    }

    /// # Errors
    ///
    /// [`Error::Domain`] for infinite arguments.
    pub fn cos(&mut self, x: &Value) -> Result<Value> {
        let x = finite("cos", x)?;
        let w = self.working_bits();
        let cos = self.cos_float(x, w);
        Ok(self.finish(cos))
    }

    /// Tangent of `x`. Arguments close to a pole give large finite values.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] for infinite arguments, and when the reduced cosine
    /// is exactly zero. The latter also raises the increase precision flag.
    pub fn tan(&mut self, x: &Value) -> Result<Value> {
        let x = finite("tan", x)?;
        let w = self.working_bits();
        let (r, quadrant) = self.reduce_half_pi("tan", x, w);
        let sin = self.sin_series(&r, w);
        let cos = self.cos_series(&r, w);
        let (numerator, denominator) = if quadrant % 2 == 1 {
            (-cos, sin)
        } else {
            (sin, cos)
        };
        if denominator.is_zero() {
            self.flag("tan", "argument reduced onto a pole");
            return Err(Error::domain("tan", "pole of the tangent"));
        }
        Ok(self.finish(numerator.div_to(&denominator, w)))
    }

    pub(super) fn sin_float(&mut self, x: &Float, w: u32) -> Float {
        let (r, quadrant) = self.reduce_half_pi("sin", x, w);
        match quadrant {
            0 => self.sin_series(&r, w),
            1 => self.cos_series(&r, w),
            2 => -self.sin_series(&r, w),
            _ => -self.cos_series(&r, w),
        }
    }

    pub(super) fn cos_float(&mut self, x: &Float, w: u32) -> Float {
        let (r, quadrant) = self.reduce_half_pi("cos", x, w);
        match quadrant {
            0 => self.cos_series(&r, w),
            1 => -self.sin_series(&r, w),
            2 => -self.cos_series(&r, w),
            _ => self.sin_series(&r, w),
        }
    }

    /// Returns `r` at `w` bits and `k mod 4` such that `x = r + k pi/2`.
    fn reduce_half_pi(&mut self, operation: &'static str, x: &Float, w: u32) -> (Float, u8) {
        let top = match x.top_exponent() {
            Some(top) if top >= 0 => top as u64,
            _ => return (x.with_precision(w), 0),
        };

        let mut extra = 8u64;
        let mut best = (x.with_precision(w), 0);
        for _ in 0..REDUCTION_ATTEMPTS {
            let pi = self.wide_constant(Constant::Pi, u64::from(w) + top + extra);
            let half_pi = pi.float().mul_2exp(-1);
            let Some(k) = x.div_to(&half_pi, saturating_bits(top + 16)).round_to_integer() else {
                break;
            };

            let k_bits = saturating_bits(k.bits());
            let multiple = half_pi.mul_to(
                &Float::from_bigint(k.clone(), k_bits),
                half_pi.precision().saturating_add(k_bits),
            );
            let r = x.add_to(&-multiple, w);
            let quadrant = (&k & &BigInt::from(3)).to_u8().unwrap_or(0);

            // The error of k * pi/2 sits about top + 1 bits below the precision of pi.
            let available = r
                .top_exponent()
                .map_or(0, |t| i64::from(half_pi.precision()) - top as i64 - 1 + t);
            if available >= i64::from(w) {
                return (r, quadrant);
            }
            extra += (i64::from(w) - available).unsigned_abs() + 16;
            best = (r, quadrant);
        }
        self.flag(operation, "argument reduction lost too many bits");
        best
    }

    fn sin_series(&mut self, r: &Float, w: u32) -> Float {
        let square = r.mul_to(r, w);
        let mut term = r.with_precision(w);
        let (sum, converged) = series(w, |k| {
            if k > 0 {
                let divisor = Float::from_u64((2 * k * (2 * k + 1)) as u64, 64);
                term = -term.mul_to(&square, w).div_to(&divisor, w);
            }
            term.clone()
        });
        self.check_convergence("sin", converged);
        sum
    }

    fn cos_series(&mut self, r: &Float, w: u32) -> Float {
        let square = r.mul_to(r, w);
        let mut term = Float::one(w);
        let (sum, converged) = series(w, |k| {
            if k > 0 {
                let divisor = Float::from_u64(((2 * k - 1) * (2 * k)) as u64, 64);
                term = -term.mul_to(&square, w).div_to(&divisor, w);
            }
            term.clone()
        });
        self.check_convergence("cos", converged);
        sum
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use rand::Rng;
    use rstest::rstest;

    use super::*;
    use crate::math::tests::*;
    use crate::tests::*;

    fn trig_argument(rng: &mut impl Rng) -> f64 {
        let v = unit(rng);
        let v = if rng.random_bool(0.25) { 1.0 / v } else { v };
        signed(rng, v)
    }

    #[rstest]
    #[case(PI)]
    #[case(1e-50)]
    #[case(FRAC_PI_2)]
    #[case(0.0)]
    #[case(-3.5)]
    #[case(100.25)]
    #[case(FRAC_PI_2 - 1e-11)]
    fn test_matches_f64(#[case] x: f64) {
        let mut ctx = context(128);
        let value = ctx.value_from_f64(x).unwrap();
        assert_almost_eq(ctx.sin(&value).unwrap().to_f64(), x.sin(), "sin");
        assert_almost_eq(ctx.cos(&value).unwrap().to_f64(), x.cos(), "cos");
        assert_almost_eq(ctx.tan(&value).unwrap().to_f64(), x.tan(), "tan");
    }

    #[test]
    fn test_sin_of_zero_is_exact() {
        let mut ctx = Context::new();
        let zero = ctx.zero();
        assert!(ctx.sin(&zero).unwrap().is_zero());
        assert_eq!(ctx.cos(&zero).unwrap(), 1.0);
        assert!(ctx.tan(&zero).unwrap().is_zero());
    }

    #[test]
    fn test_huge_argument_is_reduced() {
        let mut ctx = context(128);
        let x = ctx.value_from_f64(1e22).unwrap();
        let result = ctx.checked(|ctx| ctx.sin(&x).unwrap());
        assert!(!result.increase_precision_recommended);
        assert_almost_eq(result.value.to_f64(), -0.852_200_849_767_188_8, "sin(1e22)");
    }

    #[test]
    fn test_reduction_near_multiple_of_half_pi() {
        let mut ctx = context(64);
        let x = ctx.value_from_f64(FRAC_PI_2 - 1e-11).unwrap();
        let result = ctx.checked(|ctx| ctx.tan(&x).unwrap());
        assert!(!result.increase_precision_recommended);
        assert!(result.value > 9.9e10 && result.value < 1.01e11);
    }

    #[test]
    fn test_infinite_argument_is_rejected() {
        let mut ctx = Context::new();
        let inf = ctx.plus_infinity();
        assert!(matches!(ctx.sin(&inf), Err(Error::Domain { .. })));
        assert!(matches!(ctx.cos(&-&inf), Err(Error::Domain { .. })));
        assert!(matches!(ctx.tan(&inf), Err(Error::Domain { .. })));
    }

    #[rstest]
    fn test_random_arguments_match_f64(mut rng: impl Rng) {
        let mut ctx = context(64);
        let mut arguments: Vec<f64> = (0..N_REFERENCE_ARGUMENTS)
            .map(|_| {
                let v = reference_magnitude(&mut rng);
                signed(&mut rng, v)
            })
            .collect();
        arguments.extend([1e-50, -1e-50, 3.7e-50, FRAC_PI_2 - 1e-11]);

        for x in arguments {
            let value = ctx.value_from_f64(x).unwrap();
            assert_close(&format!("sin({x:e})"), ctx.sin(&value).unwrap().to_f64(), x.sin());
            assert_close(&format!("cos({x:e})"), ctx.cos(&value).unwrap().to_f64(), x.cos());
            assert_close(&format!("tan({x:e})"), ctx.tan(&value).unwrap().to_f64(), x.tan());
        }
        assert!(!ctx.is_increase_precision_recommended());
    }

    #[rstest]
    fn test_pythagorean_identity(mut rng: impl Rng) {
        let mut ctx = context(160);
        for _ in 0..N_ARGUMENTS {
            let x = ctx.value_from_f64(trig_argument(&mut rng) * 10.0).unwrap();
            let sin = ctx.sin(&x).unwrap();
            let cos = ctx.cos(&x).unwrap();
            let one = &sin * &sin + &cos * &cos;
            assert_almost_eq(one.to_f64(), 1.0, "sin^2 + cos^2");
        }
    }

    #[rstest]
    fn test_precision_consistency(mut rng: impl Rng) {
        for _ in 0..N_ARGUMENTS {
            let x = trig_argument(&mut rng);
            assert_consistent("sin", Context::sin, x);
            assert_consistent("cos", Context::cos, x);
            assert_consistent("tan", Context::tan, x);
        }
        for x in [PI, 1e-50, FRAC_PI_2, 0.0, FRAC_PI_2 - 1e-11] {
            assert_consistent("sin", Context::sin, x);
            assert_consistent("tan", Context::tan, x);
        }
    }
}
