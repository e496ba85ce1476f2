//! Arc sine, arc cosine and arc tangent.
//!
//! Everything goes through the arc tangent: arguments above one are folded
//! with `atan x = pi/2 - atan(1/x)`, then halved with
//! `atan x = 2 atan(x / (1 + sqrt(1 + x^2)))` until the Taylor series
//! converges quickly.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::float::Float;
use crate::math::series;
use crate::store::{Constant, Value};

/// Half-angle steps stop once `|x| < 2^-REDUCED_TOP`.
const REDUCED_TOP: i64 = 8;

impl Context {
    /// # Errors
    ///
    /// [`Error::Domain`] outside `[-1, 1]`.
    pub fn arcsin(&mut self, x: &Value) -> Result<Value> {
        let x = unit_interval("arcsin", x)?;
        if x.is_zero() {
            return Ok(self.zero());
        }
        if x.abs() == 1.0 {
            let half_pi = self.pi().mul_2exp(-1);
            return Ok(if x.is_negative() { -half_pi } else { half_pi });
        }

        let w = self.working_bits();
        let one = Float::one(w);
        let cosine = one
            .add_to(&-x, w)
            .mul_to(&one.add_to(x, w), w)
            .sqrt_magnitude();
        let angle = self.arctan_float(&x.div_to(&cosine, w), w);
        Ok(self.finish(angle))
    }

    /// # Errors
    ///
    /// [`Error::Domain`] outside `[-1, 1]`.
    pub fn arccos(&mut self, x: &Value) -> Result<Value> {
        let x = unit_interval("arccos", x)?;
        if *x == 1.0 {
            return Ok(self.zero());
        }
        if *x == -1.0 {
            return Ok(self.pi());
        }
        if x.is_zero() {
            return Ok(self.pi().mul_2exp(-1));
        }

        let w = self.working_bits();
        let one = Float::one(w);
        let ratio = one.add_to(&-x, w).div_to(&one.add_to(x, w), w);
        let half = self.arctan_float(&ratio.sqrt_magnitude(), w);
        Ok(self.finish(half.mul_2exp(1)))
    }

    /// Arc tangent of `x`, with `atan(±inf) = ±pi/2`.
    pub fn arctan(&mut self, x: &Value) -> Value {
        if x.is_infinity() {
            let half_pi = self.pi().mul_2exp(-1);
            return if x.is_negative() { -half_pi } else { half_pi };
        }
        if x.is_zero() {
            return self.zero();
        }
        let w = self.working_bits();
        let angle = self.arctan_float(x.float(), w);
        self.finish(angle)
    }

    /// Arc tangent of a finite `x` at `w` bits.
    pub(super) fn arctan_float(&mut self, x: &Float, w: u32) -> Float {
        let one = Float::one(w);
        let mut y = x.abs().with_precision(w);
        let folded = y > one;
        if folded {
            y = one.div_to(&y, w);
        }

        let mut halvings = 0;
        while y.top_exponent().is_some_and(|top| top > -REDUCED_TOP) {
            let root = one.add_to(&y.mul_to(&y, w), w).sqrt_magnitude();
            y = y.div_to(&one.add_to(&root, w), w);
            halvings += 1;
        }

        let square = y.mul_to(&y, w);
        let mut power = y;
        let (sum, converged) = series(w, |k| {
            if k > 0 {
                power = -power.mul_to(&square, w);
            }
            power.div_to(&Float::from_u64(2 * k as u64 + 1, 64), w)
        });
        self.check_convergence("arctan", converged);

        let mut angle = sum.mul_2exp(halvings);
        if folded {
            let pi = self.wide_constant(Constant::Pi, u64::from(w));
            angle = pi.float().mul_2exp(-1).add_to(&-angle, w);
        }
        if x.is_negative() { -angle } else { angle }
    }
}

fn unit_interval<'a>(operation: &'static str, x: &'a Value) -> Result<&'a Float> {
    if x.is_infinity() || x.float().abs() > 1.0 {
        return Err(Error::domain(operation, "argument outside [-1, 1]"));
    }
    Ok(x.float())
}
