use std::ops::{Add, Div, Mul, Neg, Sub};

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, Zero};
use tracing::warn;

use crate::error::{Error, Result};
use crate::float::{Float, Repr, signed};

/// Exact `a + b` rounded to `precision` bits.
pub(crate) fn sum(a: &Float, b: &Float, precision: u32) -> Float {
    match (&a.repr, &b.repr) {
        (Repr::Infinite { negative: x }, Repr::Infinite { negative: y }) if x != y => {
            warn!("indeterminate sum of opposite infinities, returning zero");
            Float::zero(precision)
        }
        (Repr::Infinite { negative }, _) | (_, Repr::Infinite { negative }) => {
            Float::infinity(*negative, precision)
        }
        (
            Repr::Finite {
                mantissa: ma,
                exponent: ea,
            },
            Repr::Finite {
                mantissa: mb,
                exponent: eb,
            },
        ) => {
            if mb.is_zero() {
                return a.with_precision(precision);
            }
            if ma.is_zero() {
                return b.with_precision(precision);
            }
            let (ma, ea) = (ma.clone(), *ea);
            let (mb, eb) = (mb.clone(), *eb);
            let ta = ea + ma.bits() as i64;
            let tb = eb + mb.bits() as i64;

            // A far smaller addend only decides rounding; keep it as a sticky bit.
            let (ma, ea, mb, eb) = if ta >= tb {
                let (mb, eb) = sticky(ma.bits(), ea, ta, mb, eb, tb, precision);
                (ma, ea, mb, eb)
            } else {
                let (ma, ea) = sticky(mb.bits(), eb, tb, ma, ea, ta, precision);
                (ma, ea, mb, eb)
            };

            let exponent = ea.min(eb);
            let mantissa = (ma << (ea - exponent) as usize) + (mb << (eb - exponent) as usize);
            Float::new(mantissa, exponent, precision)
        }
    }
}

fn sticky(
    large_bits: u64,
    large_exponent: i64,
    large_top: i64,
    small: BigInt,
    small_exponent: i64,
    small_top: i64,
    precision: u32,
) -> (BigInt, i64) {
    let reach = large_bits.max(u64::from(precision)) as i64;
    let lowest = large_exponent.min(large_top - reach) - 2;
    if small_top < lowest {
        let unit = if small.is_negative() {
            -BigInt::one()
        } else {
            BigInt::one()
        };
        (unit, lowest - 1)
    } else {
        (small, small_exponent)
    }
}

pub(crate) fn difference(a: &Float, b: &Float, precision: u32) -> Float {
    sum(a, &-b, precision)
}

/// Exact `a * b` rounded to `precision` bits.
pub(crate) fn product(a: &Float, b: &Float, precision: u32) -> Float {
    let negative = a.sign() != b.sign();
    match (&a.repr, &b.repr) {
        (Repr::Finite { mantissa, .. }, Repr::Infinite { .. })
        | (Repr::Infinite { .. }, Repr::Finite { mantissa, .. })
            if mantissa.is_zero() =>
        {
            warn!("indeterminate product of zero and infinity, returning zero");
            Float::zero(precision)
        }
        (Repr::Infinite { .. }, _) | (_, Repr::Infinite { .. }) => {
            Float::infinity(negative, precision)
        }
        (
            Repr::Finite {
                mantissa: ma,
                exponent: ea,
            },
            Repr::Finite {
                mantissa: mb,
                exponent: eb,
            },
        ) => Float::new(ma * mb, ea + eb, precision),
    }
}

/// `a / b` rounded to `precision` bits; division by zero gives a signed infinity.
pub(crate) fn quotient(a: &Float, b: &Float, precision: u32) -> Float {
    let negative = a.sign() != b.sign();
    match (&a.repr, &b.repr) {
        (Repr::Infinite { .. }, Repr::Infinite { .. }) => {
            warn!("indeterminate quotient of infinities, returning zero");
            Float::zero(precision)
        }
        (Repr::Infinite { .. }, _) => Float::infinity(negative, precision),
        (_, Repr::Infinite { .. }) => Float::zero(precision),
        (
            Repr::Finite {
                mantissa: ma,
                exponent: ea,
            },
            Repr::Finite {
                mantissa: mb,
                exponent: eb,
            },
        ) => {
            if mb.is_zero() {
                if ma.is_zero() {
                    warn!("indeterminate quotient 0/0, returning zero");
                    return Float::zero(precision);
                }
                return Float::infinity(a.sign(), precision);
            }
            if ma.is_zero() {
                return Float::zero(precision);
            }

            // Enough quotient bits for the target precision plus round and sticky.
            let extra =
                (i64::from(precision) + 2 + mb.bits() as i64 - ma.bits() as i64).max(0) as usize;
            let numerator: BigUint = ma.magnitude() << extra;
            let denominator = mb.magnitude();
            let q = &numerator / denominator;
            let inexact = &q * denominator != numerator;
            let mut q = q << 1usize;
            if inexact {
                q += 1u32;
            }
            Float::new(signed(negative, q), ea - eb - extra as i64 - 1, precision)
        }
    }
}

impl Float {
    pub fn abs(&self) -> Self {
        match &self.repr {
            Repr::Finite { mantissa, exponent } => Self {
                repr: Repr::Finite {
                    mantissa: mantissa.abs(),
                    exponent: *exponent,
                },
                precision: self.precision,
            },
            Repr::Infinite { .. } => Self::pos_infinity(self.precision),
        }
    }

    /// Exact multiplication by `2^shift`.
    pub fn mul_2exp(&self, shift: i64) -> Self {
        match &self.repr {
            Repr::Finite { mantissa, exponent } if !mantissa.is_zero() => Self {
                repr: Repr::Finite {
                    mantissa: mantissa.clone(),
                    exponent: exponent + shift,
                },
                precision: self.precision,
            },
            _ => self.clone(),
        }
    }

    /// Division that rejects an exact-zero divisor.
    pub fn checked_div(&self, other: &Float) -> Result<Float> {
        if other.is_zero() {
            return Err(Error::domain("divide", "division by zero"));
        }
        Ok(self / other)
    }

    /// Quotient rounded to an explicit precision instead of the operands' precision.
    pub fn div_to(&self, other: &Float, precision: u32) -> Float {
        quotient(self, other, precision)
    }

    pub fn add_to(&self, other: &Float, precision: u32) -> Float {
        sum(self, other, precision)
    }

    pub fn mul_to(&self, other: &Float, precision: u32) -> Float {
        product(self, other, precision)
    }

    pub fn recip(&self) -> Float {
        quotient(&Float::one(self.precision), self, self.precision)
    }

    pub fn sqrt(&self) -> Result<Float> {
        if self.is_negative() {
            return Err(Error::domain("sqrt", "negative argument"));
        }
        Ok(self.sqrt_magnitude())
    }

    /// Square root of `|self|`, correctly rounded.
    pub(crate) fn sqrt_magnitude(&self) -> Float {
        let precision = self.precision;
        match &self.repr {
            Repr::Infinite { .. } => Float::pos_infinity(precision),
            Repr::Finite { mantissa, .. } if mantissa.is_zero() => Float::zero(precision),
            Repr::Finite { mantissa, exponent } => {
                let magnitude = mantissa.magnitude();
                let wanted = 2 * (i64::from(precision) + 2) + 1;
                let mut shift = (wanted - magnitude.bits() as i64).max(0);
                if (exponent - shift) % 2 != 0 {
                    shift += 1;
                }
                let radicand: BigUint = magnitude << shift as usize;
                let root = radicand.sqrt();
                let inexact = &root * &root != radicand;
                let mut root = root << 1usize;
                if inexact {
                    root += 1u32;
                }
                Float::new(BigInt::from(root), (exponent - shift) / 2 - 1, precision)
            }
        }
    }
}

impl Neg for Float {
    type Output = Self;

    fn neg(self) -> Self::Output {
        let repr = match self.repr {
            Repr::Finite { mantissa, exponent } => Repr::Finite {
                mantissa: -mantissa,
                exponent,
            },
            Repr::Infinite { negative } => Repr::Infinite {
                negative: !negative,
            },
        };
        Self {
            repr,
            precision: self.precision,
        }
    }
}

impl Neg for &Float {
    type Output = Float;

    fn neg(self) -> Self::Output {
        -self.clone()
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $core:expr) => {
        impl $trait<&Float> for &Float {
            type Output = Float;

            fn $method(self, rhs: &Float) -> Self::Output {
                $core(self, rhs, self.precision.max(rhs.precision))
            }
        }

        impl $trait<Float> for Float {
            type Output = Float;

            fn $method(self, rhs: Float) -> Self::Output {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Float> for Float {
            type Output = Float;

            fn $method(self, rhs: &Float) -> Self::Output {
                (&self).$method(rhs)
            }
        }

        impl $trait<Float> for &Float {
            type Output = Float;

            fn $method(self, rhs: Float) -> Self::Output {
                self.$method(&rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, sum);
impl_binary_op!(Sub, sub, difference);
impl_binary_op!(Mul, mul, product);
impl_binary_op!(Div, div, quotient);
