//! # Conversion Utilities
//!
//! Conversions between [`Float`] and native numbers.
//!
//! ## IEEE 754 Layout
//!
//! Standard 64-bit IEEE 754 double-precision format:
//! ```text
//! [Sign: 1 bit][Exponent: 11 bits][Fraction: 52 bits]
//! Bit:  63      62           52   51            0
//! ```
//!
//! Doubles and integers convert exactly whenever the target precision holds
//! their significant bits; otherwise the usual half-to-even rounding applies.
//!
//! ## Examples
//!
//! ```rust
//! use apcalc::Float;
//!
//! let value = Float::from_f64(0.1, 53).unwrap();
//! assert_eq!(value.to_f64(), 0.1);
//!
//! let min = Float::from_i64(i64::MIN, 64);
//! assert_eq!(min.to_i64(), Some(i64::MIN));
//! ```

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::{Error, Result};
use crate::float::{Float, Repr, round, signed};

const FRACTION_BITS: u32 = 52;
const EXPONENT_BIAS: i64 = 1075;
const MIN_SUBNORMAL_EXPONENT: i64 = -1074;

impl Float {
    /// Creates a Float from an IEEE 754 double-precision float.
    ///
    /// The sign, exponent and fraction fields are read straight from the bit
    /// layout, so no decimal rounding is involved. NaN has no counterpart and
    /// is rejected.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use apcalc::Float;
    ///
    /// let value = Float::from_f64(-2.5, 64).unwrap();
    /// assert!(value.sign());
    /// assert_eq!(value.exponent(), Some(-1));
    /// ```
    pub fn from_f64(value: f64, precision: u32) -> Result<Self> {
        let bits = value.to_bits();
        let negative = bits >> 63 == 1;
        let exponent_field = ((bits >> FRACTION_BITS) & 0x7ff) as i64;
        let fraction = bits & ((1 << FRACTION_BITS) - 1);

        if exponent_field == 0x7ff {
            if fraction != 0 {
                return Err(Error::domain("from_f64", "NaN has no arbitrary precision value"));
            }
            return Ok(Self::infinity(negative, precision));
        }

        let (mantissa, exponent) = if exponent_field == 0 {
            (fraction, MIN_SUBNORMAL_EXPONENT)
        } else {
            (fraction | (1 << FRACTION_BITS), exponent_field - EXPONENT_BIAS)
        };
        Ok(Self::new(
            signed(negative, BigUint::from(mantissa)),
            exponent,
            precision,
        ))
    }

    pub fn from_i64(value: i64, precision: u32) -> Self {
        Self::new(BigInt::from(value), 0, precision)
    }

    pub fn from_u64(value: u64, precision: u32) -> Self {
        Self::new(BigInt::from(value), 0, precision)
    }

    pub fn from_bigint(value: BigInt, precision: u32) -> Self {
        Self::new(value, 0, precision)
    }

    /// Converts to the nearest double. Values beyond the double range become
    /// infinities, values below the subnormal range become zero.
    pub fn to_f64(&self) -> f64 {
        let (mantissa, exponent) = match &self.repr {
            Repr::Infinite { negative: true } => return f64::NEG_INFINITY,
            Repr::Infinite { negative: false } => return f64::INFINITY,
            Repr::Finite { mantissa, .. } if mantissa.is_zero() => return 0.0,
            Repr::Finite { mantissa, exponent } => (mantissa, *exponent),
        };
        let negative = mantissa.is_negative();
        let top = exponent + mantissa.bits() as i64;
        if top > 1025 {
            return if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            };
        }

        let magnitude = if top - 1 >= -1022 {
            match round(mantissa.abs(), exponent, FRACTION_BITS + 1) {
                Repr::Finite { mantissa, exponent } => {
                    ldexp(mantissa.to_f64().unwrap_or(f64::INFINITY), exponent)
                }
                Repr::Infinite { .. } => f64::INFINITY,
            }
        } else {
            // Subnormal range: round onto the fixed 2^-1074 grid.
            let units = round_to_grid(mantissa.magnitude(), exponent, MIN_SUBNORMAL_EXPONENT);
            ldexp(units.to_f64().unwrap_or(0.0), MIN_SUBNORMAL_EXPONENT)
        };
        if negative { -magnitude } else { magnitude }
    }

    /// Rounds to the nearest integer, ties to even. `None` for infinities.
    pub fn round_to_integer(&self) -> Option<BigInt> {
        match &self.repr {
            Repr::Infinite { .. } => None,
            Repr::Finite { mantissa, exponent } => {
                if *exponent >= 0 {
                    return Some(mantissa << *exponent as usize);
                }
                let units = round_to_grid(mantissa.magnitude(), *exponent, 0);
                Some(signed(mantissa.is_negative(), units))
            }
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.repr, Repr::Finite { exponent, .. } if exponent >= 0)
    }

    /// The value as `i64` when it is an integer in range.
    pub fn to_i64(&self) -> Option<i64> {
        if !self.is_integer() {
            return None;
        }
        self.round_to_integer()?.to_i64()
    }
}

/// Rounds `magnitude * 2^exponent` to a multiple of `2^grid`, half to even,
/// and returns the multiple.
fn round_to_grid(magnitude: &BigUint, exponent: i64, grid: i64) -> BigUint {
    if exponent >= grid {
        return magnitude << (exponent - grid) as usize;
    }
    let shift = (grid - exponent) as u64;
    if shift > magnitude.bits() {
        return BigUint::zero();
    }
    let half = BigUint::one() << (shift - 1);
    let remainder = magnitude & ((BigUint::one() << shift) - 1u32);
    let mut units = magnitude >> shift;
    if remainder > half || (remainder == half && units.bit(0)) {
        units += 1u32;
    }
    units
}

/// `value * 2^exponent` in steps that keep every intermediate product exact.
fn ldexp(mut value: f64, mut exponent: i64) -> f64 {
    const STEP: i64 = 600;
    let up = 2f64.powi(STEP as i32);
    let down = 2f64.powi(-STEP as i32);
    while exponent > STEP && value.is_finite() {
        value *= up;
        exponent -= STEP;
    }
    while exponent < -STEP && value != 0.0 {
        value *= down;
        exponent += STEP;
    }
    value * 2f64.powi(exponent as i32)
}

impl TryFrom<f64> for Float {
    type Error = Error;

    /// Exact conversion at double precision.
    fn try_from(value: f64) -> Result<Self> {
        Self::from_f64(value, FRACTION_BITS + 1)
    }
}

impl From<&Float> for f64 {
    fn from(value: &Float) -> Self {
        value.to_f64()
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;
    use rstest::rstest;

    use super::*;
    use crate::tests::*;

    #[test]
    fn test_from_f64_layout() {
        let special_values = [
            (0.0, false, 0, 0),
            (-0.0, false, 0, 0),
            (1.0, false, 1, 0),
            (-2.5, true, 5, -1),
            (f64::MIN_POSITIVE, false, 1, -1022),
            (5e-324, false, 1, -1074),
        ];

        for (value, sign, mantissa, exponent) in special_values {
            let float = Float::try_from(value).unwrap();
            assert_eq!(float.sign(), sign, "sign of {value}");
            assert_eq!(float.mantissa(), Some(&signed(sign, BigUint::from(mantissa as u32))));
            assert_eq!(float.exponent(), Some(exponent));
        }

        assert!(Float::try_from(f64::INFINITY).unwrap().is_infinity());
        assert!(Float::try_from(f64::NEG_INFINITY).unwrap().sign());
        assert!(Float::try_from(f64::NAN).is_err());
    }

    #[rstest]
    fn test_f64_round_trip(mut rng: impl Rng, n_experiments: usize) {
        let special_values = [
            0.0,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::MIN_POSITIVE,
            f64::MAX,
            f64::MIN,
            5e-324,
            -1e-310,
        ];

        for value in special_values {
            assert_eq!(Float::try_from(value).unwrap().to_f64(), value);
        }

        for _ in 0..n_experiments {
            let value = random_f64(&mut rng);
            assert_eq!(Float::try_from(value).unwrap().to_f64(), value);
        }
    }

    #[test]
    fn test_to_f64_rounds_half_even() {
        // 1 + 2^-53 is a tie between 1 and 1 + 2^-52.
        let tie = Float::new(BigInt::from((1u64 << 53) + 1), -53, 128);
        assert_eq!(tie.to_f64(), 1.0);
        let above = Float::new(BigInt::from((1u64 << 54) + 3), -54, 128);
        assert_eq!(above.to_f64(), 1.0 + f64::EPSILON);
        assert_eq!(Float::one(64).mul_2exp(5000).to_f64(), f64::INFINITY);
        assert_eq!(Float::one(64).mul_2exp(-5000).to_f64(), 0.0);
    }

    #[rstest]
    #[case(2.5, 2)]
    #[case(3.5, 4)]
    #[case(-2.5, -2)]
    #[case(-2.7, -3)]
    #[case(0.49, 0)]
    #[case(1e20, 100_000_000_000_000_000_000)]
    fn test_round_to_integer(#[case] value: f64, #[case] expected: i128) {
        let float = Float::try_from(value).unwrap();
        assert_eq!(float.round_to_integer(), Some(BigInt::from(expected)));
    }

    #[test]
    fn test_integer_conversion_boundaries() {
        for value in [0, 1, -1, 42, -7, i64::MAX, i64::MIN, i64::MIN + 1] {
            let float = Float::from_i64(value, 64);
            assert_eq!(float.to_i64(), Some(value));
            assert!(float.is_integer());
        }
        assert_eq!(Float::try_from(0.5).unwrap().to_i64(), None);
        assert_eq!(Float::from_u64(u64::MAX, 64).to_i64(), None);
    }
}
