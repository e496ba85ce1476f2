use std::fmt::Debug;

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{One, Signed, Zero};

pub mod arithmetic;
pub mod cmp;
pub mod converter;

/// Internal layout of a [`Float`].
///
/// Finite values are `mantissa * 2^exponent`. The canonical form keeps zero as
/// `(0, 0)` and every other mantissa odd, so structural equality is numeric
/// equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) enum Repr {
    Finite { mantissa: BigInt, exponent: i64 },
    Infinite { negative: bool },
}

impl Repr {
    fn zero() -> Self {
        Repr::Finite {
            mantissa: BigInt::zero(),
            exponent: 0,
        }
    }
}

/// Binary floating-point number with a per-value mantissa precision.
///
/// The precision is the number of significant bits the mantissa may hold;
/// every constructor and operation rounds half to even to it.
#[derive(Clone)]
pub struct Float {
    repr: Repr,
    precision: u32,
}

impl Float {
    /// Smallest accepted precision. Smaller requests are raised to it.
    pub const MIN_PRECISION: u32 = 2;

    /// Creates `mantissa * 2^exponent` rounded to `precision` bits.
    pub fn new(mantissa: BigInt, exponent: i64, precision: u32) -> Self {
        let precision = precision.max(Self::MIN_PRECISION);
        Self {
            repr: round(mantissa, exponent, precision),
            precision,
        }
    }

    pub fn zero(precision: u32) -> Self {
        Self {
            repr: Repr::zero(),
            precision: precision.max(Self::MIN_PRECISION),
        }
    }

    pub fn one(precision: u32) -> Self {
        Self::new(BigInt::one(), 0, precision)
    }

    pub fn infinity(negative: bool, precision: u32) -> Self {
        Self {
            repr: Repr::Infinite { negative },
            precision: precision.max(Self::MIN_PRECISION),
        }
    }

    pub fn pos_infinity(precision: u32) -> Self {
        Self::infinity(false, precision)
    }

    pub fn neg_infinity(precision: u32) -> Self {
        Self::infinity(true, precision)
    }

    pub(crate) fn from_repr(repr: Repr, precision: u32) -> Self {
        match repr {
            Repr::Finite { mantissa, exponent } => Self::new(mantissa, exponent, precision),
            infinite => Self {
                repr: infinite,
                precision: precision.max(Self::MIN_PRECISION),
            },
        }
    }

    pub(crate) fn repr(&self) -> &Repr {
        &self.repr
    }

    /// Re-rounds the value to `precision` bits. Increasing the precision is exact.
    pub fn with_precision(&self, precision: u32) -> Self {
        Self::from_repr(self.repr.clone(), precision)
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn is_zero(&self) -> bool {
        matches!(&self.repr, Repr::Finite { mantissa, .. } if mantissa.is_zero())
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self.repr, Repr::Infinite { .. })
    }

    pub fn is_finite(&self) -> bool {
        !self.is_infinity()
    }

    /// Sign bit: `true` for negative values. Zero is never negative.
    pub fn sign(&self) -> bool {
        match &self.repr {
            Repr::Finite { mantissa, .. } => mantissa.is_negative(),
            Repr::Infinite { negative } => *negative,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.sign()
    }

    pub fn is_positive(&self) -> bool {
        !self.sign() && !self.is_zero()
    }

    /// Mantissa of a finite value, `None` for infinities.
    pub fn mantissa(&self) -> Option<&BigInt> {
        match &self.repr {
            Repr::Finite { mantissa, .. } => Some(mantissa),
            Repr::Infinite { .. } => None,
        }
    }

    /// Binary exponent of a finite value, `None` for infinities.
    pub fn exponent(&self) -> Option<i64> {
        match &self.repr {
            Repr::Finite { exponent, .. } => Some(*exponent),
            Repr::Infinite { .. } => None,
        }
    }

    /// Raw `(sign, magnitude, exponent)` of a finite value.
    pub fn to_parts(&self) -> Option<(bool, BigUint, i64)> {
        match &self.repr {
            Repr::Finite { mantissa, exponent } => {
                Some((mantissa.is_negative(), mantissa.magnitude().clone(), *exponent))
            }
            Repr::Infinite { .. } => None,
        }
    }

    /// `t` such that `2^(t-1) <= |self| < 2^t`, for finite non-zero values.
    pub fn top_exponent(&self) -> Option<i64> {
        match &self.repr {
            Repr::Finite { mantissa, exponent } if !mantissa.is_zero() => {
                Some(exponent + mantissa.bits() as i64)
            }
            _ => None,
        }
    }
}

/// Rounds `mantissa * 2^exponent` half to even and strips trailing zeros.
pub(crate) fn round(mantissa: BigInt, exponent: i64, precision: u32) -> Repr {
    if mantissa.is_zero() {
        return Repr::zero();
    }
    let (sign, mut magnitude) = mantissa.into_parts();
    let mut exponent = exponent;

    let bits = magnitude.bits();
    if bits > u64::from(precision) {
        let shift = bits - u64::from(precision);
        let half = BigUint::one() << (shift - 1);
        let remainder = &magnitude & ((BigUint::one() << shift) - 1u32);
        magnitude >>= shift;
        exponent += shift as i64;
        if remainder > half || (remainder == half && magnitude.bit(0)) {
            magnitude += 1u32;
        }
    }

    let zeros = magnitude.trailing_zeros().unwrap_or(0);
    magnitude >>= zeros;
    exponent += zeros as i64;

    Repr::Finite {
        mantissa: BigInt::from_biguint(sign, magnitude),
        exponent,
    }
}

pub(crate) fn signed(negative: bool, magnitude: BigUint) -> BigInt {
    let sign = if negative { Sign::Minus } else { Sign::Plus };
    BigInt::from_biguint(sign, magnitude)
}

impl Debug for Float {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.repr {
            Repr::Finite { mantissa, exponent } => f
                .debug_struct("Float")
                .field("sign", if mantissa.is_negative() { &'-' } else { &'+' })
                .field("mantissa", mantissa.magnitude())
                .field("exponent", exponent)
                .field("precision", &self.precision)
                .finish(),
            Repr::Infinite { negative } => f
                .debug_struct("Float")
                .field("sign", if *negative { &'-' } else { &'+' })
                .field("mantissa", &"inf")
                .field("precision", &self.precision)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(BigInt::from(0b1011), 0, 3, BigInt::from(0b11), 2)]
    #[case(BigInt::from(0b1001), 0, 3, BigInt::from(1), 3)]
    #[case(BigInt::from(0b1111), 0, 3, BigInt::from(1), 4)]
    #[case(BigInt::from(0b10111), 0, 3, BigInt::from(0b11), 3)]
    #[case(BigInt::from(-0b1011), 5, 3, BigInt::from(-0b11), 7)]
    #[case(BigInt::from(96), -3, 8, BigInt::from(3), 2)]
    fn test_round_half_even(
        #[case] mantissa: BigInt,
        #[case] exponent: i64,
        #[case] precision: u32,
        #[case] expected_mantissa: BigInt,
        #[case] expected_exponent: i64,
    ) {
        let value = Float::new(mantissa, exponent, precision);
        assert_eq!(value.mantissa(), Some(&expected_mantissa));
        assert_eq!(value.exponent(), Some(expected_exponent));
    }

    #[test]
    fn test_special_values() {
        let zero = Float::zero(64);
        let inf = Float::pos_infinity(64);
        let neg_inf = Float::neg_infinity(64);

        assert!(zero.is_zero());
        assert!(!zero.sign());
        assert!(inf.is_infinity() && !inf.sign());
        assert!(neg_inf.is_infinity() && neg_inf.sign());
        assert_eq!(zero.top_exponent(), None);
        assert_eq!(inf.top_exponent(), None);
        assert_eq!(Float::one(8).top_exponent(), Some(1));
    }

    #[test]
    fn test_precision_floor() {
        assert_eq!(Float::one(0).precision(), Float::MIN_PRECISION);
    }
}
