use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::Zero;

use crate::float::{Float, Repr};

/// Compares `|a| * 2^ea` with `|b| * 2^eb` for non-zero mantissas.
fn cmp_magnitude(a: &BigInt, ea: i64, b: &BigInt, eb: i64) -> Ordering {
    let top_a = ea + a.bits() as i64;
    let top_b = eb + b.bits() as i64;
    top_a.cmp(&top_b).then_with(|| {
        let exponent = ea.min(eb);
        let a = a.magnitude() << (ea - exponent) as usize;
        let b = b.magnitude() << (eb - exponent) as usize;
        a.cmp(&b)
    })
}

impl PartialEq for Float {
    /// Numeric equality; the precision the values carry is irrelevant.
    fn eq(&self, other: &Self) -> bool {
        self.repr == other.repr
    }
}

impl Eq for Float {}

impl Ord for Float {
    fn cmp(&self, other: &Self) -> Ordering {
        match (&self.repr, &other.repr) {
            (Repr::Infinite { negative: a }, Repr::Infinite { negative: b }) => b.cmp(a),
            (Repr::Infinite { negative }, _) => {
                if *negative {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (_, Repr::Infinite { negative }) => {
                if *negative {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
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
                let sign = ma.sign().cmp(&mb.sign());
                if sign != Ordering::Equal || ma.is_zero() {
                    return sign;
                }
                let magnitude = cmp_magnitude(ma, *ea, mb, *eb);
                if self.sign() {
                    magnitude.reverse()
                } else {
                    magnitude
                }
            }
        }
    }
}

impl PartialOrd for Float {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq<f64> for Float {
    fn eq(&self, other: &f64) -> bool {
        self.partial_cmp(other) == Some(Ordering::Equal)
    }
}

impl PartialOrd<f64> for Float {
    /// Compares against the exact value of the double; NaN is unordered.
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        let other = Float::from_f64(*other, 53).ok()?;
        Some(self.cmp(&other))
    }
}

impl PartialEq<Float> for f64 {
    fn eq(&self, other: &Float) -> bool {
        other == self
    }
}

impl PartialOrd<Float> for f64 {
    fn partial_cmp(&self, other: &Float) -> Option<Ordering> {
        other.partial_cmp(self).map(Ordering::reverse)
    }
}
