//! Canonical constants, computed once per precision and kept for the lifetime
//! of the thread.
//!
//! Pi, e and ln 2 are evaluated in big-integer fixed point at the requested
//! precision plus the safety margin plus 16 bits, then rounded once:
//!
//! - pi by Machin's formula `16 atan(1/5) - 4 atan(1/239)`;
//! - e by the factorial series `sum 1/k!`;
//! - ln 2 by `2 atanh(1/3) = 2 sum 1/((2k+1) 3^(2k+1))`.

use std::cell::RefCell;
use std::collections::HashMap;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::float::Float;
use crate::store::{Value, note_cached};

const EXTRA_BITS: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Constant {
    Zero,
    One,
    PlusInfinity,
    MinusInfinity,
    Pi,
    E,
    Ln2,
}

thread_local! {
    static CACHE: RefCell<HashMap<(Constant, u32), Value>> = RefCell::new(HashMap::new());
}

/// Handle to `which` at `precision` bits.
///
/// The first request for a `(constant, precision)` pair computes the value
/// with `margin` extra guard bits and caches it; later requests share the
/// cached storage.
pub fn constant(which: Constant, precision: u32, margin: u32) -> Value {
    let precision = precision.max(Float::MIN_PRECISION);
    let key = (which, precision);
    if let Some(value) = CACHE.with(|cache| cache.borrow().get(&key).cloned()) {
        return value;
    }

    let value = Value::new(compute(which, precision, margin));
    note_cached();
    tracing::trace!(?which, precision, "caching constant");
    let handle = value.clone();
    CACHE.with(|cache| cache.borrow_mut().insert(key, value));
    handle
}

fn compute(which: Constant, precision: u32, margin: u32) -> Float {
    let bits = u64::from(precision) + u64::from(margin) + u64::from(EXTRA_BITS);
    let fixed = |value: BigInt| Float::new(value, -(bits as i64), precision);
    match which {
        Constant::Zero => Float::zero(precision),
        Constant::One => Float::one(precision),
        Constant::PlusInfinity => Float::pos_infinity(precision),
        Constant::MinusInfinity => Float::neg_infinity(precision),
        Constant::Pi => fixed(pi_fixed(bits)),
        Constant::E => fixed(e_fixed(bits)),
        Constant::Ln2 => fixed(ln2_fixed(bits)),
    }
}

/// `atan(1/n) * 2^bits`, truncated term by term.
fn atan_inverse(n: u32, bits: u64) -> BigInt {
    let n_squared = BigInt::from(n) * n;
    let mut power = (BigInt::one() << bits) / n;
    let mut sum = BigInt::zero();
    let mut k = 0u64;
    while !power.is_zero() {
        let term = &power / (2 * k + 1);
        if k % 2 == 0 {
            sum += term;
        } else {
            sum -= term;
        }
        power /= &n_squared;
        k += 1;
    }
    sum
}

pub(crate) fn pi_fixed(bits: u64) -> BigInt {
    atan_inverse(5, bits) * 16 - atan_inverse(239, bits) * 4
}

pub(crate) fn e_fixed(bits: u64) -> BigInt {
    let mut term = BigInt::one() << bits;
    let mut sum = BigInt::zero();
    let mut k = 0u64;
    while !term.is_zero() {
        sum += &term;
        k += 1;
        term /= k;
    }
    sum
}

pub(crate) fn ln2_fixed(bits: u64) -> BigInt {
    let mut power: BigInt = (BigInt::one() << bits) / 3;
    let mut sum = BigInt::zero();
    let mut k = 0u64;
    while !power.is_zero() {
        sum += &power / (2 * k + 1);
        power /= 9;
        k += 1;
    }
    sum * 2
}
