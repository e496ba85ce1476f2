//! Reference-counted value handles and their accounting.
//!
//! Every [`Value`] is a shared, immutable handle to a [`Float`]. Cloning a
//! handle shares the storage; dropping the last handle frees it. The store
//! keeps two per-thread counters:
//!
//! - the *live* count, the number of handles currently alive;
//! - the *cached* count, the number of those handles held by the constant cache.
//!
//! At any quiescent point `live == owned + cached`, where `owned` is the number
//! of handles the application holds. [`verify_accounting`] checks this.

use std::cell::Cell;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::ops::{Add, Deref, Mul, Neg, Sub};
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::float::Float;

pub mod constants;

pub use constants::{Constant, constant};

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
    static CACHED: Cell<usize> = const { Cell::new(0) };
}

/// Number of value handles alive on this thread, cached ones included.
pub fn live_count() -> usize {
    LIVE.with(Cell::get)
}

/// Number of value handles owned by the constant cache on this thread.
pub fn cached_count() -> usize {
    CACHED.with(Cell::get)
}

/// Checks that the live handles are exactly the `owned` ones plus the cache.
pub fn verify_accounting(owned: usize) -> Result<()> {
    let (live, cached) = (live_count(), cached_count());
    if live == owned + cached {
        Ok(())
    } else {
        Err(Error::InvariantViolation {
            live,
            owned,
            cached,
        })
    }
}

pub(crate) fn note_cached() {
    CACHED.with(|cached| cached.set(cached.get() + 1));
}

fn retain() {
    LIVE.with(|live| live.set(live.get() + 1));
}

fn release() {
    // The counter may already be gone while the thread tears down its cache.
    let _ = LIVE.try_with(|live| live.set(live.get().saturating_sub(1)));
}

/// Immutable handle to an arbitrary precision number.
pub struct Value {
    float: Rc<Float>,
}

impl Value {
    pub fn new(float: Float) -> Self {
        retain();
        Self {
            float: Rc::new(float),
        }
    }

    /// Creates the exact value of `value`, rounded to `precision` bits.
    pub fn from_f64(value: f64, precision: u32) -> Result<Self> {
        Float::from_f64(value, precision).map(Self::new)
    }

    pub fn from_i64(value: i64, precision: u32) -> Self {
        Self::new(Float::from_i64(value, precision))
    }

    pub fn from_u64(value: u64, precision: u32) -> Self {
        Self::new(Float::from_u64(value, precision))
    }

    pub fn float(&self) -> &Float {
        &self.float
    }

    /// Gives the handle back. Equivalent to dropping it.
    pub fn release(self) {}

    /// Whether both handles share the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.float, &other.float)
    }

    pub fn abs(&self) -> Value {
        Value::new(self.float.abs())
    }

    /// The larger of two handles; `self` on ties.
    pub fn maximum(&self, other: &Value) -> Value {
        if self >= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    pub fn minimum(&self, other: &Value) -> Value {
        if self <= other {
            self.clone()
        } else {
            other.clone()
        }
    }

    /// Quotient at the larger operand precision.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] when `other` is exactly zero.
    pub fn divide(&self, other: &Value) -> Result<Value> {
        self.float.checked_div(&other.float).map(Value::new)
    }

    pub fn sqrt(&self) -> Result<Value> {
        self.float.sqrt().map(Value::new)
    }

    pub fn mul_2exp(&self, shift: i64) -> Value {
        Value::new(self.float.mul_2exp(shift))
    }

    pub fn with_precision(&self, precision: u32) -> Value {
        Value::new(self.float.with_precision(precision))
    }
}

impl From<Float> for Value {
    fn from(float: Float) -> Self {
        Self::new(float)
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        retain();
        Self {
            float: Rc::clone(&self.float),
        }
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        release();
    }
}

impl Deref for Value {
    type Target = Float;

    fn deref(&self) -> &Float {
        &self.float
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&*self.float, f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.float == other.float
    }
}

impl Eq for Value {}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        self.float.cmp(&other.float)
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq<f64> for Value {
    fn eq(&self, other: &f64) -> bool {
        *self.float == *other
    }
}

impl PartialOrd<f64> for Value {
    fn partial_cmp(&self, other: &f64) -> Option<Ordering> {
        (*self.float).partial_cmp(other)
    }
}

impl Neg for &Value {
    type Output = Value;

    fn neg(self) -> Value {
        Value::new(-&*self.float)
    }
}

impl Neg for Value {
    type Output = Value;

    fn neg(self) -> Value {
        -&self
    }
}

macro_rules! impl_value_op {
    ($trait:ident, $method:ident) => {
        impl $trait<&Value> for &Value {
            type Output = Value;

            fn $method(self, rhs: &Value) -> Value {
                Value::new((&*self.float).$method(&*rhs.float))
            }
        }

        impl $trait<Value> for Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                (&self).$method(&rhs)
            }
        }

        impl $trait<&Value> for Value {
            type Output = Value;

            fn $method(self, rhs: &Value) -> Value {
                (&self).$method(rhs)
            }
        }

        impl $trait<Value> for &Value {
            type Output = Value;

            fn $method(self, rhs: Value) -> Value {
                self.$method(&rhs)
            }
        }
    };
}

impl_value_op!(Add, add);
impl_value_op!(Sub, sub);
impl_value_op!(Mul, mul);
