//! # Precision Context
//!
//! The configuration every computation reads: the working precision, the
//! safety margin added as guard bits, the number of decimal digits callers
//! intend to print, and the sticky *increase precision recommended* flag that
//! computations raise when they suspect their result is under-precise.
//!
//! ```rust
//! use apcalc::Context;
//!
//! let mut ctx = Context::new();
//! ctx.set_initial_precision(128);
//! let x = ctx.value_from_f64(0.5).unwrap();
//!
//! let result = ctx.checked(|ctx| ctx.sin(&x));
//! assert!(!result.increase_precision_recommended);
//! assert!((result.value.unwrap().to_f64() - 0.5f64.sin()).abs() < 1e-15);
//! ```

use crate::error::Result;
use crate::random::{Generator, RandomSource};
use crate::store::{Constant, Value, constant};

/// Default initial working precision in bits.
pub const DEFAULT_PRECISION: u32 = 32;
/// Default safety margin in bits.
pub const DEFAULT_SAFETY_MARGIN: u32 = 32;
/// Default output precision in decimal digits.
pub const DEFAULT_OUTPUT_PRECISION: u32 = 5;

/// Which optional verification checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckPrecisionMode {
    /// Every check except inside statistical sampling.
    #[default]
    AlwaysExceptStatistics,
    Always,
    Never,
}

/// A result together with the advisory bit of the work that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Checked<T> {
    pub value: T,
    pub increase_precision_recommended: bool,
}

#[derive(Debug, Clone)]
pub struct Context {
    initial_precision: u32,
    precision: u32,
    safety_margin: u32,
    output_precision: u32,
    initial_precision_already_set: bool,
    check_precision_mode: CheckPrecisionMode,
    increase_precision_recommended: bool,
    standard_generator: Generator,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            initial_precision: DEFAULT_PRECISION,
            precision: DEFAULT_PRECISION,
            safety_margin: DEFAULT_SAFETY_MARGIN,
            output_precision: DEFAULT_OUTPUT_PRECISION,
            initial_precision_already_set: false,
            check_precision_mode: CheckPrecisionMode::default(),
            increase_precision_recommended: false,
            standard_generator: Generator::default(),
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores every default, including the standard generator.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn initial_precision(&self) -> u32 {
        self.initial_precision
    }

    /// Sets the initial precision and makes it the working precision.
    ///
    /// If neither this nor [`Context::set_safety_margin`] was called before,
    /// the safety margin takes the same value.
    pub fn set_initial_precision(&mut self, bits: u32) {
        self.initial_precision = bits;
        self.precision = bits;
        if !self.initial_precision_already_set {
            self.initial_precision_already_set = true;
            self.set_safety_margin(bits);
        }
    }

    pub fn safety_margin(&self) -> u32 {
        self.safety_margin
    }

    /// Sets the safety margin.
    ///
    /// If neither this nor [`Context::set_initial_precision`] was called
    /// before, the initial precision takes the same value.
    pub fn set_safety_margin(&mut self, bits: u32) {
        self.safety_margin = bits;
        if !self.initial_precision_already_set {
            self.initial_precision_already_set = true;
            self.set_initial_precision(bits);
        }
    }

    /// Current working precision of new values.
    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn set_precision(&mut self, bits: u32) {
        self.precision = bits;
    }

    /// Working precision plus safety margin.
    pub fn guard_precision(&self) -> u32 {
        self.precision.saturating_add(self.safety_margin)
    }

    pub fn output_precision(&self) -> u32 {
        self.output_precision
    }

    pub fn set_output_precision(&mut self, digits: u32) {
        self.output_precision = digits;
    }

    /// Bits needed to print the output precision's digits exactly.
    pub fn output_precision_bits(&self) -> u32 {
        (f64::from(self.output_precision) * std::f64::consts::LOG2_10).ceil() as u32
    }

    pub fn check_precision_mode(&self) -> CheckPrecisionMode {
        self.check_precision_mode
    }

    pub fn set_check_precision_mode(&mut self, mode: CheckPrecisionMode) {
        self.check_precision_mode = mode;
    }

    pub(crate) fn should_check(&self, statistics: bool) -> bool {
        match self.check_precision_mode {
            CheckPrecisionMode::Always => true,
            CheckPrecisionMode::Never => false,
            CheckPrecisionMode::AlwaysExceptStatistics => !statistics,
        }
    }

    pub fn is_increase_precision_recommended(&self) -> bool {
        self.increase_precision_recommended
    }

    pub fn reset_increase_precision_recommended(&mut self) {
        self.increase_precision_recommended = false;
    }

    pub fn recommend_increase_precision(&mut self) {
        self.increase_precision_recommended = true;
    }

    pub(crate) fn flag(&mut self, operation: &'static str, reason: &str) {
        tracing::debug!(operation, reason, "increase of precision recommended");
        self.increase_precision_recommended = true;
    }

    /// Runs `work` with a cleared flag and reports whether it raised it.
    ///
    /// The flag raised inside `work` is merged back into the sticky flag, so
    /// callers that only poll the context see the same behaviour.
    pub fn checked<T>(&mut self, work: impl FnOnce(&mut Self) -> T) -> Checked<T> {
        let outer = std::mem::replace(&mut self.increase_precision_recommended, false);
        let value = work(self);
        let raised = self.increase_precision_recommended;
        self.increase_precision_recommended = outer || raised;
        Checked {
            value,
            increase_precision_recommended: raised,
        }
    }

    pub fn value_from_f64(&self, value: f64) -> Result<Value> {
        Value::from_f64(value, self.precision)
    }

    pub fn value_from_i64(&self, value: i64) -> Value {
        Value::from_i64(value, self.precision)
    }

    pub fn value_from_u64(&self, value: u64) -> Value {
        Value::from_u64(value, self.precision)
    }

    pub(crate) fn constant(&self, which: Constant) -> Value {
        constant(which, self.precision, self.safety_margin)
    }

    pub fn zero(&self) -> Value {
        self.constant(Constant::Zero)
    }

    pub fn one(&self) -> Value {
        self.constant(Constant::One)
    }

    pub fn plus_infinity(&self) -> Value {
        self.constant(Constant::PlusInfinity)
    }

    pub fn minus_infinity(&self) -> Value {
        self.constant(Constant::MinusInfinity)
    }

    pub fn pi(&self) -> Value {
        self.constant(Constant::Pi)
    }

    pub fn e(&self) -> Value {
        self.constant(Constant::E)
    }

    /// `a + b` at the working precision, flagging cancellation.
    pub fn add(&mut self, a: &Value, b: &Value) -> Value {
        let sum = Value::new(a.add_to(b, self.precision));
        self.check_cancellation("add", a, b, &sum);
        sum
    }

    /// `a - b` at the working precision, flagging cancellation.
    pub fn subtract(&mut self, a: &Value, b: &Value) -> Value {
        let difference = Value::new(a.add_to(&-b.float(), self.precision));
        self.check_cancellation("subtract", a, b, &difference);
        difference
    }

    pub fn multiply(&self, a: &Value, b: &Value) -> Value {
        Value::new(a.mul_to(b, self.precision))
    }

    /// `a / b` at the working precision.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Domain`] when `b` is exactly zero.
    pub fn divide(&self, a: &Value, b: &Value) -> Result<Value> {
        if b.is_zero() {
            return Err(crate::Error::domain("divide", "division by zero"));
        }
        Ok(Value::new(a.div_to(b, self.precision)))
    }

    /// Raises the flag when the leading bits of the operands cancelled so far
    /// that the result keeps fewer correct bits than printing needs.
    fn check_cancellation(&mut self, operation: &'static str, a: &Value, b: &Value, result: &Value) {
        if !self.should_check(false) {
            return;
        }
        let (Some(top_a), Some(top_b)) = (a.top_exponent(), b.top_exponent()) else {
            return;
        };
        let Some(top) = result.top_exponent() else {
            self.flag(operation, "total cancellation");
            return;
        };
        let lost = top_a.max(top_b) - top;
        let remaining = i64::from(a.precision().min(b.precision())) - lost;
        if remaining < i64::from(self.output_precision_bits()) {
            self.flag(operation, "cancellation of leading bits");
        }
    }

    pub fn standard_generator(&self) -> &Generator {
        &self.standard_generator
    }

    pub fn standard_generator_mut(&mut self) -> &mut Generator {
        &mut self.standard_generator
    }

    pub fn set_standard_generator(&mut self, generator: Generator) {
        self.standard_generator = generator;
    }

    /// Uniform draw in `[0, 1)` at the working precision.
    pub fn random_value(&mut self) -> Value {
        Value::new(self.standard_generator.random_float(self.precision))
    }

    pub fn random_i64(&mut self) -> i64 {
        self.standard_generator.random_i64()
    }
}
