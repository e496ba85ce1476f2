//! # apcalc
//!
//! Arbitrary precision calculation engine: binary floating-point values with a
//! per-value mantissa precision, a precision context that adds guard bits to
//! every transcendental function, and deterministic random number generators.
//!
//! ## Overview
//!
//! apcalc provides:
//! - **Value Store**: immutable, reference-counted [`Value`] handles with a
//!   per-thread live/cached accounting and a cache of canonical constants
//! - **Precision Context**: working precision, safety margin, output precision
//!   and a sticky *increase precision recommended* flag
//! - **Transcendental Library**: sin/cos/tan, arcsin/arccos/arctan, exp, log,
//!   integer and real powers, Gaussian sampling
//! - **Random Engine**: linear congruential generators with fast, precise and
//!   intense modes, configured from token descriptors
//!
//! ## Quick Start
//!
//! ```rust
//! use apcalc::prelude::*;
//!
//! let mut ctx = Context::new();
//! ctx.set_initial_precision(128);
//!
//! let x = ctx.value_from_f64(0.5).unwrap();
//! let sin = ctx.sin(&x).unwrap();
//! let asin = ctx.arcsin(&sin).unwrap();
//! assert!((asin.to_f64() - 0.5).abs() < 1e-30);
//! assert!(!ctx.is_increase_precision_recommended());
//! ```
//!
//! ## Random Numbers
//!
//! ```rust
//! use apcalc::prelude::*;
//!
//! let tokens = ["linearCongruenceRNG", "7", "standard", "precise"];
//! let (mut generator, used) = parse_generator(&tokens).unwrap();
//! assert_eq!(used, tokens.len());
//!
//! let u = generator.random_float(64);
//! assert!(u >= 0.0 && u < 1.0);
//! ```

pub mod context;
pub mod error;
pub mod float;
pub mod math;
pub mod random;
pub mod store;

// Re-export the main types for convenience
pub use context::{CheckPrecisionMode, Checked, Context};
pub use error::{Error, Result};
pub use float::Float;
pub use random::{Generator, GeneratorKind, Mode, RandomSource, parse_generator};
pub use store::{Constant, Value};

pub mod prelude {
    //! Prelude module for apcalc.
    //!
    //! Re-exports the types most programs need, so a single glob import is
    //! enough for everyday use.

    pub use crate::context::{CheckPrecisionMode, Checked, Context};
    pub use crate::error::{Error, Result};
    pub use crate::float::Float;
    pub use crate::random::{Generator, Mode, RandomSource, parse_generator};
    pub use crate::store::Value;
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rstest::fixture;

    const EPSILON: f64 = 1e-8;
    static SEED: OnceLock<u64> = OnceLock::new();

    #[fixture]
    pub const fn n_experiments() -> usize {
        100_000
    }

    #[fixture]
    pub fn seed() -> u64 {
        *SEED.get_or_init(|| rand::rng().random())
    }

    #[fixture]
    pub fn rng(n_experiments: usize, seed: u64) -> impl Rng {
        println!("{} experiments with seed {}", n_experiments, seed);
        StdRng::seed_from_u64(seed)
    }

    #[track_caller]
    pub fn assert_almost_eq(a: f64, b: f64, message: &str) {
        let diff = (a - b).abs() / a.abs().max(b.abs()).max(1e-10);
        assert!(
            diff <= EPSILON,
            "{message}: {a:.5e} vs {b:.5e} ({diff:.2e} > {EPSILON:.2e})",
        );
    }

    pub fn random_f64(mut rng: impl Rng) -> f64 {
        loop {
            let float = f64::from_bits(rng.random());
            if float.is_finite() {
                return float;
            }
        }
    }

    /// Error function, Abramowitz and Stegun 7.1.26 (absolute error below 1.5e-7).
    pub fn erf(x: f64) -> f64 {
        let a1 = 0.254829592;
        let a2 = -0.284496736;
        let a3 = 1.421413741;
        let a4 = -1.453152027;
        let a5 = 1.061405429;
        let p = 0.3275911;

        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let x = x.abs();

        let t = 1.0 / (1.0 + p * x);
        let y = 1.0 - (((((a5 * t + a4) * t) + a3) * t + a2) * t + a1) * t * (-x * x).exp();

        sign * y
    }
}
