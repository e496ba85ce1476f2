//! # Random Engine
//!
//! Deterministic linear-congruential generators
//! `state = (multiplier * state + increment) mod modulus`.
//!
//! Every generator yields both a signed 64-bit integer and a uniform
//! arbitrary precision value in `[0, 1)` from the same state advance, so two
//! generators built from identical descriptors and driven by the same calls
//! produce bit-identical output.
//!
//! ## Variants
//!
//! - [`GeneratorKind::Trivial`]: seed-only descriptor, default constants.
//! - [`GeneratorKind::Standard`]: default constants, modulus `2^63`.
//! - [`GeneratorKind::Mod2p63`]: caller constants, modulus `2^63`.
//! - [`GeneratorKind::Specific`]: caller constants and modulus (at most `2^63`).
//!
//! [`Mode`] only selects how the advance is evaluated; `Fast` and `Precise`
//! give the same sequence.
//!
//! ## Examples
//!
//! ```rust
//! use apcalc::random::{Generator, Mode, RandomSource};
//!
//! let mut a = Generator::trivial(7);
//! let mut b = Generator::standard(7, Mode::Precise);
//! assert_eq!(a.random_i64(), b.random_i64());
//! assert_eq!(a.random_float(128), b.random_float(128));
//! ```

use std::fmt::Display;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::error::{Error, Result};
use crate::float::Float;

pub mod parse;

pub use parse::parse_generator;

/// Multiplier of the default generator.
pub const DEFAULT_MULTIPLIER: u64 = 1_571_204_578_482_947_281;
/// Increment of the default generator.
pub const DEFAULT_INCREMENT: u64 = 12_345_678_901_234_567;
/// Largest accepted modulus, `2^63`.
pub const MAX_MODULUS: u64 = 1 << 63;

const MASK_63: u64 = MAX_MODULUS - 1;

/// Source of uniformly distributed draws.
pub trait RandomSource {
    /// Advances the state and returns it as a signed integer.
    fn random_i64(&mut self) -> i64;

    /// Advances the state and returns a uniform value in `[0, 1)` truncated
    /// to `precision` bits.
    fn random_float(&mut self, precision: u32) -> Float;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorKind {
    Trivial,
    Standard,
    Mod2p63 {
        multiplier: u64,
        increment: u64,
    },
    Specific {
        multiplier: u64,
        increment: u64,
        modulus: u64,
    },
}

/// Evaluation strategy of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Native 64-bit arithmetic.
    #[default]
    Fast,
    /// Exact 128-bit modular arithmetic.
    Precise,
    /// Precise advance; floats are assembled from `accepted_bits` of several draws.
    Intense { accepted_bits: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    kind: GeneratorKind,
    mode: Mode,
    initial_seed: u64,
    seed: u64,
}

impl Generator {
    /// Generator of the seed-only descriptor.
    pub fn trivial(seed: u64) -> Self {
        Self::with_kind(GeneratorKind::Trivial, seed, Mode::Fast)
    }

    pub fn standard(seed: u64, mode: Mode) -> Self {
        Self::with_kind(GeneratorKind::Standard, seed, mode)
    }

    pub fn mod_2p63(seed: u64, multiplier: u64, increment: u64, mode: Mode) -> Self {
        Self::with_kind(
            GeneratorKind::Mod2p63 {
                multiplier,
                increment,
            },
            seed,
            mode,
        )
    }

    /// Generator with a caller-chosen modulus.
    ///
    /// Moduli above `2^63` are clamped to `2^63`. The multiplier, increment and
    /// seed are reduced modulo the modulus. In intense mode the accepted bits
    /// per draw follow from the modulus.
    ///
    /// # Errors
    ///
    /// [`Error::Domain`] for a zero modulus.
    pub fn specific(
        seed: u64,
        multiplier: u64,
        increment: u64,
        modulus: u64,
        mode: Mode,
    ) -> Result<Self> {
        if modulus == 0 {
            return Err(Error::domain("specific generator", "modulus must be positive"));
        }
        let modulus = if modulus > MAX_MODULUS {
            tracing::warn!(modulus, "generator modulus too large, using 2^63");
            MAX_MODULUS
        } else {
            modulus
        };
        let mode = match mode {
            Mode::Intense { .. } => Mode::Intense {
                accepted_bits: bits_per_draw(modulus),
            },
            other => other,
        };
        let kind = GeneratorKind::Specific {
            multiplier: multiplier % modulus,
            increment: increment % modulus,
            modulus,
        };
        Ok(Self {
            kind,
            mode,
            initial_seed: seed % modulus,
            seed: seed % modulus,
        })
    }

    fn with_kind(kind: GeneratorKind, seed: u64, mode: Mode) -> Self {
        let mode = match mode {
            Mode::Intense { accepted_bits } if !(1..=63).contains(&accepted_bits) => {
                let clamped = accepted_bits.clamp(1, 63);
                tracing::warn!(accepted_bits, clamped, "invalid number of accepted bits");
                Mode::Intense {
                    accepted_bits: clamped,
                }
            }
            other => other,
        };
        let seed = seed & MASK_63;
        Self {
            kind,
            mode,
            initial_seed: seed,
            seed,
        }
    }

    pub fn kind(&self) -> GeneratorKind {
        self.kind
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn initial_seed(&self) -> u64 {
        self.initial_seed
    }

    /// Current state.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restores a previously saved state.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = seed % self.modulus();
    }

    /// Rewinds to the initial seed.
    pub fn reset(&mut self) {
        self.seed = self.initial_seed;
    }

    pub fn modulus(&self) -> u64 {
        match self.kind {
            GeneratorKind::Specific { modulus, .. } => modulus,
            _ => MAX_MODULUS,
        }
    }

    fn constants(&self) -> (u64, u64) {
        match self.kind {
            GeneratorKind::Trivial | GeneratorKind::Standard => {
                (DEFAULT_MULTIPLIER, DEFAULT_INCREMENT)
            }
            GeneratorKind::Mod2p63 {
                multiplier,
                increment,
            }
            | GeneratorKind::Specific {
                multiplier,
                increment,
                ..
            } => (multiplier, increment),
        }
    }

    fn advance(&mut self) -> u64 {
        let (multiplier, increment) = self.constants();
        let modulus = self.modulus();
        self.seed = match (self.mode, modulus == MAX_MODULUS) {
            (Mode::Fast, true) => {
                self.seed.wrapping_mul(multiplier).wrapping_add(increment) & MASK_63
            }
            (Mode::Fast, false) => add_mul_mod(increment, multiplier, self.seed, modulus),
            _ => {
                let next = u128::from(multiplier) * u128::from(self.seed) + u128::from(increment);
                (next % u128::from(modulus)) as u64
            }
        };
        self.seed
    }

    /// Uniform value assembled from several draws.
    ///
    /// Each step maps `value` to `(draw + value) / base`; the sum is kept as an
    /// exact fraction over `base^steps`.
    fn intense_float(&mut self, accepted_bits: u32, precision: u32) -> Float {
        let (base, steps, shift) = match self.kind {
            GeneratorKind::Specific { modulus, .. } => {
                (BigInt::from(modulus), precision / accepted_bits + 1, 0)
            }
            _ => (
                BigInt::one() << accepted_bits,
                precision.div_ceil(accepted_bits),
                63 - accepted_bits,
            ),
        };
        let mut numerator = BigInt::zero();
        let mut denominator = BigInt::one();
        for _ in 0..steps {
            let draw = self.advance() >> shift;
            numerator += &denominator * draw;
            denominator *= &base;
        }
        truncated_ratio(numerator, &denominator, precision)
    }
}

/// `numerator / denominator` truncated toward zero to `precision` bits, so a
/// ratio below one stays below one.
fn truncated_ratio(numerator: BigInt, denominator: &BigInt, precision: u32) -> Float {
    if numerator.is_zero() {
        return Float::zero(precision);
    }
    let precision = precision.max(Float::MIN_PRECISION);
    // A nonzero ratio is at least 1 / denominator, so the quotient keeps
    // more than `precision` significant bits.
    let shift = u64::from(precision) + denominator.bits() + 1;
    let quotient = (numerator << shift) / denominator;
    let excess = quotient.bits().saturating_sub(u64::from(precision));
    Float::new(quotient >> excess, excess as i64 - shift as i64, precision)
}

/// `(increment + multiplier * seed) mod modulus` with doubling, never
/// exceeding 64 bits for moduli up to `2^63`.
fn add_mul_mod(increment: u64, multiplier: u64, seed: u64, modulus: u64) -> u64 {
    let mut result = increment;
    let mut addend = seed;
    let mut remaining = multiplier;
    while remaining > 0 {
        if remaining % 2 == 1 {
            result += addend;
            if result >= modulus {
                result -= modulus;
            }
        }
        addend += addend;
        if addend >= modulus {
            addend -= modulus;
        }
        remaining /= 2;
    }
    result
}

/// Bits one draw contributes to an intense float of a specific generator.
fn bits_per_draw(modulus: u64) -> u32 {
    let mut bits = 1;
    while bits < 63 && (modulus >> (bits + 1)) > 0 {
        bits += 1;
    }
    bits
}

impl RandomSource for Generator {
    fn random_i64(&mut self) -> i64 {
        self.advance() as i64
    }

    fn random_float(&mut self, precision: u32) -> Float {
        if let Mode::Intense { accepted_bits } = self.mode {
            return self.intense_float(accepted_bits, precision);
        }
        let draw = BigInt::from(self.advance());
        truncated_ratio(draw, &BigInt::from(self.modulus()), precision)
    }
}

impl Default for Generator {
    /// The fast default-constant generator with seed 0.
    fn default() -> Self {
        Self::standard(0, Mode::Fast)
    }
}

impl Display for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.mode {
            Mode::Fast => 'F',
            Mode::Precise => 'P',
            Mode::Intense { .. } => 'I',
        };
        let range = match self.kind {
            GeneratorKind::Specific { .. } => "",
            _ => "_2P63",
        };
        write!(f, "{prefix}LCRNG{range}_Seed{:04}", self.initial_seed)
    }
}
