//! Token grammar of generator descriptors.
//!
//! ```text
//! <seed>
//! linearCongruenceRNG <seed> standard <mode>
//! linearCongruenceRNG <seed> mod2p63 <multiplier> <increment> <mode>
//! linearCongruenceRNG <seed> specific <multiplier> <increment> <modulus> <specific-mode>
//!
//! <mode>          ::= fast | precise | intense <accepted-bits>
//! <specific-mode> ::= fast | precise | intense
//! ```
//!
//! A descriptor may be followed by further tokens; the parser reports how
//! many it consumed. On failure nothing counts as consumed.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::random::{Generator, Mode};

const LINEAR_CONGRUENCE: &str = "linearCongruenceRNG";

struct Tokens<'a, S> {
    tokens: &'a [S],
    position: usize,
}

impl<'a, S: AsRef<str>> Tokens<'a, S> {
    fn next(&mut self, expected: &str) -> Result<&'a str> {
        let token = self
            .tokens
            .get(self.position)
            .ok_or_else(|| Error::Parse(format!("missing {expected}")))?;
        self.position += 1;
        Ok(token.as_ref())
    }

    fn number<T: FromStr>(&mut self, expected: &str) -> Result<T>
    where
        T::Err: std::fmt::Display,
    {
        let token = self.next(expected)?;
        token
            .parse()
            .map_err(|e| Error::Parse(format!("invalid {expected} '{token}': {e}")))
    }

    fn mode(&mut self) -> Result<Mode> {
        match self.next("mode")? {
            "fast" => Ok(Mode::Fast),
            "precise" => Ok(Mode::Precise),
            "intense" => {
                let bits: i64 = self.number("accepted bits")?;
                Ok(Mode::Intense {
                    accepted_bits: bits.clamp(0, 64) as u32,
                })
            }
            other => Err(Error::Parse(format!("unknown mode '{other}'"))),
        }
    }

    fn specific_mode(&mut self) -> Result<Mode> {
        match self.next("mode")? {
            "fast" => Ok(Mode::Fast),
            "precise" => Ok(Mode::Precise),
            "intense" => Ok(Mode::Intense { accepted_bits: 0 }),
            other => Err(Error::Parse(format!("unknown mode '{other}'"))),
        }
    }
}

/// Parses a generator descriptor from the front of `tokens`.
///
/// Returns the generator and the number of tokens it used.
///
/// # Errors
///
/// [`Error::Parse`] for unknown keywords, malformed numbers, missing tokens
/// or a zero modulus.
///
/// # Examples
///
/// ```rust
/// use apcalc::random::parse_generator;
///
/// let tokens = ["linearCongruenceRNG", "0", "standard", "fast", "next"];
/// let (generator, used) = parse_generator(&tokens).unwrap();
/// assert_eq!(used, 4);
/// assert_eq!(generator.to_string(), "FLCRNG_2P63_Seed0000");
/// ```
pub fn parse_generator<S: AsRef<str>>(tokens: &[S]) -> Result<(Generator, usize)> {
    let mut cursor = Tokens {
        tokens,
        position: 0,
    };
    let generator = parse(&mut cursor)?;
    Ok((generator, cursor.position))
}

fn parse<S: AsRef<str>>(cursor: &mut Tokens<'_, S>) -> Result<Generator> {
    let first = cursor.next("descriptor")?;
    if first != LINEAR_CONGRUENCE {
        let seed = first
            .parse()
            .map_err(|_| Error::Parse(format!("unknown generator '{first}'")))?;
        return Ok(Generator::trivial(seed));
    }

    let seed = cursor.number("seed")?;
    match cursor.next("generator variant")? {
        "standard" => Ok(Generator::standard(seed, cursor.mode()?)),
        "mod2p63" => {
            let multiplier = cursor.number("multiplier")?;
            let increment = cursor.number("increment")?;
            Ok(Generator::mod_2p63(seed, multiplier, increment, cursor.mode()?))
        }
        "specific" => {
            let multiplier = cursor.number("multiplier")?;
            let increment = cursor.number("increment")?;
            let modulus = cursor.number("modulus")?;
            let mode = cursor.specific_mode()?;
            Generator::specific(seed, multiplier, increment, modulus, mode)
                .map_err(|e| Error::Parse(e.to_string()))
        }
        other => Err(Error::Parse(format!("unknown generator variant '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::random::{GeneratorKind, RandomSource};

    #[rstest]
    #[case(&["0"], 1)]
    #[case(&["linearCongruenceRNG", "0", "standard", "fast"], 4)]
    #[case(&["linearCongruenceRNG", "0", "mod2p63", "1571204578482947281", "12345678901234567", "fast"], 6)]
    #[case(&["linearCongruenceRNG", "0", "specific", "1571204578482947281", "12345678901234567", "9223372036854775808", "fast"], 7)]
    #[case(&["linearCongruenceRNG", "0", "standard", "precise"], 4)]
    fn test_equivalent_descriptors(#[case] tokens: &[&str], #[case] expected_used: usize) {
        let (mut generator, used) = parse_generator(tokens).unwrap();
        assert_eq!(used, expected_used);

        let mut reference = Generator::trivial(0);
        for _ in 0..10 {
            assert_eq!(generator.random_i64(), reference.random_i64());
            assert_eq!(generator.random_float(128), reference.random_float(128));
        }
    }

    #[test]
    fn test_trailing_tokens_are_left() {
        let tokens = vec!["42".to_string(), "other".to_string()];
        let (generator, used) = parse_generator(&tokens).unwrap();
        assert_eq!(used, 1);
        assert_eq!(generator.initial_seed(), 42);

        let tokens = ["linearCongruenceRNG", "1", "mod2p63", "5", "3", "intense", "12", "x"];
        let (generator, used) = parse_generator(&tokens).unwrap();
        assert_eq!(used, 7);
        assert_eq!(generator.mode(), Mode::Intense { accepted_bits: 12 });
        assert_eq!(
            generator.kind(),
            GeneratorKind::Mod2p63 {
                multiplier: 5,
                increment: 3
            }
        );
    }

    #[test]
    fn test_specific_intense() {
        let tokens = ["linearCongruenceRNG", "1", "specific", "5", "3", "1000", "intense"];
        let (generator, used) = parse_generator(&tokens).unwrap();
        assert_eq!(used, 7);
        assert!(matches!(generator.mode(), Mode::Intense { .. }));
    }

    #[rstest]
    #[case(&[])]
    #[case(&["x"])]
    #[case(&["-1"])]
    #[case(&["linearCongruenceRNG"])]
    #[case(&["linearCongruenceRNG", "0"])]
    #[case(&["linearCongruenceRNG", "zero", "standard", "fast"])]
    #[case(&["linearCongruenceRNG", "0", "standard"])]
    #[case(&["linearCongruenceRNG", "0", "standard", "slow"])]
    #[case(&["linearCongruenceRNG", "0", "standard", "intense"])]
    #[case(&["linearCongruenceRNG", "0", "unknown", "fast"])]
    #[case(&["linearCongruenceRNG", "0", "mod2p63", "5", "fast"])]
    #[case(&["linearCongruenceRNG", "0", "specific", "5", "3", "0", "fast"])]
    fn test_malformed_descriptors(#[case] tokens: &[&str]) {
        assert!(matches!(parse_generator(tokens), Err(Error::Parse(_))));
    }
}
