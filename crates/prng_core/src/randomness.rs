//! Frequency (monobit) and runs tests.
//!
//! Each generated value contributes exactly one bit, chosen by [`BitRule`],
//! so a sequence of `n` values yields a bitstream of length `n`. Both tests
//! are computed from a single streaming pass ([`BitTally`]).
//!
//! A test that is undefined for the given stream (empty, constant, …) is
//! reported as [`TestOutcome::Undefined`] instead of failing the request,
//! so the other test still renders.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrngError;

/// χ² critical value for one degree of freedom at 5 % significance.
pub const CHI_SQUARE_CRITICAL: f64 = 3.841;

/// Two-tailed critical z-value at 5 % significance.
pub const Z_CRITICAL: f64 = 1.96;

/// How a value in `[0, m)` is reduced to a single bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitRule {
    /// 1 when the value lies in the upper half of the range (`2·x ≥ m`).
    #[default]
    Threshold,
    /// Lowest bit of the value.
    Parity,
}

impl BitRule {
    /// Bit for `value` under modulus `modulus`.
    #[inline]
    pub fn bit(&self, value: u64, modulus: u64) -> bool {
        match self {
            BitRule::Threshold => 2 * u128::from(value) >= u128::from(modulus),
            BitRule::Parity => value & 1 == 1,
        }
    }

    /// Request/response name of the rule.
    pub fn as_str(&self) -> &'static str {
        match self {
            BitRule::Threshold => "threshold",
            BitRule::Parity => "parity",
        }
    }
}

impl FromStr for BitRule {
    type Err = PrngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "threshold" | "half" => Ok(BitRule::Threshold),
            "parity" | "lsb" => Ok(BitRule::Parity),
            _ => Err(PrngError::invalid(
                "bit_rule",
                format!("unknown rule '{s}', expected 'threshold' or 'parity'"),
            )),
        }
    }
}

impl std::fmt::Display for BitRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a sub-test, or the reason it could not be computed.
///
/// Serialises either as the result object itself or as `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TestOutcome<T> {
    Computed(T),
    Undefined { error: String },
}

impl<T> TestOutcome<T> {
    fn undefined(reason: &str) -> Self {
        TestOutcome::Undefined {
            error: reason.to_string(),
        }
    }

    /// The computed result, if any.
    pub fn computed(&self) -> Option<&T> {
        match self {
            TestOutcome::Computed(result) => Some(result),
            TestOutcome::Undefined { .. } => None,
        }
    }

    /// Why the test could not be computed, if it could not.
    pub fn error(&self) -> Option<&str> {
        match self {
            TestOutcome::Computed(_) => None,
            TestOutcome::Undefined { error } => Some(error),
        }
    }
}

/// Monobit test result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrequencyResult {
    pub ones_count: u64,
    pub zeros_count: u64,
    pub ones_ratio: f64,
    pub zeros_ratio: f64,
    pub chi_square: f64,
    pub is_random: bool,
}

/// Runs test result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunsResult {
    pub runs: u64,
    pub expected_runs: f64,
    pub variance: f64,
    pub z_statistic: f64,
    pub is_random: bool,
}

/// Counts gathered in one pass over a bitstream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitTally {
    ones: u64,
    zeros: u64,
    runs: u64,
    last: Option<bool>,
}

impl BitTally {
    /// Adds the next bit of the stream.
    #[inline]
    pub fn push(&mut self, bit: bool) {
        if bit {
            self.ones += 1;
        } else {
            self.zeros += 1;
        }
        if self.last != Some(bit) {
            self.runs += 1;
        }
        self.last = Some(bit);
    }

    /// Stream length.
    pub fn len(&self) -> u64 {
        self.ones + self.zeros
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monobit test over the tallied stream.
    pub fn frequency(&self) -> TestOutcome<FrequencyResult> {
        if self.is_empty() {
            return TestOutcome::undefined("empty bit sequence");
        }

        let n = self.len() as f64;
        let half = n / 2.0;
        let ones = self.ones as f64;
        let zeros = self.zeros as f64;
        let chi_square = ((ones - half).powi(2) + (zeros - half).powi(2)) / half;

        TestOutcome::Computed(FrequencyResult {
            ones_count: self.ones,
            zeros_count: self.zeros,
            ones_ratio: ones / n,
            zeros_ratio: zeros / n,
            chi_square,
            is_random: chi_square < CHI_SQUARE_CRITICAL,
        })
    }

    /// Wald–Wolfowitz runs test over the tallied stream.
    pub fn runs(&self) -> TestOutcome<RunsResult> {
        if self.len() < 2 {
            return TestOutcome::undefined("sequence too short for a runs test");
        }
        if self.ones == 0 || self.zeros == 0 {
            return TestOutcome::undefined("all bits are identical");
        }

        let n = self.len() as f64;
        let product = 2.0 * self.ones as f64 * self.zeros as f64;
        let expected_runs = product / n + 1.0;
        let variance = product * (product - n) / (n * n * (n - 1.0));
        if variance <= 0.0 {
            return TestOutcome::undefined("runs variance is not positive");
        }

        let z_statistic = (self.runs as f64 - expected_runs) / variance.sqrt();

        TestOutcome::Computed(RunsResult {
            runs: self.runs,
            expected_runs,
            variance,
            z_statistic,
            is_random: z_statistic.abs() < Z_CRITICAL,
        })
    }
}

impl FromIterator<bool> for BitTally {
    fn from_iter<I: IntoIterator<Item = bool>>(bits: I) -> Self {
        let mut tally = BitTally::default();
        for bit in bits {
            tally.push(bit);
        }
        tally
    }
}

/// Monobit test over an explicit bitstream.
pub fn frequency_test<I: IntoIterator<Item = bool>>(bits: I) -> TestOutcome<FrequencyResult> {
    bits.into_iter().collect::<BitTally>().frequency()
}

/// Runs test over an explicit bitstream.
pub fn runs_test<I: IntoIterator<Item = bool>>(bits: I) -> TestOutcome<RunsResult> {
    bits.into_iter().collect::<BitTally>().runs()
}

/// Both tests for one sequence.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RandomnessResult {
    pub frequency: TestOutcome<FrequencyResult>,
    pub runs: TestOutcome<RunsResult>,
}

impl RandomnessResult {
    /// True only when both tests were computed and both judged the stream random.
    pub fn overall_passed(&self) -> bool {
        let frequency = self.frequency.computed().is_some_and(|f| f.is_random);
        let runs = self.runs.computed().is_some_and(|r| r.is_random);
        frequency && runs
    }
}

/// Derives one bit per value and runs both tests in a single pass.
///
/// # Examples
///
/// ```rust
/// use prng_core::{test_randomness, BitRule, LcgConfig};
///
/// let config = LcgConfig::new(9, 2, 0, 1).unwrap();
/// let result = test_randomness(config.iter().take(12), 9, BitRule::Threshold);
/// assert!(result.frequency.computed().is_some());
/// ```
pub fn test_randomness<I>(values: I, modulus: u64, rule: BitRule) -> RandomnessResult
where
    I: IntoIterator<Item = u64>,
{
    let tally: BitTally = values
        .into_iter()
        .map(|value| rule.bit(value, modulus))
        .collect();

    RandomnessResult {
        frequency: tally.frequency(),
        runs: tally.runs(),
    }
}
