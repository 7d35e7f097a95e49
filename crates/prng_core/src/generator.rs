//! Linear congruential generator.
//!
//! [`Lcg`] produces the sequence x1, x2, … defined by
//! `x[i+1] = (a·x[i] + c) mod m`. The seed x0 itself is never emitted.
//! All arithmetic is exact: the product `a·x[i]` is evaluated in `u128`, so
//! any `u64` modulus is supported without overflow.
//!
//! The generator is an unbounded iterator, which lets consumers that only
//! need statistics stream the sequence instead of materialising it.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::PrngError;

/// Validated generator parameters.
///
/// # Examples
///
/// ```rust
/// use prng_core::LcgConfig;
///
/// let config = LcgConfig::new(9, 2, 0, 1).expect("valid parameters");
/// let values: Vec<u64> = config.iter().take(6).collect();
/// assert_eq!(values, vec![2, 4, 8, 7, 5, 1]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct LcgConfig {
    m: u64,
    a: u64,
    c: u64,
    x0: u64,
}

impl LcgConfig {
    /// Creates a configuration, checking every field against the modulus.
    ///
    /// # Errors
    ///
    /// Returns [`PrngError::InvalidParameter`] naming the first field that
    /// violates `m ≥ 1`, `a < m`, `c < m` or `x0 < m`.
    pub fn new(m: u64, a: u64, c: u64, x0: u64) -> Result<Self, PrngError> {
        if m == 0 {
            return Err(PrngError::invalid("m", "must be positive"));
        }
        if a >= m {
            return Err(PrngError::invalid("a", format!("must be in range [0, {m})")));
        }
        if c >= m {
            return Err(PrngError::invalid("c", format!("must be in range [0, {m})")));
        }
        if x0 >= m {
            return Err(PrngError::invalid("x0", format!("must be in range [0, {m})")));
        }
        Ok(Self { m, a, c, x0 })
    }

    /// Modulus `m`.
    #[inline]
    pub fn modulus(&self) -> u64 {
        self.m
    }

    /// Multiplier `a`.
    #[inline]
    pub fn multiplier(&self) -> u64 {
        self.a
    }

    /// Increment `c`.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.c
    }

    /// Seed `x0`.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.x0
    }

    /// Applies the recurrence once.
    #[inline]
    pub fn step(&self, x: u64) -> u64 {
        let next = (u128::from(self.a) * u128::from(x) + u128::from(self.c)) % u128::from(self.m);
        // next < m ≤ u64::MAX
        next as u64
    }

    /// Returns a fresh generator positioned at the seed.
    #[inline]
    pub fn iter(&self) -> Lcg {
        Lcg::new(*self)
    }

    /// Checks that the configuration can generate `count` values.
    ///
    /// # Errors
    ///
    /// `m` must exceed 1 and `count` must be positive.
    pub fn check_generation(&self, count: u64) -> Result<(), PrngError> {
        if self.m <= 1 {
            return Err(PrngError::invalid("m", "must be greater than 1"));
        }
        if count == 0 {
            return Err(PrngError::invalid("count", "must be positive"));
        }
        Ok(())
    }
}

/// Streaming linear congruential generator.
///
/// Yields x1, x2, … forever; bound it with [`Iterator::take`].
#[derive(Clone, Debug)]
pub struct Lcg {
    config: LcgConfig,
    state: u64,
}

impl Lcg {
    /// Creates a generator positioned at the seed.
    pub fn new(config: LcgConfig) -> Self {
        Self {
            state: config.x0,
            config,
        }
    }

    /// Advances the generator and returns the new state.
    #[inline]
    pub fn next_value(&mut self) -> u64 {
        self.state = self.config.step(self.state);
        self.state
    }

    /// The most recently produced value (the seed before the first call).
    #[inline]
    pub fn state(&self) -> u64 {
        self.state
    }

    /// Parameters this generator runs with.
    #[inline]
    pub fn config(&self) -> &LcgConfig {
        &self.config
    }

    /// Rewinds to the seed.
    pub fn reset(&mut self) {
        self.state = self.config.x0;
    }
}

impl Iterator for Lcg {
    type Item = u64;

    #[inline]
    fn next(&mut self) -> Option<u64> {
        Some(self.next_value())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

impl std::iter::FusedIterator for Lcg {}

/// Generates `count` successive values x1..x_count.
///
/// # Errors
///
/// Returns [`PrngError::InvalidParameter`] when `m ≤ 1` or `count == 0`.
///
/// # Examples
///
/// ```rust
/// use prng_core::{generate, LcgConfig};
///
/// let config = LcgConfig::new(9, 2, 0, 1).unwrap();
/// let sequence = generate(&config, 10).unwrap();
/// assert_eq!(sequence, vec![2, 4, 8, 7, 5, 1, 2, 4, 8, 7]);
/// ```
pub fn generate(config: &LcgConfig, count: usize) -> Result<Vec<u64>, PrngError> {
    config.check_generation(count as u64)?;
    Ok(config.iter().take(count).collect())
}

/// Number of most frequent values reported in [`SequenceStatistics`].
pub const TOP_FREQUENCIES: usize = 10;

/// Occurrence count of a single value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ValueFrequency {
    pub value: u64,
    pub occurrences: u64,
}

/// Descriptive statistics of a generated sequence.
///
/// Variance is the population variance (divided by `count`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SequenceStatistics {
    pub count: u64,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
    pub min: u64,
    pub max: u64,
    pub unique_values: u64,
    /// Most frequent values, by occurrences descending then value ascending.
    pub frequency_top10: Vec<ValueFrequency>,
}

impl SequenceStatistics {
    /// Computes statistics in a single pass. Returns `None` for an empty input.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut count = 0u64;
        let mut mean = 0.0_f64;
        let mut m2 = 0.0_f64;
        let mut min = u64::MAX;
        let mut max = 0u64;
        let mut frequencies: HashMap<u64, u64> = HashMap::new();

        for value in values {
            count += 1;
            let x = value as f64;
            // Welford update
            let delta = x - mean;
            mean += delta / count as f64;
            m2 += delta * (x - mean);
            min = min.min(value);
            max = max.max(value);
            *frequencies.entry(value).or_insert(0) += 1;
        }

        if count == 0 {
            return None;
        }

        let variance = m2 / count as f64;
        let unique_values = frequencies.len() as u64;

        Some(Self {
            count,
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
            unique_values,
            frequency_top10: top_frequencies(frequencies),
        })
    }
}

fn top_frequencies(frequencies: HashMap<u64, u64>) -> Vec<ValueFrequency> {
    let mut entries: Vec<ValueFrequency> = frequencies
        .into_iter()
        .map(|(value, occurrences)| ValueFrequency { value, occurrences })
        .collect();

    let order = |a: &ValueFrequency, b: &ValueFrequency| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| a.value.cmp(&b.value))
    };

    if entries.len() > TOP_FREQUENCIES {
        entries.select_nth_unstable_by(TOP_FREQUENCIES - 1, order);
        entries.truncate(TOP_FREQUENCIES);
    }
    entries.sort_unstable_by(order);
    entries
}
