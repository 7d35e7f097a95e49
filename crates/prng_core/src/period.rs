//! Period detection for linear congruential generators.
//!
//! The generator is iterated from the seed while every visited state is
//! recorded together with the index at which it first appeared. The first
//! revisited state closes the cycle: `period = index − first_index`.
//!
//! Running out of iterations is an expected outcome for poorly chosen
//! parameters and is reported as `found = false`, never as an error.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use serde::Serialize;

use crate::generator::LcgConfig;

/// Lower bound (percent of `m`) for [`PeriodQuality::Excellent`].
pub const EXCELLENT_THRESHOLD: f64 = 90.0;

/// Lower bound (percent of `m`) for [`PeriodQuality::Good`].
pub const GOOD_THRESHOLD: f64 = 50.0;

/// Upper bound on the pre-allocated size of the visited-state map.
const INITIAL_CAPACITY_LIMIT: u64 = 1 << 20;

/// Quality band of a period relative to the modulus.
///
/// | Band        | Percentage of `m` |
/// |-------------|-------------------|
/// | `Excellent` | ≥ 90 %            |
/// | `Good`      | ≥ 50 %, < 90 %    |
/// | `Poor`      | < 50 % or no period found |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum PeriodQuality {
    Excellent,
    Good,
    Poor,
}

impl PeriodQuality {
    /// Classifies a period expressed as a percentage of the modulus.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= EXCELLENT_THRESHOLD {
            PeriodQuality::Excellent
        } else if percentage >= GOOD_THRESHOLD {
            PeriodQuality::Good
        } else {
            PeriodQuality::Poor
        }
    }

    /// Label shown by the lab UI.
    pub fn label_uk(&self) -> &'static str {
        match self {
            PeriodQuality::Excellent => "Відмінно",
            PeriodQuality::Good => "Добре",
            PeriodQuality::Poor => "Погано",
        }
    }
}

impl std::fmt::Display for PeriodQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodQuality::Excellent => write!(f, "Excellent"),
            PeriodQuality::Good => write!(f, "Good"),
            PeriodQuality::Poor => write!(f, "Poor"),
        }
    }
}

/// Outcome of a period search.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodResult {
    /// Cycle length, `None` when no state repeated within the cap.
    pub period: Option<u64>,
    pub found: bool,
    /// Index of the first state that belongs to the cycle (x0 has index 0).
    pub cycle_start: Option<u64>,
    /// Number of recurrence steps performed.
    pub iterations: u64,
    pub max_possible_period: u64,
    pub percentage: f64,
    /// Serialised as `quality_band`; `quality` on the wire is the UI label.
    #[serde(rename = "quality_band")]
    pub quality: PeriodQuality,
}

impl PeriodResult {
    fn found(period: u64, cycle_start: u64, iterations: u64, modulus: u64) -> Self {
        let percentage = period as f64 / modulus as f64 * 100.0;
        Self {
            period: Some(period),
            found: true,
            cycle_start: Some(cycle_start),
            iterations,
            max_possible_period: modulus,
            percentage,
            quality: PeriodQuality::from_percentage(percentage),
        }
    }

    fn not_found(iterations: u64, modulus: u64) -> Self {
        Self {
            period: None,
            found: false,
            cycle_start: None,
            iterations,
            max_possible_period: modulus,
            percentage: 0.0,
            quality: PeriodQuality::Poor,
        }
    }
}

/// Finds the cycle length of the generator within `max_iterations` steps.
///
/// # Examples
///
/// ```rust
/// use prng_core::{find_period, LcgConfig, PeriodQuality};
///
/// let config = LcgConfig::new(9, 2, 0, 1).unwrap();
/// let result = find_period(&config, 1_000);
/// assert_eq!(result.period, Some(6));
/// assert_eq!(result.max_possible_period, 9);
/// assert_eq!(result.quality, PeriodQuality::Good);
/// ```
pub fn find_period(config: &LcgConfig, max_iterations: u64) -> PeriodResult {
    let modulus = config.modulus();
    if modulus == 1 {
        return PeriodResult::found(1, 0, 0, modulus);
    }

    let capacity = max_iterations.min(modulus).min(INITIAL_CAPACITY_LIMIT) as usize;
    let mut seen: HashMap<u64, u64> = HashMap::with_capacity(capacity);
    seen.insert(config.seed(), 0);

    let mut state = config.seed();
    for index in 1..=max_iterations {
        state = config.step(state);
        match seen.entry(state) {
            Entry::Occupied(first) => {
                let start = *first.get();
                return PeriodResult::found(index - start, start, index, modulus);
            }
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
        }
    }

    PeriodResult::not_found(max_iterations, modulus)
}
