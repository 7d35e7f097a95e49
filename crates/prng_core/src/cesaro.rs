//! Monte Carlo estimation of π.
//!
//! Two estimators are available through [`CesaroMethod`]:
//!
//! - **Quarter circle**: pairs `(u, v)` drawn from the unit square are tested
//!   against `u² + v² ≤ 1` (boundary inclusive), giving `π ≈ 4·hits/pairs`.
//! - **Coprime** (Cesàro's theorem): two random integers are coprime with
//!   probability `6/π²`, giving `π ≈ √(6·pairs/hits)`.
//!
//! The same estimator runs over the LCG and over a reference uniform source
//! ([`SystemSource`]) so the two can be compared on equal terms.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::PrngError;
use crate::generator::{Lcg, LcgConfig};

/// A running estimate is recorded every this many pairs.
pub const HISTORY_INTERVAL: u64 = 100;

/// Number of most recent running estimates kept in [`PiEstimate::pi_history`].
pub const HISTORY_LEN: usize = 20;

/// Largest integer drawn by [`SystemSource::next_integer`] (2³¹ − 1).
pub const SYSTEM_INTEGER_MAX: u64 = (1 << 31) - 1;

/// A source of uniform draws for the estimators.
pub trait RandomSource {
    /// Next value in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Next raw integer draw.
    fn next_integer(&mut self) -> u64;
}

impl RandomSource for Lcg {
    /// Normalises `x` to `x / m`.
    #[inline]
    fn next_unit(&mut self) -> f64 {
        let modulus = self.config().modulus() as f64;
        self.next_value() as f64 / modulus
    }

    #[inline]
    fn next_integer(&mut self) -> u64 {
        self.next_value()
    }
}

/// Reference uniform source backed by [`StdRng`].
pub struct SystemSource {
    inner: StdRng,
    seed: Option<u64>,
}

impl SystemSource {
    /// Creates a reproducible source.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Creates a source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Seed used for initialisation, if any.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl RandomSource for SystemSource {
    #[inline]
    fn next_unit(&mut self) -> f64 {
        self.inner.gen()
    }

    /// Draws from `[1, 2³¹ − 1]`.
    #[inline]
    fn next_integer(&mut self) -> u64 {
        self.inner.gen_range(1..=SYSTEM_INTEGER_MAX)
    }
}

/// Which π estimator to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CesaroMethod {
    #[default]
    QuarterCircle,
    Coprime,
}

impl CesaroMethod {
    fn sample<S: RandomSource + ?Sized>(&self, source: &mut S) -> bool {
        match self {
            CesaroMethod::QuarterCircle => {
                let u = source.next_unit();
                let v = source.next_unit();
                u * u + v * v <= 1.0
            }
            CesaroMethod::Coprime => {
                let x = source.next_integer();
                let y = source.next_integer();
                gcd(x, y) == 1
            }
        }
    }

    /// π estimate after `hits` successes in `pairs` trials.
    ///
    /// `None` when the coprime estimator has not seen a single coprime pair.
    fn estimate(&self, hits: u64, pairs: u64) -> Option<f64> {
        let ratio = hits as f64 / pairs as f64;
        match self {
            CesaroMethod::QuarterCircle => Some(4.0 * ratio),
            CesaroMethod::Coprime if hits == 0 => None,
            CesaroMethod::Coprime => Some((6.0 / ratio).sqrt()),
        }
    }

    /// Request/response name of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            CesaroMethod::QuarterCircle => "quarter_circle",
            CesaroMethod::Coprime => "coprime",
        }
    }
}

impl FromStr for CesaroMethod {
    type Err = PrngError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quarter_circle" | "circle" | "monte_carlo" => Ok(CesaroMethod::QuarterCircle),
            "coprime" | "gcd" | "cesaro" => Ok(CesaroMethod::Coprime),
            _ => Err(PrngError::invalid(
                "method",
                format!("unknown method '{s}', expected 'quarter_circle' or 'coprime'"),
            )),
        }
    }
}

impl std::fmt::Display for CesaroMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// π estimate from one source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PiEstimate {
    pub pi_estimate: f64,
    /// Absolute deviation `|π − pi_estimate|`.
    pub error: f64,
    pub error_percentage: f64,
    /// Running estimates, oldest first.
    pub pi_history: Vec<f64>,
}

impl PiEstimate {
    fn new(pi_estimate: f64, pi_history: Vec<f64>) -> Self {
        let error = (PI - pi_estimate).abs();
        Self {
            pi_estimate,
            error,
            error_percentage: error / PI * 100.0,
            pi_history,
        }
    }
}

/// Estimates π from `num_pairs` pairs drawn from `source`.
///
/// # Errors
///
/// Returns [`PrngError::InvalidParameter`] when `num_pairs` is zero.
pub fn estimate_pi<S>(
    source: &mut S,
    num_pairs: u64,
    method: CesaroMethod,
) -> Result<PiEstimate, PrngError>
where
    S: RandomSource + ?Sized,
{
    if num_pairs == 0 {
        return Err(PrngError::invalid("num_pairs", "must be positive"));
    }

    let mut hits = 0u64;
    let mut history: VecDeque<f64> = VecDeque::with_capacity(HISTORY_LEN + 1);

    for pair in 1..=num_pairs {
        if method.sample(source) {
            hits += 1;
        }
        if pair % HISTORY_INTERVAL == 0 {
            if let Some(running) = method.estimate(hits, pair) {
                history.push_back(running);
                if history.len() > HISTORY_LEN {
                    history.pop_front();
                }
            }
        }
    }

    let estimate = method.estimate(hits, num_pairs).unwrap_or(0.0);
    Ok(PiEstimate::new(estimate, history.into()))
}

/// Side-by-side estimates for the LCG and the reference source.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CesaroResult {
    pub our_generator: PiEstimate,
    pub system_generator: PiEstimate,
    pub actual_pi: f64,
    pub num_pairs: u64,
    pub method: CesaroMethod,
}

/// Runs the same estimator over the LCG and over `system`.
///
/// # Errors
///
/// Fails when the configuration cannot generate (`m ≤ 1`) or when
/// `num_pairs` is zero.
pub fn compare(
    config: &LcgConfig,
    num_pairs: u64,
    method: CesaroMethod,
    system: &mut SystemSource,
) -> Result<CesaroResult, PrngError> {
    config.check_generation(num_pairs.saturating_mul(2))?;

    let our_generator = estimate_pi(&mut config.iter(), num_pairs, method)?;
    let system_generator = estimate_pi(system, num_pairs, method)?;

    Ok(CesaroResult {
        our_generator,
        system_generator,
        actual_pi: PI,
        num_pairs,
        method,
    })
}

/// Greatest common divisor (Euclid). `gcd(0, 0) == 0`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}
