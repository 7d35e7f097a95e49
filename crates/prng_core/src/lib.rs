//! # prng_core
//!
//! Linear congruential generator together with the tools used to judge it:
//!
//! - [`generator`]: the recurrence `x[n+1] = (a·x[n] + c) mod m`, sequences
//!   and descriptive statistics
//! - [`period`]: cycle detection with a quality band relative to `m`
//! - [`cesaro`]: π estimation from pairs of uniforms, compared with a
//!   reference source
//! - [`randomness`]: frequency (monobit χ²) and runs (Wald–Wolfowitz) tests
//! - [`service`]: JSON request façade returning `{success, ...}` envelopes
//!
//! ## Example
//!
//! ```rust
//! use prng_core::{find_period, generate, LcgConfig};
//!
//! let config = LcgConfig::new(9, 2, 0, 1).unwrap();
//! assert_eq!(generate(&config, 6).unwrap(), vec![2, 4, 8, 7, 5, 1]);
//! assert_eq!(find_period(&config, 100).period, Some(6));
//! ```

pub mod cesaro;
pub mod error;
pub mod generator;
pub mod period;
pub mod randomness;
pub mod service;

pub use cesaro::{
    compare, estimate_pi, CesaroMethod, CesaroResult, PiEstimate, RandomSource, SystemSource,
};
pub use error::PrngError;
pub use generator::{generate, Lcg, LcgConfig, SequenceStatistics};
pub use period::{find_period, PeriodQuality, PeriodResult};
pub use randomness::{test_randomness, BitRule, RandomnessResult, TestOutcome};
pub use service::{Envelope, Limits, PrngService};
