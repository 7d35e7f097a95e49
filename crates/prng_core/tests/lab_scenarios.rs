//! End-to-end scenarios over the public API.
//!
//! Each test drives the same path a lab request takes: typed configuration,
//! generation, analysis and the JSON façade.

use approx::assert_relative_eq;
use prng_core::service::EXPORT_FILENAME;
use prng_core::{
    compare, find_period, generate, test_randomness, BitRule, CesaroMethod, LcgConfig,
    PeriodQuality, PrngService, SequenceStatistics, SystemSource,
};
use serde_json::json;

fn mod9() -> LcgConfig {
    LcgConfig::new(9, 2, 0, 1).unwrap()
}

fn minstd() -> LcgConfig {
    LcgConfig::new(2_147_483_647, 48_271, 0, 1).unwrap()
}

// ============================================================================
// Generator
// ============================================================================

#[test]
fn test_mod9_sequence_and_period() {
    let config = mod9();
    assert_eq!(
        generate(&config, 10).unwrap(),
        vec![2, 4, 8, 7, 5, 1, 2, 4, 8, 7]
    );

    let period = find_period(&config, 100);
    assert_eq!(period.period, Some(6));
    assert_eq!(period.max_possible_period, 9);
    assert_eq!(period.quality, PeriodQuality::Good);
}

#[test]
fn test_same_parameters_same_sequence() {
    let a = generate(&minstd(), 1_000).unwrap();
    let b = generate(&minstd(), 1_000).unwrap();
    assert_eq!(a, b);
    assert!(a.iter().all(|&x| x < 2_147_483_647));
}

#[test]
fn test_period_reproduces_sequence() {
    let config = LcgConfig::new(64, 13, 7, 5).unwrap();
    let period = find_period(&config, 1_000).period.unwrap() as usize;
    let values = generate(&config, 3 * period).unwrap();
    assert_eq!(values[..period], values[period..2 * period]);
    assert_eq!(values[..period], values[2 * period..]);
}

#[test]
fn test_statistics_match_sequence() {
    let values = generate(&mod9(), 6).unwrap();
    let stats = SequenceStatistics::from_values(values.iter().copied()).unwrap();
    // one full cycle over {1, 2, 4, 5, 7, 8}
    assert_eq!(stats.count, 6);
    assert_relative_eq!(stats.mean, 4.5, epsilon = 1e-12);
    assert_eq!(stats.min, 1);
    assert_eq!(stats.max, 8);
    assert_eq!(stats.unique_values, 6);
    assert!(stats.frequency_top10.iter().all(|f| f.occurrences == 1));
}

// ============================================================================
// Cesaro and randomness
// ============================================================================

#[test]
fn test_minstd_estimates_pi() {
    let mut system = SystemSource::from_seed(7);
    let result = compare(&minstd(), 100_000, CesaroMethod::QuarterCircle, &mut system).unwrap();
    assert!(result.our_generator.error_percentage < 5.0);
    assert!(result.system_generator.error_percentage < 5.0);
    assert_eq!(result.our_generator.pi_history.len(), 20);
}

#[test]
fn test_degenerate_generator_fails_randomness() {
    // x alternates 1, 8, 1, 8, ... so every threshold bit alternates too
    let config = LcgConfig::new(9, 8, 0, 8).unwrap();
    let result = test_randomness(config.iter().take(1_000), 9, BitRule::Threshold);
    let runs = result.runs.computed().unwrap();
    assert_eq!(runs.runs, 1_000);
    assert!(!runs.is_random);
    assert!(!result.overall_passed());
}

// ============================================================================
// Service façade
// ============================================================================

#[test]
fn test_service_round_trip_for_every_operation() {
    let service = PrngService::default();
    let body = json!({ "m": 9, "a": 2, "c": 0, "x0": 1, "count": 10, "num_pairs": 200, "seed": 1 });

    assert!(service.generate(&body).is_success());
    assert!(service.period(&body).is_success());
    assert!(service.cesaro(&body).is_success());
    assert!(service.randomness(&body).is_success());

    let report = service.export(&body).unwrap();
    assert_eq!(report.filename, EXPORT_FILENAME);
    assert_eq!(report.content.lines().filter(|l| l.contains('\t')).count(), 11);
}

#[test]
fn test_service_rejects_out_of_range_parameters() {
    let service = PrngService::default();
    let body = json!({ "m": 9, "a": 10, "c": 0, "x0": 1 });

    let envelope = service.generate(&body);
    assert!(!envelope.is_success());
    assert_eq!(
        envelope.error(),
        Some("Invalid parameter 'a': must be in range [0, 9)")
    );
    assert!(service.export(&body).is_err());
}
