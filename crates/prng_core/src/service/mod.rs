//! Request façade over the generator and its test suite.
//!
//! [`PrngService`] decodes a JSON request body, validates it against the
//! configured [`Limits`], runs the computation under a wall-clock timer and
//! wraps the outcome in an [`Envelope`]. Validation failures never escape
//! as errors: they become `{"success": false, "error": "..."}`.
//!
//! The service holds only immutable limits, so a single instance can be
//! shared across concurrent requests.

pub mod request;

use std::fmt::Write as _;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cesaro::{self, CesaroResult, SystemSource};
use crate::error::PrngError;
use crate::generator::{LcgConfig, SequenceStatistics};
use crate::period::{find_period, PeriodResult};
use crate::randomness::{test_randomness, BitRule, RandomnessResult};

pub use request::{
    parse_json, CesaroRequest, ExportRequest, GenerateRequest, PeriodRequest, RandomnessRequest,
};

/// File name suggested for exported sequences.
pub const EXPORT_FILENAME: &str = "result_lr1.txt";

/// Worst-case heap cost of one visited state in the period search: a
/// `(u64, u64)` slot plus control byte, at the map's lowest load factor.
pub const PERIOD_BYTES_PER_STATE: u64 = 32;

/// Upper bounds applied to every request.
///
/// `max_iterations` also bounds memory: a period search remembers every state
/// it visits, so one request holds up to
/// [`period_memory_bound_bytes`](Limits::period_memory_bound_bytes), about
/// 320 MB at the default of ten million, and concurrent searches add up.
/// Lower it on small hosts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Largest `count` accepted by generate, randomness and export.
    pub max_count: u64,
    /// Cap on period search steps; larger requests are clamped. Memory per
    /// search grows linearly with it, see the type docs.
    pub max_iterations: u64,
    /// Largest `num_pairs` accepted by cesaro.
    pub max_pairs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_count: 1_000_000,
            max_iterations: 10_000_000,
            max_pairs: 10_000_000,
        }
    }
}

impl Limits {
    /// Upper bound on the heap one period search may allocate.
    pub fn period_memory_bound_bytes(&self) -> u64 {
        self.max_iterations.saturating_mul(PERIOD_BYTES_PER_STATE)
    }
}

/// Wire wrapper: the payload fields next to `success: true`, or the error.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope<T> {
    success: bool,
    #[serde(flatten)]
    payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn success(payload: T) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl<T> From<Result<T, PrngError>> for Envelope<T> {
    fn from(result: Result<T, PrngError>) -> Self {
        match result {
            Ok(payload) => Envelope::success(payload),
            Err(err) => Envelope::failure(err.to_string()),
        }
    }
}

/// Runs `f` and returns its value with the elapsed time in milliseconds.
pub fn timed<T>(f: impl FnOnce() -> T) -> (T, f64) {
    let start = Instant::now();
    let value = f();
    (value, start.elapsed().as_secs_f64() * 1_000.0)
}

/// `generate` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GenerateResponse {
    /// Requested page of the sequence.
    pub sequence: Vec<u64>,
    /// Length of the full sequence.
    pub count: u64,
    pub offset: u64,
    /// Statistics of the full sequence, not only the page.
    pub statistics: SequenceStatistics,
    pub parameters: LcgConfig,
    pub generation_time_ms: f64,
}

/// `period` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PeriodResponse {
    #[serde(flatten)]
    pub result: PeriodResult,
    /// Label the lab UI matches on to colour the badge.
    #[serde(rename = "quality")]
    pub quality_label: &'static str,
    pub parameters: LcgConfig,
    pub execution_time_ms: f64,
}

/// `cesaro` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CesaroResponse {
    #[serde(flatten)]
    pub result: CesaroResult,
    pub parameters: LcgConfig,
    pub execution_time_ms: f64,
}

/// `randomness` payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RandomnessResponse {
    pub tests: RandomnessResult,
    pub overall_passed: bool,
    pub bit_rule: BitRule,
    pub count: u64,
    pub parameters: LcgConfig,
    pub execution_time_ms: f64,
}

/// Plain-text rendering of a sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportReport {
    pub filename: &'static str,
    pub content: String,
}

/// Stateless façade; cheap to clone and share.
#[derive(Clone, Debug, Default)]
pub struct PrngService {
    limits: Limits,
}

impl PrngService {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Generates a sequence, returning the requested page and full statistics.
    pub fn generate(&self, body: &Value) -> Envelope<GenerateResponse> {
        respond(
            "generate",
            GenerateRequest::from_json(body, &self.limits).map(|r| self.run_generate(&r)),
        )
    }

    /// Searches for the generator period.
    pub fn period(&self, body: &Value) -> Envelope<PeriodResponse> {
        respond(
            "period",
            PeriodRequest::from_json(body, &self.limits).map(|r| self.run_period(&r)),
        )
    }

    /// Compares π estimates of the LCG and the reference source.
    pub fn cesaro(&self, body: &Value) -> Envelope<CesaroResponse> {
        respond(
            "cesaro",
            CesaroRequest::from_json(body, &self.limits).and_then(|r| self.run_cesaro(&r)),
        )
    }

    /// Runs the frequency and runs tests.
    pub fn randomness(&self, body: &Value) -> Envelope<RandomnessResponse> {
        respond(
            "randomness",
            RandomnessRequest::from_json(body, &self.limits).map(|r| self.run_randomness(&r)),
        )
    }

    /// Renders the sequence as a tab-separated text report.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the caller decides how to surface it.
    pub fn export(&self, body: &Value) -> Result<ExportReport, PrngError> {
        let request = ExportRequest::from_json(body, &self.limits)?;
        Ok(self.run_export(&request))
    }

    pub fn run_generate(&self, request: &GenerateRequest) -> GenerateResponse {
        let config = request.config;
        let ((statistics, sequence), elapsed) = timed(|| {
            let statistics =
                SequenceStatistics::from_values(config.iter().take(request.count as usize));
            let sequence: Vec<u64> = config
                .iter()
                .skip(request.offset as usize)
                .take(request.page_len() as usize)
                .collect();
            (statistics, sequence)
        });

        GenerateResponse {
            sequence,
            count: request.count,
            offset: request.offset,
            // count > 0 is guaranteed by request validation
            statistics: statistics.unwrap_or_else(empty_statistics),
            parameters: config,
            generation_time_ms: elapsed,
        }
    }

    pub fn run_period(&self, request: &PeriodRequest) -> PeriodResponse {
        let (result, elapsed) = timed(|| find_period(&request.config, request.max_iterations));
        PeriodResponse {
            quality_label: result.quality.label_uk(),
            result,
            parameters: request.config,
            execution_time_ms: elapsed,
        }
    }

    pub fn run_cesaro(&self, request: &CesaroRequest) -> Result<CesaroResponse, PrngError> {
        let mut system = match request.system_seed {
            Some(seed) => SystemSource::from_seed(seed),
            None => SystemSource::from_entropy(),
        };
        let (result, elapsed) = timed(|| {
            cesaro::compare(&request.config, request.num_pairs, request.method, &mut system)
        });
        Ok(CesaroResponse {
            result: result?,
            parameters: request.config,
            execution_time_ms: elapsed,
        })
    }

    pub fn run_randomness(&self, request: &RandomnessRequest) -> RandomnessResponse {
        let config = request.config;
        let (tests, elapsed) = timed(|| {
            test_randomness(
                config.iter().take(request.count as usize),
                config.modulus(),
                request.bit_rule,
            )
        });
        RandomnessResponse {
            overall_passed: tests.overall_passed(),
            tests,
            bit_rule: request.bit_rule,
            count: request.count,
            parameters: config,
            execution_time_ms: elapsed,
        }
    }

    pub fn run_export(&self, request: &ExportRequest) -> ExportReport {
        let config = request.config;
        let mut content = String::new();
        // Writing into a String cannot fail.
        let _ = writeln!(content, "Modulus m = {}", config.modulus());
        let _ = writeln!(content, "Multiplier a = {}", config.multiplier());
        let _ = writeln!(content, "Increment c = {}", config.increment());
        let _ = writeln!(content, "Seed x0 = {}", config.seed());
        let _ = writeln!(content, "{}", "-".repeat(20));
        let _ = writeln!(content, "Count = {}", request.count);
        let _ = writeln!(content, "{}", "-".repeat(20));
        let _ = writeln!(content, "Index\tValue");
        for (index, value) in config.iter().take(request.count as usize).enumerate() {
            let _ = writeln!(content, "{}\t{}", index + 1, value);
        }

        ExportReport {
            filename: EXPORT_FILENAME,
            content,
        }
    }
}

fn empty_statistics() -> SequenceStatistics {
    SequenceStatistics {
        count: 0,
        mean: 0.0,
        variance: 0.0,
        std_dev: 0.0,
        min: 0,
        max: 0,
        unique_values: 0,
        frequency_top10: Vec::new(),
    }
}

fn respond<T>(operation: &'static str, result: Result<T, PrngError>) -> Envelope<T> {
    if let Err(err) = &result {
        tracing::debug!(operation, error = %err, "request rejected");
    }
    result.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::period::PeriodQuality;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn service() -> PrngService {
        PrngService::default()
    }

    fn mod9(extra: Value) -> Value {
        let mut body = json!({ "m": 9, "a": 2, "c": 0, "x0": 1 });
        if let (Some(target), Some(source)) = (body.as_object_mut(), extra.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        body
    }

    #[test]
    fn test_period_memory_bound_follows_max_iterations() {
        let limits = Limits::default();
        assert_eq!(limits.period_memory_bound_bytes(), 320_000_000);

        let small = Limits {
            max_iterations: 1_000,
            ..Limits::default()
        };
        assert_eq!(small.period_memory_bound_bytes(), 32_000);

        let huge = Limits {
            max_iterations: u64::MAX,
            ..Limits::default()
        };
        assert_eq!(huge.period_memory_bound_bytes(), u64::MAX);
    }

    #[test]
    fn test_generate_known_sequence() {
        let envelope = service().generate(&mod9(json!({ "count": 10 })));
        assert!(envelope.is_success());
        let response = envelope.payload().unwrap();
        assert_eq!(response.sequence, vec![2, 4, 8, 7, 5, 1, 2, 4, 8, 7]);
        assert_eq!(response.count, 10);
        assert_eq!(response.statistics.count, 10);
        assert_eq!(response.statistics.unique_values, 6);
        assert!(response.generation_time_ms >= 0.0);
    }

    #[test]
    fn test_generate_page_keeps_full_statistics() {
        let envelope = service().generate(&mod9(json!({ "count": 10, "offset": 3, "limit": 4 })));
        let response = envelope.into_payload().unwrap();
        assert_eq!(response.sequence, vec![7, 5, 1, 2]);
        assert_eq!(response.offset, 3);
        assert_eq!(response.statistics.count, 10);
        assert_relative_eq!(response.statistics.mean, 4.8, epsilon = 1e-12);
    }

    #[test]
    fn test_generate_wire_shape() {
        let json = serde_json::to_value(service().generate(&mod9(json!({ "count": 3 })))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["sequence"], json!([2, 4, 8]));
        assert_eq!(json["statistics"]["min"], 2);
        assert_eq!(json["statistics"]["max"], 8);
        assert_eq!(json["parameters"], json!({ "m": 9, "a": 2, "c": 0, "x0": 1 }));
        assert!(json["generation_time_ms"].is_number());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_failure_wire_shape() {
        let json = serde_json::to_value(service().generate(&json!({ "m": 1, "a": 0, "c": 0, "x0": 0 })))
            .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "Invalid parameter 'm': must be greater than 1");
        assert!(json.get("sequence").is_none());
    }

    #[test]
    fn test_period_known_generator() {
        let json = serde_json::to_value(service().period(&mod9(json!({})))).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["period"], 6);
        assert_eq!(json["found"], true);
        assert_eq!(json["max_possible_period"], 9);
        assert_eq!(json["quality"], "Добре");
        assert_eq!(json["quality_band"], "Good");
        assert!(json.get("quality_label").is_none());
        assert!(json["execution_time_ms"].is_number());
    }

    #[test]
    fn test_period_poor_generator_carries_ui_label() {
        // a = 0: constant after one step, period 1 of 100
        let body = json!({ "m": 100, "a": 0, "c": 5, "x0": 42 });
        let json = serde_json::to_value(service().period(&body)).unwrap();
        assert_eq!(json["period"], 1);
        assert_eq!(json["quality"], "Погано");
        assert_eq!(json["quality_band"], "Poor");
    }

    #[test]
    fn test_period_not_found_is_success() {
        let limits = Limits {
            max_iterations: 5,
            ..Limits::default()
        };
        let body = json!({ "m": 1_000_003, "a": 2, "c": 1, "x0": 0 });
        let envelope = PrngService::new(limits).period(&body);
        assert!(envelope.is_success());
        let response = envelope.payload().unwrap();
        assert!(!response.result.found);
        assert_eq!(response.result.period, None);
        assert_eq!(response.result.quality, PeriodQuality::Poor);

        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["period"].is_null());
    }

    #[test]
    fn test_cesaro_wire_shape() {
        let body = json!({
            "m": 2_147_483_647u64, "a": 48271, "c": 0, "x0": 1,
            "num_pairs": 20_000, "seed": 11
        });
        let json = serde_json::to_value(service().cesaro(&body)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["num_pairs"], 20_000);
        assert_eq!(json["method"], "quarter_circle");
        assert_relative_eq!(json["actual_pi"].as_f64().unwrap(), std::f64::consts::PI);
        for source in ["our_generator", "system_generator"] {
            let estimate = &json[source];
            assert!(estimate["pi_estimate"].is_number());
            assert!(estimate["error"].as_f64().unwrap() >= 0.0);
            assert!(estimate["error_percentage"].as_f64().unwrap() < 5.0);
        }
    }

    #[test]
    fn test_cesaro_seeded_is_reproducible() {
        let body = mod9(json!({ "num_pairs": 1_000, "seed": 5, "method": "coprime" }));
        let a = service().cesaro(&body).into_payload().unwrap();
        let b = service().cesaro(&body).into_payload().unwrap();
        assert_eq!(a.result, b.result);
    }

    #[test]
    fn test_cesaro_pair_limit() {
        let limits = Limits {
            max_pairs: 100,
            ..Limits::default()
        };
        let envelope = PrngService::new(limits).cesaro(&mod9(json!({ "num_pairs": 101 })));
        assert!(!envelope.is_success());
        assert!(envelope.error().unwrap().contains("num_pairs"));
    }

    #[test]
    fn test_randomness_wire_shape() {
        let body = json!({ "m": 2_147_483_647u64, "a": 48271, "c": 0, "x0": 1, "count": 5_000 });
        let json = serde_json::to_value(service().randomness(&body)).unwrap();
        assert_eq!(json["success"], true);
        let frequency = &json["tests"]["frequency"];
        assert_eq!(
            frequency["ones_count"].as_u64().unwrap() + frequency["zeros_count"].as_u64().unwrap(),
            5_000
        );
        assert!(frequency["chi_square"].is_number());
        assert!(json["tests"]["runs"]["z_statistic"].is_number());
        assert_eq!(json["bit_rule"], "threshold");
        assert!(json["overall_passed"].is_boolean());
    }

    #[test]
    fn test_randomness_degenerate_keeps_frequency() {
        // a = 0, c = 0: every value is 0
        let body = json!({ "m": 10, "a": 0, "c": 0, "x0": 3, "count": 50 });
        let json = serde_json::to_value(service().randomness(&body)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["tests"]["frequency"]["zeros_count"], 50);
        assert!(json["tests"]["runs"]["error"].is_string());
        assert!(json["tests"]["runs"].get("is_random").is_none());
        assert_eq!(json["overall_passed"], false);
    }

    #[test]
    fn test_export_report() {
        let report = service().export(&mod9(json!({ "count": 3 }))).unwrap();
        assert_eq!(report.filename, EXPORT_FILENAME);
        assert!(report.content.starts_with("Modulus m = 9\n"));
        assert!(report.content.contains("Count = 3\n"));
        assert!(report.content.ends_with("Index\tValue\n1\t2\n2\t4\n3\t8\n"));
    }

    #[test]
    fn test_export_invalid() {
        let err = service().export(&json!({ "m": 9 })).unwrap_err();
        assert_eq!(err.field(), Some("a"));
    }

    #[test]
    fn test_timed_measures_closure() {
        let (value, elapsed) = timed(|| 21 * 2);
        assert_eq!(value, 42);
        assert!(elapsed >= 0.0);
    }

    #[test]
    fn test_limits_deserialise_partial() {
        let limits: Limits = serde_json::from_value(json!({ "max_count": 10 })).unwrap();
        assert_eq!(limits.max_count, 10);
        assert_eq!(limits.max_iterations, Limits::default().max_iterations);
    }
}
