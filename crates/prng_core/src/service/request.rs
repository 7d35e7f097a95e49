//! Decoding and validation of request bodies.
//!
//! Bodies are loosely typed JSON objects: numeric fields may arrive as JSON
//! integers, integral floats (`9.0`) or decimal strings (`"9"`). Anything
//! else is rejected with a message naming the field and the constraint.

use serde_json::{Map, Value};

use super::Limits;
use crate::cesaro::CesaroMethod;
use crate::error::PrngError;
use crate::generator::LcgConfig;
use crate::randomness::BitRule;

/// Default number of values returned by `generate`.
pub const DEFAULT_GENERATE_COUNT: u64 = 200;

/// Default number of values tested by `randomness`.
pub const DEFAULT_RANDOMNESS_COUNT: u64 = 1_000;

/// Default number of values written by `export`.
pub const DEFAULT_EXPORT_COUNT: u64 = 100;

/// Default iteration cap for `period`.
pub const DEFAULT_MAX_ITERATIONS: u64 = 100_000;

/// Default number of pairs for `cesaro`.
pub const DEFAULT_NUM_PAIRS: u64 = 10_000;

/// Parses a raw request body.
///
/// # Errors
///
/// [`PrngError::InvalidRequest`] when the body is not valid JSON.
pub fn parse_json(body: &[u8]) -> Result<Value, PrngError> {
    serde_json::from_slice(body)
        .map_err(|e| PrngError::InvalidRequest(format!("body is not valid JSON: {e}")))
}

/// Typed view over a JSON object body.
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Fields<'a> {
    pub(crate) fn new(body: &'a Value) -> Result<Self, PrngError> {
        body.as_object()
            .map(|map| Self { map })
            .ok_or_else(|| PrngError::InvalidRequest("expected a JSON object".to_string()))
    }

    fn present(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|value| !value.is_null())
    }

    pub(crate) fn integer(&self, name: &'static str) -> Result<u64, PrngError> {
        self.optional_integer(name)?
            .ok_or_else(|| PrngError::invalid(name, "is required"))
    }

    pub(crate) fn optional_integer(&self, name: &'static str) -> Result<Option<u64>, PrngError> {
        self.present(name).map(|value| to_integer(name, value)).transpose()
    }

    pub(crate) fn integer_or(&self, name: &'static str, default: u64) -> Result<u64, PrngError> {
        Ok(self.optional_integer(name)?.unwrap_or(default))
    }

    pub(crate) fn optional_str(&self, name: &'static str) -> Result<Option<&'a str>, PrngError> {
        match self.present(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(PrngError::invalid(name, "must be a string")),
        }
    }

    pub(crate) fn lcg_config(&self) -> Result<LcgConfig, PrngError> {
        let m = self.integer("m")?;
        let a = self.integer("a")?;
        let c = self.integer("c")?;
        let x0 = self.integer("x0")?;
        LcgConfig::new(m, a, c, x0)
    }
}

/// 2⁶⁴: the first float that does not fit in a `u64`.
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

fn to_integer(name: &'static str, value: &Value) -> Result<u64, PrngError> {
    match value {
        Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                Ok(n)
            } else if number.as_i64().is_some() {
                Err(PrngError::invalid(name, "must be non-negative"))
            } else {
                let f = number.as_f64().unwrap_or(f64::NAN);
                if f < 0.0 {
                    Err(PrngError::invalid(name, "must be non-negative"))
                } else if f.fract() != 0.0 || f.is_nan() {
                    Err(PrngError::invalid(name, format!("must be an integer, got {number}")))
                } else if f >= U64_LIMIT {
                    Err(PrngError::invalid(
                        name,
                        format!("must not exceed {}, got {number}", u64::MAX),
                    ))
                } else {
                    Ok(f as u64)
                }
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().map_err(|_| {
                if trimmed.parse::<i64>().is_ok() {
                    PrngError::invalid(name, "must be non-negative")
                } else {
                    PrngError::invalid(name, format!("must be an integer, got '{s}'"))
                }
            })
        }
        other => Err(PrngError::invalid(
            name,
            format!("must be an integer, got {}", json_kind(other)),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn check_limit(name: &'static str, value: u64, limit: u64) -> Result<u64, PrngError> {
    if value > limit {
        return Err(PrngError::invalid(name, format!("must not exceed {limit}")));
    }
    Ok(value)
}

/// Validated `generate` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateRequest {
    pub config: LcgConfig,
    pub count: u64,
    /// First index (0-based) of the returned page.
    pub offset: u64,
    /// Page size; `None` returns everything after `offset`.
    pub limit: Option<u64>,
}

impl GenerateRequest {
    /// Decodes and validates a `generate` body.
    pub fn from_json(body: &Value, limits: &Limits) -> Result<Self, PrngError> {
        let fields = Fields::new(body)?;
        let config = fields.lcg_config()?;
        let count = check_limit(
            "count",
            fields.integer_or("count", DEFAULT_GENERATE_COUNT)?,
            limits.max_count,
        )?;
        config.check_generation(count)?;

        let offset = fields.integer_or("offset", 0)?;
        if offset > count {
            return Err(PrngError::invalid("offset", format!("must not exceed count ({count})")));
        }
        let limit = fields.optional_integer("limit")?;

        Ok(Self {
            config,
            count,
            offset,
            limit,
        })
    }

    /// Number of values in the returned page.
    pub fn page_len(&self) -> u64 {
        let remaining = self.count - self.offset;
        self.limit.map_or(remaining, |limit| limit.min(remaining))
    }
}

/// Validated `period` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeriodRequest {
    pub config: LcgConfig,
    /// Requested cap, already clamped to [`Limits::max_iterations`].
    pub max_iterations: u64,
}

impl PeriodRequest {
    /// Decodes and validates a `period` body.
    pub fn from_json(body: &Value, limits: &Limits) -> Result<Self, PrngError> {
        let fields = Fields::new(body)?;
        let config = fields.lcg_config()?;
        let max_iterations = fields
            .integer_or("max_iterations", DEFAULT_MAX_ITERATIONS)?
            .min(limits.max_iterations);
        Ok(Self {
            config,
            max_iterations,
        })
    }
}

/// Validated `cesaro` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CesaroRequest {
    pub config: LcgConfig,
    pub num_pairs: u64,
    pub method: CesaroMethod,
    /// Seed for the reference source; entropy-seeded when absent.
    pub system_seed: Option<u64>,
}

impl CesaroRequest {
    /// Decodes and validates a `cesaro` body.
    pub fn from_json(body: &Value, limits: &Limits) -> Result<Self, PrngError> {
        let fields = Fields::new(body)?;
        let config = fields.lcg_config()?;
        let num_pairs = check_limit(
            "num_pairs",
            fields.integer_or("num_pairs", DEFAULT_NUM_PAIRS)?,
            limits.max_pairs,
        )?;
        if num_pairs == 0 {
            return Err(PrngError::invalid("num_pairs", "must be positive"));
        }
        config.check_generation(num_pairs)?;

        let method = fields
            .optional_str("method")?
            .map(str::parse::<CesaroMethod>)
            .transpose()?
            .unwrap_or_default();
        let system_seed = fields.optional_integer("seed")?;

        Ok(Self {
            config,
            num_pairs,
            method,
            system_seed,
        })
    }
}

/// Validated `randomness` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub config: LcgConfig,
    pub count: u64,
    pub bit_rule: BitRule,
}

impl RandomnessRequest {
    /// Decodes and validates a `randomness` body.
    pub fn from_json(body: &Value, limits: &Limits) -> Result<Self, PrngError> {
        let fields = Fields::new(body)?;
        let config = fields.lcg_config()?;
        let count = check_limit(
            "count",
            fields.integer_or("count", DEFAULT_RANDOMNESS_COUNT)?,
            limits.max_count,
        )?;
        config.check_generation(count)?;

        let bit_rule = fields
            .optional_str("bit_rule")?
            .map(str::parse::<BitRule>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            config,
            count,
            bit_rule,
        })
    }
}

/// Validated `export` request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportRequest {
    pub config: LcgConfig,
    pub count: u64,
}

impl ExportRequest {
    /// Decodes and validates an `export` body.
    pub fn from_json(body: &Value, limits: &Limits) -> Result<Self, PrngError> {
        let fields = Fields::new(body)?;
        let config = fields.lcg_config()?;
        let count = check_limit(
            "count",
            fields.integer_or("count", DEFAULT_EXPORT_COUNT)?,
            limits.max_count,
        )?;
        config.check_generation(count)?;
        Ok(Self { config, count })
    }
}
