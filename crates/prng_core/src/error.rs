//! Error types for the generator core.
//!
//! Only input problems are errors. Outcomes such as "no period found within
//! the iteration cap" or "runs test undefined for a constant bitstream" are
//! ordinary results and are modelled in their own modules.

use thiserror::Error;

/// Errors raised while validating parameters or decoding requests.
///
/// # Examples
/// ```
/// use prng_core::PrngError;
///
/// let err = PrngError::invalid("m", "must be greater than 1");
/// assert_eq!(err.to_string(), "Invalid parameter 'm': must be greater than 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrngError {
    /// A parameter is missing, not an integer, or outside its valid range.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// Field name as it appears in the request.
        name: &'static str,
        /// Which constraint failed.
        reason: String,
    },

    /// The request body is not a JSON object.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The computation did not complete; not caused by the input.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PrngError {
    /// Shorthand for [`PrngError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// True when the client sent something invalid, false for server faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }

    /// Name of the offending field, if the error concerns a single field.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidParameter { name, .. } => Some(*name),
            Self::InvalidRequest(_) | Self::Internal(_) => None,
        }
    }
}
