//! Error types for `journey-core`.
//!
//! [`ErrorCode`] is the wire taxonomy shared by every layer; [`Error`] carries
//! the detail needed to render it.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pii::PiiCategory;

/// Stable, machine-readable error identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  ValidationError,
  PiiDetected,
  RateLimitExceeded,
  NotFound,
  ReactionUnavailable,
  Unauthorized,
  InternalError,
}

impl ErrorCode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::ValidationError => "VALIDATION_ERROR",
      Self::PiiDetected => "PII_DETECTED",
      Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
      Self::NotFound => "NOT_FOUND",
      Self::ReactionUnavailable => "REACTION_UNAVAILABLE",
      Self::Unauthorized => "UNAUTHORIZED",
      Self::InternalError => "INTERNAL_ERROR",
    }
  }
}

impl fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A single malformed, missing or oversized input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("missing required field: {0}")]
  Missing(&'static str),

  #[error("{field} exceeds {max} characters ({provided} provided)")]
  TooLong {
    field:    &'static str,
    max:      usize,
    provided: usize,
  },

  #[error("invalid {field}: {reason}")]
  Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error("personal information detected: {}", PiiCategory::join(.0))]
  PiiDetected(Vec<PiiCategory>),

  #[error("no active reactions in the pool")]
  ReactionUnavailable,
}

impl Error {
  pub fn code(&self) -> ErrorCode {
    match self {
      Self::Validation(_) => ErrorCode::ValidationError,
      Self::PiiDetected(_) => ErrorCode::PiiDetected,
      Self::ReactionUnavailable => ErrorCode::ReactionUnavailable,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_serialise_as_wire_names() {
    let json = serde_json::to_string(&ErrorCode::RateLimitExceeded).unwrap();
    assert_eq!(json, "\"RATE_LIMIT_EXCEEDED\"");
    assert_eq!(ErrorCode::PiiDetected.to_string(), "PII_DETECTED");
  }

  #[test]
  fn validation_maps_to_validation_code() {
    let err = Error::from(ValidationError::Missing("code_phrase"));
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(err.to_string(), "missing required field: code_phrase");
  }

  #[test]
  fn every_variant_has_its_own_code() {
    let cases = [
      (Error::from(ValidationError::Missing("to_name")), ErrorCode::ValidationError),
      (Error::PiiDetected(vec![PiiCategory::Email]), ErrorCode::PiiDetected),
      (Error::ReactionUnavailable, ErrorCode::ReactionUnavailable),
    ];
    for (err, code) in cases {
      assert_eq!(err.code(), code, "{err}");
    }
  }
}
