//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders as
//! `{ error, message, details?, detected_patterns?, retry_after? }` where
//! `error` is a [`ErrorCode`] wire name.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use journey_core::{Error as CoreError, ErrorCode, ValidationError, pii::PiiCategory};
use serde_json::{Map, Value, json};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  /// The body or query string could not be parsed at all.
  #[error("malformed request: {0}")]
  Malformed(String),

  #[error("personal information detected: {}", PiiCategory::join(.0))]
  Pii(Vec<PiiCategory>),

  #[error("rate limit exceeded, retry after {retry_after}s")]
  RateLimited { retry_after: u64 },

  #[error("{0} not found")]
  NotFound(String),

  #[error("no active reactions")]
  ReactionUnavailable,

  #[error("unauthorized")]
  Unauthorized,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("{0} timed out")]
  Timeout(&'static str),
}

impl ApiError {
  pub fn code(&self) -> ErrorCode {
    match self {
      Self::Validation(_) | Self::Malformed(_) => ErrorCode::ValidationError,
      Self::Pii(_) => ErrorCode::PiiDetected,
      Self::RateLimited { .. } => ErrorCode::RateLimitExceeded,
      Self::NotFound(_) => ErrorCode::NotFound,
      Self::ReactionUnavailable => ErrorCode::ReactionUnavailable,
      Self::Unauthorized => ErrorCode::Unauthorized,
      Self::Store(_) | Self::Timeout(_) => ErrorCode::InternalError,
    }
  }

  pub fn status(&self) -> StatusCode {
    match self.code() {
      ErrorCode::ValidationError | ErrorCode::PiiDetected => StatusCode::BAD_REQUEST,
      ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
      ErrorCode::NotFound => StatusCode::NOT_FOUND,
      ErrorCode::ReactionUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
      ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn body(&self) -> Value {
    let mut body = json!({
      "error":   self.code(),
      "message": self.to_string(),
    });
    match self {
      Self::Validation(ValidationError::Missing(field)) => {
        let mut details = Map::new();
        details.insert((*field).to_owned(), json!("missing"));
        body["details"] = Value::Object(details);
      }
      Self::Validation(ValidationError::TooLong { field, max, provided }) => {
        body["details"] = json!({
          "field":           field,
          "max_length":      max,
          "provided_length": provided,
        });
      }
      Self::Validation(ValidationError::Invalid { field, .. }) => {
        body["details"] = json!({ "field": field });
      }
      Self::Pii(categories) => {
        body["message"] = json!("偵測到個人身份資訊，請檢查並移除");
        body["detected_patterns"] = json!(categories);
      }
      Self::RateLimited { retry_after } => {
        body["retry_after"] = json!(retry_after);
      }
      // Internal detail is logged where it happens, never returned.
      Self::Store(_) | Self::Timeout(_) => {
        body["message"] = json!("internal server error");
      }
      _ => {}
    }
    body
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self {
    match err {
      CoreError::Validation(e) => Self::Validation(e),
      CoreError::PiiDetected(categories) => Self::Pii(categories),
      CoreError::ReactionUnavailable => Self::ReactionUnavailable,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::Malformed(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::Malformed(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::Malformed(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = self.body();
    let mut res = (status, Json(body)).into_response();
    match self {
      Self::RateLimited { retry_after } => {
        if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
          res.headers_mut().insert(header::RETRY_AFTER, value);
        }
      }
      Self::Unauthorized => {
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"journey\""),
        );
      }
      _ => {}
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn statuses_follow_the_taxonomy() {
    assert_eq!(ApiError::Malformed("x".into()).status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::Pii(vec![PiiCategory::Email]).status(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::RateLimited { retry_after: 5 }.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(ApiError::ReactionUnavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(ApiError::Timeout("insert").status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn internal_detail_stays_out_of_the_body() {
    let err = ApiError::Store("disk I/O error at /var/lib/journey.db".into());
    let body = err.body();
    assert_eq!(body["error"], "INTERNAL_ERROR");
    assert_eq!(body["message"], "internal server error");
  }

  #[test]
  fn too_long_carries_lengths() {
    let err = ApiError::from(ValidationError::TooLong {
      field:    "blessing_text",
      max:      15,
      provided: 16,
    });
    let body = err.body();
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["max_length"], 15);
    assert_eq!(body["details"]["provided_length"], 16);
  }

  #[test]
  fn rate_limit_sets_retry_after_header() {
    let res = ApiError::RateLimited { retry_after: 42 }.into_response();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(res.headers()[header::RETRY_AFTER], "42");
  }
}
