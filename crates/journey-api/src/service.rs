//! Health, version and the JSON 404 fallback.

use axum::{Json, extract::State, http::Uri};
use chrono::{DateTime, Utc};
use journey_core::store::JourneyStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
  pub status:      String,
  pub timestamp:   DateTime<Utc>,
  pub uptime_secs: u64,
}

/// `GET /health`
pub async fn health<S>(State(state): State<AppState<S>>) -> Json<Health>
where
  S: JourneyStore + 'static,
{
  Json(Health {
    status:      "ok".to_owned(),
    timestamp:   Utc::now(),
    uptime_secs: state.started_at.elapsed().as_secs(),
  })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Version {
  pub version:   String,
  pub endpoints: Vec<String>,
}

const ENDPOINTS: &[&str] = &[
  "GET /health",
  "GET /api/version",
  "GET /api/blessings",
  "POST /api/blessings",
  "PATCH /api/blessings/:id/hide",
  "POST /api/reports",
  "GET /api/reactions",
  "GET /api/keychains",
  "GET /api/keychains/:id/events",
  "POST /api/keychains/:id/events",
  "GET /api/keychains/:id/story",
];

/// `GET /api/version`
pub async fn version() -> Json<Version> {
  Json(Version {
    version:   env!("CARGO_PKG_VERSION").to_owned(),
    endpoints: ENDPOINTS.iter().map(|e| (*e).to_owned()).collect(),
  })
}

pub async fn not_found(uri: Uri) -> ApiError { ApiError::NotFound(format!("route {}", uri.path())) }
