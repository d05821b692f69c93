//! HTTP Basic auth for the admin operations.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use journey_core::store::JourneyStore;
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// Credentials accepted as the admin for this server instance.
#[derive(Clone, Deserialize)]
pub struct AdminAuth {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

impl std::fmt::Debug for AdminAuth {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AdminAuth").field("username", &self.username).finish_non_exhaustive()
  }
}

/// Zero-size marker: present in the handler means the caller is the admin.
pub struct Admin;

/// Verify Basic credentials against `config`. With no admin configured every
/// request is refused.
pub fn verify_admin(headers: &HeaderMap, config: Option<&AdminAuth>) -> Result<Admin, ApiError> {
  let config = config.ok_or(ApiError::Unauthorized)?;

  let encoded = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Basic "))
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;
  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  if username != config.username {
    return Err(ApiError::Unauthorized);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash).map_err(|e| {
    tracing::error!(error = %e, "configured admin password hash is not a valid PHC string");
    ApiError::Unauthorized
  })?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Admin)
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: JourneyStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let admin = verify_admin(&parts.headers, state.admin.as_deref());
    if admin.is_err() {
      tracing::warn!(path = %parts.uri.path(), "admin authentication failed");
    }
    admin
  }
}
