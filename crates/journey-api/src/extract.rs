//! Request extractors that reject with [`ApiError`] instead of axum's plain
//! text rejections.

use std::net::SocketAddr;

use axum::{
  extract::{ConnectInfo, FromRequest, FromRequestParts},
  http::request::Parts,
};
use journey_core::store::JourneyStore;

use crate::{AppState, error::ApiError};

/// `Json<T>` whose rejection is a `VALIDATION_ERROR` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query<T>` whose rejection is a `VALIDATION_ERROR` body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// `Path<T>` whose rejection is a `VALIDATION_ERROR` body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

/// The key a submission is rate limited under: the client IP.
///
/// `X-Forwarded-For` is honoured only when the server is configured to sit
/// behind a proxy; otherwise the socket peer address is used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOrigin(pub String);

impl ClientOrigin {
  fn resolve(parts: &Parts, trust_forwarded: bool) -> Self {
    if trust_forwarded
      && let Some(ip) = parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
    {
      return Self(ip.to_owned());
    }
    match parts.extensions.get::<ConnectInfo<SocketAddr>>() {
      Some(ConnectInfo(addr)) => Self(addr.ip().to_string()),
      None => Self("unknown".to_owned()),
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for ClientOrigin
where
  S: JourneyStore + 'static,
{
  type Rejection = std::convert::Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    Ok(Self::resolve(parts, state.trust_forwarded))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  fn parts(forwarded: Option<&str>, peer: Option<&str>) -> Parts {
    let mut builder = Request::builder();
    if let Some(f) = forwarded {
      builder = builder.header("x-forwarded-for", f);
    }
    let (mut parts, ()) = builder.body(()).unwrap().into_parts();
    if let Some(peer) = peer {
      parts.extensions.insert(ConnectInfo(peer.parse::<SocketAddr>().unwrap()));
    }
    parts
  }

  #[test]
  fn peer_address_is_the_default_origin() {
    let p = parts(Some("9.9.9.9"), Some("10.0.0.1:5000"));
    assert_eq!(ClientOrigin::resolve(&p, false).0, "10.0.0.1");
  }

  #[test]
  fn first_forwarded_hop_wins_behind_a_proxy() {
    let p = parts(Some("203.0.113.7, 10.0.0.2"), Some("10.0.0.1:5000"));
    assert_eq!(ClientOrigin::resolve(&p, true).0, "203.0.113.7");
  }

  #[test]
  fn unknown_without_any_address() {
    assert_eq!(ClientOrigin::resolve(&parts(None, None), true).0, "unknown");
  }
}
