//! JSON HTTP API for the keychain journey tracker.
//!
//! Exposes an axum [`Router`] backed by any
//! [`journey_core::store::JourneyStore`]. TLS, CORS and request tracing are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = journey_api::router(AppState::new(Arc::new(store)));
//! ```

pub mod auth;
pub mod blessings;
pub mod error;
pub mod extract;
pub mod keychains;
pub mod reactions;
pub mod reports;
pub mod service;
pub mod state;

use axum::{
  Router,
  routing::{get, patch, post},
};
use journey_core::store::JourneyStore;

pub use error::ApiError;
pub use state::AppState;

/// Build the complete router for `state`.
///
/// The returned `Router<()>` can be nested or layered by the caller.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: JourneyStore + 'static,
{
  Router::new()
    // Blessings
    .route("/api/blessings", get(blessings::list::<S>).post(blessings::create::<S>))
    .route("/api/blessings/{id}/hide", patch(blessings::hide::<S>))
    // Reports
    .route("/api/reports", post(reports::create::<S>))
    // Reactions
    .route("/api/reactions", get(reactions::get_one::<S>))
    // Keychain journeys
    .route("/api/keychains", get(keychains::overview::<S>))
    .route(
      "/api/keychains/{id}/events",
      get(keychains::list_events::<S>).post(keychains::append_event::<S>),
    )
    .route("/api/keychains/{id}/story", get(keychains::story::<S>))
    // Service
    .route("/health", get(service::health::<S>))
    .route("/api/version", get(service::version))
    .fallback(service::not_found)
    .with_state(state)
}
