//! Handlers for the hand-off chain of each keychain.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/keychains` | Status of every id 0–99 plus totals |
//! | `GET`  | `/api/keychains/:id/events` | Ordered chain |
//! | `POST` | `/api/keychains/:id/events` | Body: `{"to_name":"…"}` |
//! | `GET`  | `/api/keychains/:id/story` | Shareable plain text |
//!
//! The server builds every event itself from the stored tail, so a client
//! cannot break the prompt threading between consecutive hand-offs.

use axum::{
  Json,
  extract::State,
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::Utc;
use journey_core::{
  chain::{Handoff, build_handoff, render_story},
  event::{HistoryEvent, JourneySummary, KeychainStatus},
  keychain::KeychainId,
  prompt::assign_quest,
  store::JourneyStore,
};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  error::ApiError,
  extract::{ApiJson, ApiPath},
};

// ─── Overview ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct OverviewResponse {
  pub summary:   JourneySummary,
  pub keychains: Vec<KeychainStatus>,
}

/// `GET /api/keychains`
pub async fn overview<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<OverviewResponse>, ApiError>
where
  S: JourneyStore + 'static,
{
  let log = state.persist("journey_log", state.store.journey_log()).await?;
  Ok(Json(OverviewResponse { summary: log.summary(), keychains: log.overview() }))
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// `GET /api/keychains/:id/events`
pub async fn list_events<S>(
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<String>,
) -> Result<Json<Vec<HistoryEvent>>, ApiError>
where
  S: JourneyStore + 'static,
{
  let id: KeychainId = id.parse()?;
  let chain = state.persist("list_events", state.store.list_events(id)).await?;
  Ok(Json(chain))
}

#[derive(Debug, Deserialize)]
pub struct NewHolderBody {
  pub to_name: Option<String>,
}

/// `POST /api/keychains/:id/events`
pub async fn append_event<S>(
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<String>,
  ApiJson(body): ApiJson<NewHolderBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JourneyStore + 'static,
{
  let id: KeychainId = id.parse()?;
  let to_name = state.rules.validate_holder_name(body.to_name.as_deref().unwrap_or_default())?;

  let chain = state.persist("list_events", state.store.list_events(id)).await?;
  // Never stamp a hand-off earlier than the tail it follows.
  let now = chain.last().map_or_else(Utc::now, |tail| Utc::now().max(tail.timestamp));
  let quest = assign_quest(&mut OsRng);
  let handoff = build_handoff(id, &chain, &to_name, quest, now);

  state.persist("append_event", state.store.append_event(handoff.event.clone())).await?;
  tracing::info!(
    keychain_id = %id,
    event_id = %handoff.event.id,
    station = chain.len() + 1,
    "hand-off recorded"
  );

  Ok((StatusCode::CREATED, Json::<Handoff>(handoff)))
}

// ─── Story ───────────────────────────────────────────────────────────────────

/// `GET /api/keychains/:id/story`
pub async fn story<S>(
  State(state): State<AppState<S>>,
  ApiPath(id): ApiPath<String>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JourneyStore + 'static,
{
  let id: KeychainId = id.parse()?;
  let chain = state.persist("list_events", state.store.list_events(id)).await?;
  Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], render_story(id, &chain)))
}
