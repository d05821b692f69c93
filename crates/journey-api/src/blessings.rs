//! Handlers for `/api/blessings` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/api/blessings` | `?keychain_id=&station_number=&visibility=&include_hidden=` |
//! | `POST`  | `/api/blessings` | Rate limited per client origin |
//! | `PATCH` | `/api/blessings/:id/hide` | Admin only; body `{"is_hidden":true}` |

use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode},
  response::IntoResponse,
};
use journey_core::{
  ValidationError,
  blessing::{Blessing, BlessingQuery, Visibility},
  keychain::KeychainId,
  ratelimit::Admission,
  reaction::select_reaction,
  store::JourneyStore,
  validate::BlessingDraft,
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::{Admin, verify_admin},
  error::ApiError,
  extract::{ApiJson, ApiPath, ApiQuery, ClientOrigin},
};

/// A blessing as returned by the API. Creation also embeds the reaction the
/// elephant gives at that station.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlessingResponse {
  #[serde(flatten)]
  pub blessing: Blessing,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub reaction: Option<ReactionSnippet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionSnippet {
  pub reaction_text: String,
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub keychain_id:    Option<String>,
  /// Empty means no station filter.
  pub station_number: Option<String>,
  /// `public`, `private` or `all`; absent means all.
  pub visibility:     Option<String>,
  #[serde(default)]
  pub include_hidden: bool,
}

impl ListParams {
  fn into_query(self) -> Result<BlessingQuery, ValidationError> {
    let keychain_id: KeychainId = self
      .keychain_id
      .filter(|s| !s.is_empty())
      .ok_or(ValidationError::Missing("keychain_id"))?
      .parse()?;
    let station_number = match self.station_number.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => Some(raw.parse::<u32>().map_err(|e| ValidationError::Invalid {
        field:  "station_number",
        reason: e.to_string(),
      })?),
    };
    let visibility = match self.visibility.as_deref() {
      None | Some("" | "all") => None,
      Some(v) => Some(v.parse::<Visibility>()?),
    };
    Ok(BlessingQuery {
      keychain_id,
      station_number,
      visibility,
      include_hidden: self.include_hidden,
    })
  }
}

/// `GET /api/blessings?keychain_id=<id>`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<Blessing>>, ApiError>
where
  S: JourneyStore + 'static,
{
  let query = params.into_query()?;
  if query.include_hidden {
    verify_admin(&headers, state.admin.as_deref())?;
  }
  let blessings = state.persist("list_blessings", state.store.list_blessings(&query)).await?;
  Ok(Json(blessings))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /api/blessings`
///
/// Input is validated and scanned before the origin's quota is touched, so a
/// rejected draft does not cost a submission.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  origin: ClientOrigin,
  ApiJson(draft): ApiJson<BlessingDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JourneyStore + 'static,
{
  let input = state.rules.validate_blessing(draft)?;

  if let admission @ Admission::Limited { .. } = state.limiter.check_and_consume(&origin.0) {
    let retry_after = admission.retry_after_secs().unwrap_or(1);
    tracing::warn!(origin = %origin.0, retry_after, "blessing rate limit exceeded");
    return Err(ApiError::RateLimited { retry_after });
  }

  let blessing = state.persist("insert_blessing", state.store.insert_blessing(input)).await?;
  tracing::info!(
    blessing_id = blessing.id,
    keychain_id = %blessing.keychain_id,
    station = blessing.station_number,
    "blessing created"
  );

  // The blessing is already stored; a missing reaction only drops the card.
  let reaction = match state.persist("active_reactions", state.store.active_reactions()).await {
    Ok(pool) => select_reaction(&pool, &blessing.keychain_id.to_string(), blessing.station_number)
      .ok()
      .map(|s| ReactionSnippet { reaction_text: s.reaction.reaction_text.clone() }),
    Err(_) => None,
  };

  Ok((StatusCode::CREATED, Json(BlessingResponse { blessing, reaction })))
}

// ─── Hide ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HideBody {
  #[serde(default = "default_hidden")]
  pub is_hidden: bool,
}

fn default_hidden() -> bool { true }

/// `PATCH /api/blessings/:id/hide`
pub async fn hide<S>(
  State(state): State<AppState<S>>,
  _admin: Admin,
  ApiPath(id): ApiPath<i64>,
  ApiJson(body): ApiJson<HideBody>,
) -> Result<Json<Blessing>, ApiError>
where
  S: JourneyStore + 'static,
{
  let blessing = state
    .persist("set_blessing_hidden", state.store.set_blessing_hidden(id, body.is_hidden))
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("blessing {id}")))?;
  tracing::info!(blessing_id = id, hidden = body.is_hidden, "blessing visibility changed");
  Ok(Json(blessing))
}
