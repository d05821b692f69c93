//! `GET /api/reactions?journey_id=&station_number=`

use axum::{Json, extract::State};
use journey_core::{
  ValidationError,
  reaction::{EmotionType, ReactionCategory, select_reaction},
  store::JourneyStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, extract::ApiQuery};

#[derive(Debug, Deserialize)]
pub struct ReactionParams {
  pub journey_id:     Option<String>,
  pub station_number: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReactionResponse {
  pub id:             i64,
  pub reaction_text:  String,
  pub category:       ReactionCategory,
  pub emotion_type:   EmotionType,
  /// The hash the choice was derived from, so clients can verify it.
  pub seed:           u32,
  pub journey_id:     String,
  pub station_number: u32,
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  ApiQuery(params): ApiQuery<ReactionParams>,
) -> Result<Json<ReactionResponse>, ApiError>
where
  S: JourneyStore + 'static,
{
  let journey_id = params
    .journey_id
    .filter(|s| !s.is_empty())
    .ok_or(ValidationError::Missing("journey_id"))?;
  let station_number = params.station_number.ok_or(ValidationError::Missing("station_number"))?;

  let pool = state.persist("active_reactions", state.store.active_reactions()).await?;
  let selection = select_reaction(&pool, &journey_id, station_number).inspect_err(|_| {
    tracing::error!("reaction pool is empty");
  })?;

  let reaction = selection.reaction;
  Ok(Json(ReactionResponse {
    id: reaction.id,
    reaction_text: reaction.reaction_text.clone(),
    category: reaction.category,
    emotion_type: reaction.emotion_type,
    seed: selection.seed,
    journey_id,
    station_number,
  }))
}
