//! `POST /api/reports`: flag a blessing for review.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use journey_core::{ValidationError, store::JourneyStore, validate::ReportDraft};

use crate::{AppState, error::ApiError, extract::ApiJson};

pub async fn create<S>(
  State(state): State<AppState<S>>,
  ApiJson(draft): ApiJson<ReportDraft>,
) -> Result<impl IntoResponse, ApiError>
where
  S: JourneyStore + 'static,
{
  let input = state.rules.validate_report(draft)?;

  let exists = state.persist("get_blessing", state.store.get_blessing(input.blessing_id)).await?;
  if exists.is_none() {
    return Err(
      ValidationError::Invalid {
        field:  "blessing_id",
        reason: format!("no blessing with id {}", input.blessing_id),
      }
      .into(),
    );
  }

  let report = state.persist("insert_report", state.store.insert_report(input)).await?;
  tracing::info!(
    report_id = report.id,
    blessing_id = report.blessing_id,
    reason = report.reason.as_str(),
    "report filed"
  );
  Ok((StatusCode::CREATED, Json(report)))
}
