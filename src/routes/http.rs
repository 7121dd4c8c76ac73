//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; errors map to status codes in one place.

use std::sync::Arc;
use axum::{
  extract::{Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{error, info, instrument, warn};

use crate::error::TandemError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

type ApiResult<T> = Result<Json<T>, TandemError>;

impl TandemError {
  pub fn status(&self) -> StatusCode {
    match self {
      TandemError::NotFound { .. } | TandemError::ModuleNotFound(_) | TandemError::ObjectiveNotFound { .. } => {
        StatusCode::NOT_FOUND
      }
      TandemError::InvalidStructure(_) => StatusCode::UNPROCESSABLE_ENTITY,
      TandemError::ConfirmationRequired(_) => StatusCode::CONFLICT,
      TandemError::ParseFailure(_) | TandemError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for TandemError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(target: "codetandem", kind = self.kind(), error = %self, "Request failed");
    } else {
      warn!(target: "codetandem", kind = self.kind(), error = %self, "Request rejected");
    }
    (status, Json(ErrorOut { error: self.kind(), message: self.to_string() })).into_response()
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, version: env!("CARGO_PKG_VERSION"), ai_enabled: state.openai.is_some() })
}

#[instrument(level = "info", skip(state, body), fields(curriculum = %body.curriculum_path, force = body.force))]
pub async fn http_post_init(State(state): State<Arc<AppState>>, Json(body): Json<InitIn>) -> ApiResult<InitOut> {
  let out = logic::init_project(&state, &body.curriculum_path, body.force).await?;
  info!(target: "codetandem", modules = out.modules.len(), "HTTP init done");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> ApiResult<ProgressOut> {
  Ok(Json(logic::progress_summary(&state).await?))
}

#[instrument(level = "info", skip(state), fields(file_path = %q.file_path))]
pub async fn http_get_markers(State(state): State<Arc<AppState>>, Query(q): Query<FileQuery>) -> impl IntoResponse {
  Json(logic::list_markers(&state, &q.file_path).await)
}

#[instrument(level = "info", skip(state, body), fields(file_path = %body.file_path))]
pub async fn http_post_scan(State(state): State<Arc<AppState>>, Json(body): Json<FileQuery>) -> ApiResult<ScanOut> {
  Ok(Json(logic::scan_todos(&state, &body.file_path).await?))
}

#[instrument(level = "info", skip(state, body), fields(file_path = %body.file_path, marker = ?body.marker_id))]
pub async fn http_post_submit(State(state): State<Arc<AppState>>, Json(body): Json<SubmitIn>) -> ApiResult<SubmitOut> {
  let out = logic::submit(&state, &body).await?;
  info!(
    target: "codetandem",
    module = %out.outcome.module_id,
    adjusted = out.outcome.adjusted_score,
    passed = out.outcome.passed,
    can_progress = out.outcome.can_progress,
    "HTTP submit evaluated"
  );
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_hint(State(state): State<Arc<AppState>>, Json(body): Json<AssistIn>) -> ApiResult<AssistOut> {
  Ok(Json(logic::hint(&state, &body).await?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_solution(State(state): State<Arc<AppState>>, Json(body): Json<AssistIn>) -> ApiResult<AssistOut> {
  Ok(Json(logic::solution(&state, &body).await?))
}

#[instrument(level = "info", skip(state, body), fields(difficulty = %body.difficulty))]
pub async fn http_post_level(State(state): State<Arc<AppState>>, Json(body): Json<LevelIn>) -> ApiResult<LevelOut> {
  Ok(Json(logic::set_level(&state, &body.difficulty).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_advance(State(state): State<Arc<AppState>>) -> ApiResult<AdvanceOut> {
  Ok(Json(logic::advance(&state).await?))
}

#[instrument(level = "info", skip(state, body), fields(module_id = %body.module_id, confirm = body.confirm))]
pub async fn http_post_reset(State(state): State<Arc<AppState>>, Json(body): Json<ResetIn>) -> ApiResult<ResetOut> {
  Ok(Json(logic::reset_module(&state, &body.module_id, body.confirm).await?))
}
