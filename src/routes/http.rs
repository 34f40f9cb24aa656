//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; game errors become 4xx JSON bodies.

use std::sync::Arc;
use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::game::GameError;
use crate::logic::*;
use crate::player::{PlayError, PlayerView};
use crate::protocol::*;
use crate::session::SessionError;
use crate::state::AppState;
use crate::taxonomy::catalogue;

/// A rejected request, rendered as `{"error": ...}`.
pub struct ApiError(PlayError);

impl From<PlayError> for ApiError {
  fn from(e: PlayError) -> Self {
    Self(e)
  }
}

pub fn status_for(e: &PlayError) -> StatusCode {
  match e {
    PlayError::Game(GameError::TokenOutOfRange { .. }) => StatusCode::BAD_REQUEST,
    PlayError::Game(_) => StatusCode::CONFLICT,
    PlayError::Session(SessionError::Locked(_)) => StatusCode::FORBIDDEN,
    PlayError::Session(SessionError::EmptyBatch) => StatusCode::SERVICE_UNAVAILABLE,
    PlayError::Session(_) => StatusCode::CONFLICT,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = status_for(&self.0);
    warn!(target: "syntax_sweep", %status, error = %self.0, "HTTP request rejected");
    (status, Json(ErrorOut { error: self.0.to_string() })).into_response()
  }
}

type ViewResult = Result<Json<PlayerView>, ApiError>;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info")]
pub async fn http_get_taxonomy() -> impl IntoResponse { Json(catalogue()) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_view(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_progress(&state).await)
}

#[instrument(level = "info", skip(state), fields(deck = ?body.deck, focus = ?body.focus))]
pub async fn http_post_session(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SessionIn>,
) -> ViewResult {
  let view = do_start_session(&state, body.deck, body.focus).await?;
  info!(target: "session", deck = ?body.deck, total = view.session.as_ref().map(|s| s.total), "HTTP session started");
  Ok(Json(view))
}

#[instrument(level = "info", skip(state), fields(index = body.index))]
pub async fn http_post_tap(
  State(state): State<Arc<AppState>>,
  Json(body): Json<TapIn>,
) -> ViewResult {
  Ok(Json(do_tap(&state, body.index, None).await?))
}

#[instrument(level = "info", skip(state), fields(code = %body.code))]
pub async fn http_post_code(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CodeIn>,
) -> ViewResult {
  Ok(Json(do_choose_code(&state, body.code, None).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_advance(State(state): State<Arc<AppState>>) -> ViewResult {
  Ok(Json(do_advance(&state).await?))
}

#[instrument(level = "info", skip(state), fields(action = ?body.action))]
pub async fn http_post_follow_up(
  State(state): State<Arc<AppState>>,
  Json(body): Json<FollowUpIn>,
) -> ViewResult {
  Ok(Json(do_follow_up(&state, body.action).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_exit(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_exit(&state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_tutorial(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(do_complete_tutorial(&state).await)
}
