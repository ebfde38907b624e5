use axum::{
    extract::{rejection::JsonRejection, State},
    routing::put,
    Json, Router,
};
use tracing::instrument;

use crate::{
    context::RequestContext,
    error::{ApiError, AppError},
    response::ApiResponse,
    state::AppState,
    swipes::{dto::SwipeRequest, services},
};

pub fn swipe_routes() -> Router<AppState> {
    Router::new().route("/swipe", put(swipe))
}

#[instrument(
    skip_all,
    fields(
        action = "Swipe",
        endpoint = %ctx.endpoint,
        ip = %ctx.ip,
        request_id = %ctx.request_id,
        caller = ?ctx.caller_id()
    )
)]
pub async fn swipe(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<SwipeRequest>, JsonRejection>,
) -> Result<ApiResponse<()>, ApiError> {
    let mode = state.config.status_mode;
    let cmd = payload
        .map_err(AppError::from)
        .and_then(|Json(req)| req.validate())
        .map_err(|e| e.in_mode(mode))?;

    services::decide(state.swipes.as_ref(), cmd)
        .await
        .map_err(|e| e.in_mode(mode))?;
    Ok(ApiResponse::empty())
}
