use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    context::{positive_id, RequestContext},
    discovery::{dto::TargetUserData, quota::QuotaPolicy, services},
    error::ApiError,
    response::ApiResponse,
    state::AppState,
};

pub fn discovery_routes() -> Router<AppState> {
    Router::new().route("/get-target-user/:id", get(get_target_user))
}

#[instrument(
    skip_all,
    fields(
        action = "Get Target User",
        endpoint = %ctx.endpoint,
        ip = %ctx.ip,
        request_id = %ctx.request_id,
        caller = ?ctx.caller_id()
    )
)]
pub async fn get_target_user(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<TargetUserData>, ApiError> {
    let mode = state.config.status_mode;
    let viewer_id = positive_id(&raw_id).map_err(|e| e.in_mode(mode))?;
    let policy = QuotaPolicy::new(state.config.discovery.daily_limit);

    let candidate = services::discover(
        state.users.as_ref(),
        state.swipes.as_ref(),
        policy,
        viewer_id,
    )
    .await
    .map_err(|e| e.in_mode(mode))?;
    Ok(ApiResponse::data(candidate.into()))
}
