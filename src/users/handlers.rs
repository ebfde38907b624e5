use axum::{
    extract::{rejection::JsonRejection, FromRef, Path, State},
    routing::{post, put},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::claims::JwtKeys,
    context::{positive_id, RequestContext},
    error::{ApiError, AppError},
    response::ApiResponse,
    state::AppState,
    users::{
        dto::{LoginData, LoginRequest, RegisterRequest, RegisteredUser},
        services,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/upgrade-account/:id", put(upgrade_account))
}

#[instrument(
    skip_all,
    fields(action = "Register", endpoint = %ctx.endpoint, ip = %ctx.ip, request_id = %ctx.request_id)
)]
pub async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<ApiResponse<RegisteredUser>, ApiError> {
    let mode = state.config.status_mode;
    let registration = payload
        .map_err(AppError::from)
        .and_then(|Json(req)| req.validate())
        .map_err(|e| e.in_mode(mode))?;

    let user_id = services::register(state.users.as_ref(), registration)
        .await
        .map_err(|e| e.in_mode(mode))?;
    Ok(ApiResponse::data(RegisteredUser { user_id }))
}

#[instrument(
    skip_all,
    fields(action = "Login", endpoint = %ctx.endpoint, ip = %ctx.ip, request_id = %ctx.request_id)
)]
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginData>, ApiError> {
    let mode = state.config.status_mode;
    let Json(req) = payload.map_err(|e| AppError::from(e).in_mode(mode))?;
    req.validate().map_err(|e| e.in_mode(mode))?;

    let keys = JwtKeys::from_ref(&state);
    let data = services::login(state.users.as_ref(), &keys, &req.username, &req.password)
        .await
        .map_err(|e| e.in_mode(mode))?;
    Ok(ApiResponse::data(data))
}

#[instrument(
    skip_all,
    fields(action = "Upgrade Account", endpoint = %ctx.endpoint, ip = %ctx.ip, request_id = %ctx.request_id)
)]
pub async fn upgrade_account(
    State(state): State<AppState>,
    ctx: RequestContext,
    Path(raw_id): Path<String>,
) -> Result<ApiResponse<()>, ApiError> {
    let mode = state.config.status_mode;
    let id = positive_id(&raw_id).map_err(|e| e.in_mode(mode))?;
    services::upgrade_account(state.users.as_ref(), id)
        .await
        .map_err(|e| e.in_mode(mode))?;
    Ok(ApiResponse::empty())
}
