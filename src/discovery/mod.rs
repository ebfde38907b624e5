use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod quota;
pub mod selector;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::discovery_routes()
}
