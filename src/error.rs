use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    config::StatusMode,
    response::{envelope_response, ResponseStatus},
    users::repo::CreateUserError,
};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("username already registered")]
    UsernameTaken,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("daily discovery limit of {limit} reached")]
    QuotaExceeded { limit: u32 },

    #[error("no candidate available")]
    NoCandidateAvailable,

    #[error("no pending swipe to decide on")]
    DecisionConflict,

    #[error("persistence error: {0:#}")]
    Persistence(anyhow::Error),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn status(&self, mode: StatusMode) -> ResponseStatus {
        match self {
            Self::Validation(_) => ResponseStatus::BadRequest,
            _ if mode == StatusMode::Compatible => ResponseStatus::InternalServerError,
            Self::InvalidCredentials => ResponseStatus::Unauthorized,
            Self::NotFound(_) | Self::NoCandidateAvailable => ResponseStatus::NotFound,
            Self::UsernameTaken | Self::DecisionConflict => ResponseStatus::Conflict,
            Self::QuotaExceeded { .. } => ResponseStatus::TooManyRequests,
            Self::Persistence(_) | Self::Internal(_) => ResponseStatus::InternalServerError,
        }
    }

    pub fn in_mode(self, mode: StatusMode) -> ApiError {
        ApiError { error: self, mode }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<CreateUserError> for AppError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::BlankField(field) => Self::Validation(format!("{field} is required")),
            CreateUserError::UsernameTaken => Self::UsernameTaken,
            CreateUserError::Store(e) => Self::Persistence(e),
        }
    }
}

/// An [`AppError`] bound to the status mapping it will be rendered with.
#[derive(Debug)]
pub struct ApiError {
    pub error: AppError,
    pub mode: StatusMode,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status(self.mode);
        match &self.error {
            AppError::NotFound(_) | AppError::InvalidCredentials => {
                info!(error = %self.error, code = status.code(), "request refused")
            }
            AppError::Persistence(_) | AppError::Internal(_) => {
                error!(error = %self.error, code = status.code(), "request failed")
            }
            _ => warn!(error = %self.error, code = status.code(), "request denied"),
        }
        envelope_response::<()>(status, None)
    }
}
