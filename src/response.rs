use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// The fixed set of codes a response envelope can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    Ok,
    BadRequest,
    Unauthorized,
    NotFound,
    Conflict,
    TooManyRequests,
    InternalServerError,
}

impl ResponseStatus {
    pub fn code(self) -> &'static str {
        match self {
            Self::Ok => "200",
            Self::BadRequest => "400",
            Self::Unauthorized => "401",
            Self::NotFound => "404",
            Self::Conflict => "409",
            Self::TooManyRequests => "429",
            Self::InternalServerError => "500",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::Ok => "Success",
            Self::BadRequest => "Bad Request",
            Self::Unauthorized => "Unauthorized",
            Self::NotFound => "Not Found",
            Self::Conflict => "Conflict",
            Self::TooManyRequests => "Too Many Requests",
            Self::InternalServerError => "Internal Server Error",
        }
    }

    pub fn http(self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// `{responseCode, responseMessage, data?}` body shared by every endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub response_code: &'static str,
    pub response_message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(status: ResponseStatus, data: Option<T>) -> Self {
        Self {
            response_code: status.code(),
            response_message: status.message(),
            data,
        }
    }
}

/// Successful (200) envelope, optionally carrying data.
#[derive(Debug)]
pub struct ApiResponse<T>(pub Option<T>);

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self(Some(data))
    }
}

impl ApiResponse<()> {
    pub fn empty() -> Self {
        Self(None)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        envelope_response(ResponseStatus::Ok, self.0)
    }
}

pub fn envelope_response<T: Serialize>(status: ResponseStatus, data: Option<T>) -> Response {
    (status.http(), Json(Envelope::new(status, data))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_envelope_omits_data() {
        let json = serde_json::to_value(Envelope::<()>::new(ResponseStatus::Ok, None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"responseCode": "200", "responseMessage": "Success"})
        );
    }

    #[test]
    fn envelope_code_agrees_with_http_status() {
        for status in [
            ResponseStatus::Ok,
            ResponseStatus::BadRequest,
            ResponseStatus::Unauthorized,
            ResponseStatus::NotFound,
            ResponseStatus::Conflict,
            ResponseStatus::TooManyRequests,
            ResponseStatus::InternalServerError,
        ] {
            assert_eq!(status.code(), status.http().as_str());
        }
    }
}
