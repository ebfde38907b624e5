use std::{convert::Infallible, net::SocketAddr};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{
    auth::{claims::JwtKeys, claims::UserInfo, extractors::MaybeIdentity},
    error::AppError,
};

/// Per-request facts handlers log with: who called, from where, which endpoint.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: Uuid,
    pub endpoint: String,
    pub ip: String,
    pub identity: Option<UserInfo>,
}

impl RequestContext {
    pub fn caller_id(&self) -> Option<i64> {
        self.identity.as_ref().map(|u| u.id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeIdentity(identity) = MaybeIdentity::from_request_parts(parts, state).await?;
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(Self {
            request_id: Uuid::new_v4(),
            endpoint: parts.uri.path().to_string(),
            ip: client_ip(&parts.headers, peer),
            identity,
        })
    }
}

/// `X-Real-Ip`, then `X-Forwarded-For`, then the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    ["x-real-ip", "x-forwarded-for"]
        .into_iter()
        .filter_map(|name| headers.get(name).and_then(|v| v.to_str().ok()))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.to_string()))
        .unwrap_or_else(|| "unknown".into())
}

/// Path ids are positive integers; anything else is a validation failure.
pub fn positive_id(raw: &str) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::validation(format!("id must be a positive integer, got {raw:?}"))),
    }
}
