use std::convert::Infallible;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tracing::warn;

use super::claims::{JwtKeys, UserInfo};

/// Claims already decoded by the gateway, as base64url JSON.
pub const JWT_PAYLOAD_HEADER: &str = "jwtpayload";

/// Identity of the caller, if the request carried a usable credential.
///
/// Never rejects: a missing or broken credential just yields `None`.
#[derive(Debug, Clone, Default)]
pub struct MaybeIdentity(pub Option<UserInfo>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        Ok(MaybeIdentity(identity_from_headers(&parts.headers, &keys)))
    }
}

pub fn identity_from_headers(headers: &HeaderMap, keys: &JwtKeys) -> Option<UserInfo> {
    if let Some(payload) = headers
        .get(JWT_PAYLOAD_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return decode_payload(payload);
    }

    let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())?;
    let (scheme, token) = auth.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    match keys.verify(token.trim()) {
        Ok(claims) => Some(claims.user),
        Err(e) => {
            warn!(error = %e, "invalid or expired token");
            None
        }
    }
}

fn decode_payload(payload: &str) -> Option<UserInfo> {
    let raw = match URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "error while decoding jwt payload");
            return None;
        }
    };
    match serde_json::from_slice::<UserInfo>(&raw) {
        Ok(info) => Some(info),
        Err(e) => {
            warn!(error = %e, "error while unmarshalling jwt payload");
            None
        }
    }
}
