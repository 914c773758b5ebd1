use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::net::SocketAddr;

use access_core::authorize::AuthContext;
use access_core::domains::identity::dto::auth_dto::UserProfile;
use shared_error::AppError;

use crate::state::AppState;

/// The caller's verified identity, extracted from the `Authorization:
/// Bearer <token>` header via `Identity.verify_access_token`. Rejecting
/// with [`AppError::Authentication`] lets the envelope `IntoResponse` do
/// the rest.
pub struct AuthUser(pub UserProfile);

impl AuthUser {
    pub fn ctx(&self) -> AuthContext {
        AuthContext { user_id: self.0.user_id, role: self.0.role, building_id: self.0.building_id }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Authentication("missing bearer token".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("malformed authorization header".to_string()))?;

        let profile = state.identity.verify_access_token(token).await?;
        Ok(AuthUser(profile))
    }
}

/// Extract client IP address from request.
///
/// Tries, in order: `X-Forwarded-For`, `X-Real-IP`, then the direct
/// connection's socket address.
pub fn extract_client_ip(headers: &axum::http::HeaderMap, connect_info: Option<ConnectInfo<SocketAddr>>) -> Option<String> {
    if let Some(forwarded_for) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(client_ip) = value.split(',').next() {
                return Some(client_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return Some(value.to_string());
        }
    }

    connect_info.map(|info| info.0.ip().to_string())
}

/// Client metadata (IP, used for login origin tracking and the account
/// lockout audit trail) extractable directly in handler parameters.
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let connect_info = ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await.ok();
        Ok(ClientIp(extract_client_ip(&parts.headers, connect_info)))
    }
}
