use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use access_core::domains::identity::dto::auth_dto::{LoginReq, LogoutReq, RefreshReq, RegisterReq};
use shared_error::AppError;

use crate::envelope;
use crate::extractors::{AuthUser, ClientIp};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.identity.register(payload).await?;
    Ok(envelope::created(resp))
}

pub async fn login(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<LoginReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.identity.login(payload, ip).await?;
    Ok(envelope::ok(resp))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.identity.refresh(&payload.refresh_token).await?;
    Ok(envelope::ok(resp))
}

pub async fn logout(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<LogoutReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    if payload.all_devices {
        state.identity.revoke_all(caller.user_id).await?;
    } else {
        state.identity.revoke(&payload.refresh_token).await?;
    }
    Ok(envelope::no_content())
}

pub async fn profile(AuthUser(caller): AuthUser) -> impl IntoResponse {
    envelope::ok(caller)
}
