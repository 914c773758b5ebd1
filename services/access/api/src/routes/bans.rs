use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use access_core::domains::bans::dto::ban_dto::{CreateBanReq, UnbanReq};
use shared_error::AppError;

use crate::envelope;
use crate::extractors::AuthUser;
use crate::state::AppState;

pub async fn ban(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateBanReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.ban_engine.ban(caller.ctx(), payload).await?;
    Ok(envelope::created(resp))
}

pub async fn unban(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(ban_id): Path<Uuid>,
    Json(payload): Json<UnbanReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.ban_engine.unban(caller.ctx(), ban_id, payload).await?;
    Ok(envelope::ok(resp))
}

pub async fn check(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(phone): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.ban_engine.check(caller.ctx(), &phone).await?;
    Ok(envelope::ok(resp))
}
