use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use access_core::domains::visits::dto::visit_dto::{CreateVisitReq, PatchVisitReq, ScanReq};
use access_core::domains::visits::model::VisitState;
use access_core::domains::visits::repository::VisitListFilter;
use shared_error::AppError;
use shared_types::PageRequest;

use crate::envelope;
use crate::extractors::AuthUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VisitListQuery {
    pub building: Option<Uuid>,
    pub host: Option<Uuid>,
    pub state: Option<VisitState>,
    #[serde(flatten)]
    pub page: PageRequest,
}

pub async fn create(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateVisitReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.visit_engine.create(caller.ctx(), payload).await?;
    Ok(envelope::created(resp))
}

pub async fn list(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<VisitListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filter = VisitListFilter { building_id: query.building, host_id: query.host, state: query.state };
    let result = state.visit_engine.list(caller.ctx(), filter, query.page).await?;
    Ok(envelope::page(result, query.page))
}

pub async fn get(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.visit_engine.get(caller.ctx(), visit_id).await?;
    Ok(envelope::ok(resp))
}

pub async fn patch(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
    Json(payload): Json<PatchVisitReq>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.visit_engine.patch(caller.ctx(), visit_id, payload).await?;
    Ok(envelope::ok(resp))
}

pub async fn cancel(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(visit_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let resp = state.visit_engine.cancel(caller.ctx(), visit_id).await?;
    Ok(envelope::ok(resp))
}

pub async fn scan(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<ScanReq>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate().map_err(|e| AppError::Validation(e.to_string()))?;
    let resp = state.visit_engine.scan(caller.ctx(), payload).await?;
    Ok(envelope::ok(resp))
}
