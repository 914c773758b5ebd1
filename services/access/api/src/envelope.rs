//! The uniform `{success, data?, error?, meta?}` response envelope every
//! HTTP route returns, per spec §6. `AppError`'s own `IntoResponse` already
//! produces the `error` shape; these helpers cover the `success` side.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use shared_types::{Page, PageRequest};

pub fn ok<T: Serialize>(data: T) -> impl IntoResponse {
    Json(json!({ "success": true, "data": data }))
}

pub fn created<T: Serialize>(data: T) -> impl IntoResponse {
    (StatusCode::CREATED, Json(json!({ "success": true, "data": data })))
}

pub fn no_content() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Wraps a paginated result with the `{page, limit, total, totalPages}`
/// meta block every list endpoint returns.
pub fn page<T: Serialize>(page: Page<T>, request: PageRequest) -> impl IntoResponse {
    let meta = json!({
        "page": request.page.max(1),
        "limit": request.per_page(),
        "total": page.total,
        "totalPages": page.total_pages,
    });
    Json(json!({ "success": true, "data": page.items, "meta": meta }))
}
