use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Application-wide error taxonomy.
///
/// Every handler and service returns `Result<_, AppError>`; the `IntoResponse`
/// impl below is the single place HTTP status codes and the `{success,
/// error}` envelope are decided. Engine-level errors (ban conflicts, invalid
/// visit transitions, exhausted licenses, ...) are typed where they occur and
/// converted into one of these variants at the HTTP/WS boundary rather than
/// leaking their own status codes.
#[derive(Debug)]
pub enum AppError {
    /// Malformed or semantically invalid request payload.
    Validation(String),
    /// Missing, expired, or malformed credentials.
    Authentication(String),
    /// Authenticated but not permitted to perform this action.
    Authorization(String),
    /// Referenced resource does not exist (or isn't visible to this caller).
    NotFound(String),
    /// Request conflicts with current state (duplicate code, stale version, etc).
    Conflict(String),
    /// Building's license/seat limit would be exceeded by this operation.
    License(String),
    /// Caller is being rate limited; carries the retry-after hint in seconds.
    RateLimit(u64),
    /// An upstream dependency (database, cache, realtime transport) failed.
    Dependency(String),
    /// Anything else: a bug, a panic boundary, an invariant violation.
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Authentication(msg) => write!(f, "Authentication error: {}", msg),
            AppError::Authorization(msg) => write!(f, "Authorization error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::License(msg) => write!(f, "License error: {}", msg),
            AppError::RateLimit(retry_after) => {
                write!(f, "Rate limited, retry after {}s", retry_after)
            },
            AppError::Dependency(msg) => write!(f, "Dependency error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            AppError::Validation(ref msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_ERROR")
            },
            AppError::Authentication(ref msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "AUTHENTICATION_ERROR")
            },
            AppError::Authorization(ref msg) => {
                (StatusCode::FORBIDDEN, msg.clone(), "AUTHORIZATION_ERROR")
            },
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone(), "NOT_FOUND"),
            AppError::Conflict(ref msg) => (StatusCode::CONFLICT, msg.clone(), "CONFLICT"),
            AppError::License(ref msg) => {
                (StatusCode::FORBIDDEN, msg.clone(), "LICENSE_EXHAUSTED")
            },
            AppError::RateLimit(retry_after) => {
                let body = Json(json!({
                    "success": false,
                    "error": {
                        "code": "RATE_LIMITED",
                        "message": "Too many requests",
                        "retryAfterSeconds": retry_after,
                    }
                }));
                let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
                if let Ok(v) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
                    response.headers_mut().insert("retry-after", v);
                }
                return response;
            },
            AppError::Dependency(ref msg) => {
                tracing::error!("Dependency error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Upstream dependency unavailable".to_string(),
                    "DEPENDENCY_ERROR",
                )
            },
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            },
        };

        let body = Json(json!({
            "success": false,
            "error": {
                "code": code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("resource not found".to_string()),
            other => {
                tracing::error!("Database error: {:?}", other);
                AppError::Dependency(format!("database error: {}", other))
            },
        }
    }
}

impl From<std::env::VarError> for AppError {
    fn from(err: std::env::VarError) -> Self {
        AppError::Internal(format!("configuration error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_display_messages() {
        assert!(AppError::NotFound("visit".into()).to_string().contains("visit"));
        assert!(AppError::RateLimit(30).to_string().contains("30"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("building".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_rate_limit_maps_to_429_with_retry_after_header() {
        let response = AppError::RateLimit(42).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "42");
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
