use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use service::auth::errors::{AuthError, ErrorKind};
use service::errors::ServiceError;

/// Response envelope: `{"ok": T}` or `{"error": kind, "message": text}`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Ok { ok: T },
    Error { error: ErrorKind, message: String },
}

impl<T> ApiResponse<T> {
    pub fn ok(value: T) -> Self {
        ApiResponse::Ok { ok: value }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Body of endpoints that only confirm an action.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub message: String,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::MalformedInput | ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::InvalidCredentials | ErrorKind::TokenNotFound | ErrorKind::TokenExpired => StatusCode::UNAUTHORIZED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::PersistenceError => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let kind = e.public_kind();
        let status = status_for(kind);
        if status.is_server_error() {
            error!(code = e.code(), error = %e, "request failed");
        } else {
            warn!(code = e.code(), error = %e, "request rejected");
        }
        ApiError { status, kind, message: e.public_message() }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Auth(inner) => inner.into(),
            ServiceError::NotFound(msg) => ApiError { status: StatusCode::NOT_FOUND, kind: ErrorKind::NotFound, message: msg },
        }
    }
}

impl ApiError {
    fn malformed(message: String) -> Self {
        warn!(error = %message, "request body or query rejected");
        ApiError { status: status_for(ErrorKind::MalformedInput), kind: ErrorKind::MalformedInput, message }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::malformed(format!("invalid json supplied: {}", e.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError::malformed(format!("invalid query string: {}", e.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse::Error { error: self.kind, message: self.message };
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
    #[error("migration failed: {0}")]
    Migration(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::ok(serde_json::json!({"a": 1}))).unwrap();
        assert_eq!(ok, serde_json::json!({"ok": {"a": 1}}));

        let err: ApiResponse<()> = ApiResponse::Error { error: ErrorKind::TokenExpired, message: "token expired".into() };
        assert_eq!(
            serde_json::to_value(err).unwrap(),
            serde_json::json!({"error": "token_expired", "message": "token expired"})
        );
    }

    #[test]
    fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::MalformedInput("x".into()), StatusCode::BAD_REQUEST),
            (AuthError::IdentityNotFound, StatusCode::UNAUTHORIZED),
            (AuthError::CorruptHash("x".into()), StatusCode::UNAUTHORIZED),
            (AuthError::TokenExpired, StatusCode::UNAUTHORIZED),
            (AuthError::Conflict, StatusCode::CONFLICT),
            (AuthError::Timeout, StatusCode::SERVICE_UNAVAILABLE),
            (AuthError::MintFailure("rng".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (e, status) in cases {
            assert_eq!(ApiError::from(e).status, status);
        }
    }

    #[test]
    fn persistence_details_stay_internal() {
        let e = ApiError::from(AuthError::Persistence("password=hunter2 host=db".into()));
        assert_eq!(e.kind, ErrorKind::PersistenceError);
        assert!(!e.message.contains("hunter2"));
    }
}
