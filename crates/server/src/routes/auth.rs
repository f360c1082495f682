use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use service::auth::domain::{LoginInput, RegisterInput, Student};

use crate::errors::{ApiError, ApiResponse, Message};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub expiry: DateTime<Utc>,
    pub user: Student,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[utoipa::path(post, path = "/users/login", tag = "auth", request_body = crate::openapi::LoginRequest, responses((status = 200, description = "Logged in", body = crate::openapi::LoginResponse), (status = 401, description = "Invalid credentials")))]
pub async fn login(State(state): State<AppState>, body: Result<Json<LoginInput>, JsonRejection>) -> Result<ApiResponse<LoginOutput>, ApiError> {
    let Json(input) = body?;
    let session = state.auth.login(input).await?;
    Ok(ApiResponse::ok(LoginOutput {
        token: session.token.token,
        expiry: session.token.expiry,
        user: session.user,
    }))
}

#[utoipa::path(post, path = "/users/logout", tag = "auth", request_body = crate::openapi::LogoutRequestDoc, responses((status = 200, description = "Logged out")))]
pub async fn logout(State(state): State<AppState>, body: Result<Json<LogoutRequest>, JsonRejection>) -> Result<ApiResponse<Message>, ApiError> {
    let Json(input) = body?;
    state.auth.logout(&input.token).await?;
    Ok(ApiResponse::ok(Message { message: "logged out" }))
}

#[utoipa::path(post, path = "/users/register", tag = "auth", request_body = crate::openapi::RegisterRequest, responses((status = 200, description = "Registered", body = crate::openapi::StudentDoc), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<AppState>, body: Result<Json<RegisterInput>, JsonRejection>) -> Result<ApiResponse<Student>, ApiError> {
    let Json(input) = body?;
    let student = state.auth.register(input).await?;
    Ok(ApiResponse::ok(student))
}

#[utoipa::path(get, path = "/users/me", tag = "students", security(("bearer" = [])), responses((status = 200, description = "Current student", body = crate::openapi::StudentDoc), (status = 401, description = "Unauthorized")))]
pub async fn me(Extension(student): Extension<Student>) -> ApiResponse<Student> {
    ApiResponse::ok(student)
}

#[utoipa::path(post, path = "/users/password", tag = "students", security(("bearer" = [])), request_body = crate::openapi::PasswordRequestDoc, responses((status = 200, description = "Password changed"), (status = 400, description = "Bad Request")))]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(student): Extension<Student>,
    body: Result<Json<PasswordRequest>, JsonRejection>,
) -> Result<ApiResponse<Message>, ApiError> {
    let Json(input) = body?;
    state.auth.reset_password(student.id, &input.password).await?;
    Ok(ApiResponse::ok(Message { message: "password updated" }))
}

/// Resolve `Authorization: Bearer <token>` to a student and attach it to the request.
/// A missing header is treated as an empty one.
pub async fn require_bearer_token(State(state): State<AppState>, mut req: Request, next: Next) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match state.auth.authenticate(&header).await {
        Ok(student) => {
            tracing::debug!(path = %req.uri().path(), student_id = %student.id, "bearer accepted");
            req.extensions_mut().insert(student);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(path = %req.uri().path(), code = e.code(), "bearer rejected");
            Err(e.into())
        }
    }
}
