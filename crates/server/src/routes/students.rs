use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension,
};

use service::auth::domain::{CourseData, Student};
use service::pagination::Pagination;

use crate::errors::{ApiError, ApiResponse};
use crate::state::AppState;

#[utoipa::path(get, path = "/users/courses", tag = "students", security(("bearer" = [])), responses((status = 200, description = "Courses of the current student", body = crate::openapi::CourseDataDoc), (status = 401, description = "Unauthorized")))]
pub async fn courses(State(state): State<AppState>, Extension(student): Extension<Student>) -> Result<ApiResponse<CourseData>, ApiError> {
    Ok(ApiResponse::ok(state.students.courses(student.id).await?))
}

#[utoipa::path(get, path = "/users/all", tag = "students", security(("bearer" = [])), params(("page" = Option<u32>, Query, description = "1-based page"), ("per_page" = Option<u32>, Query, description = "page size, at most 100")), responses((status = 200, description = "Students ordered by last name", body = [crate::openapi::StudentDoc])))]
pub async fn list(State(state): State<AppState>, query: Result<Query<Pagination>, QueryRejection>) -> Result<ApiResponse<Vec<Student>>, ApiError> {
    let Query(page) = query?;
    Ok(ApiResponse::ok(state.students.list(page).await?))
}
