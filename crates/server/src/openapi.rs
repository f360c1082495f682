use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub enrollment_no: Option<String>,
    pub faculty_no: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
}

#[derive(ToSchema)]
pub struct LoginRequest { pub email: String, pub password: String }

#[derive(ToSchema)]
pub struct LogoutRequestDoc { pub token: String }

#[derive(ToSchema)]
pub struct PasswordRequestDoc { pub password: String }

#[derive(ToSchema)]
pub struct StudentDoc {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_no: Option<String>,
    pub faculty_no: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
    /// RFC 3339
    pub created_at: String,
    /// RFC 3339
    pub updated_at: String,
}

#[derive(ToSchema)]
pub struct LoginResponse {
    /// 26-character base-32 bearer token
    pub token: String,
    /// RFC 3339
    pub expiry: String,
    pub user: StudentDoc,
}

#[derive(ToSchema)]
pub struct CourseDataDoc {
    pub registered_courses: Vec<String>,
    pub feedbacks: Vec<String>,
    pub filled_feedbacks: Vec<String>,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme("bearer", SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()));
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::register,
        crate::routes::auth::me,
        crate::routes::auth::change_password,
        crate::routes::students::courses,
        crate::routes::students::list,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            LogoutRequestDoc,
            PasswordRequestDoc,
            StudentDoc,
            LoginResponse,
            CourseDataDoc,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "students")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/users/login", "/users/logout", "/users/register", "/users/me", "/users/password", "/users/courses", "/users/all"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
