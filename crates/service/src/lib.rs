//! Service layer for the student records backend.
//! - `auth`: credential verification, bearer token lifecycle, registration.
//! - `student_service`: read-side queries behind the protected routes.
//! - Persistence is reached only through the repository traits in `auth::repository`.

pub mod errors;
pub mod auth;
pub mod pagination;
pub mod student_service;
#[cfg(test)]
pub mod test_support;

pub use auth::AuthService;
pub use student_service::StudentService;
