use std::sync::Arc;

use service::auth::errors::AuthError;
use service::auth::repository::AuthRepository;
use service::auth::service::{AuthConfig, AuthService};
use service::StudentService;

/// Shared handler state. Both services sit on the same repository handle.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService<dyn AuthRepository>>,
    pub students: Arc<StudentService<dyn AuthRepository>>,
}

impl AppState {
    pub fn new(repo: Arc<dyn AuthRepository>, cfg: AuthConfig) -> Result<Self, AuthError> {
        let students = StudentService::new(repo.clone(), cfg.db_timeout);
        Ok(Self {
            auth: Arc::new(AuthService::new(repo, cfg)?),
            students: Arc::new(students),
        })
    }
}
