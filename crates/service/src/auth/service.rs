use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::deadline::{within, DEFAULT_DB_TIMEOUT};
use super::domain::{LoginInput, LoginSession, NewStudent, RegisterInput, Student};
use super::errors::AuthError;
use super::password::{hash_password_blocking, CredentialVerifier, PasswordParams};
use super::repository::AuthRepository;
use super::token::{fingerprint, TokenAuthority, TokenLookup, DEFAULT_TTL};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Auth service configuration
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub token_ttl: Duration,
    pub db_timeout: Duration,
    pub token_lookup: TokenLookup,
    pub password: PasswordParams,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl: DEFAULT_TTL,
            db_timeout: DEFAULT_DB_TIMEOUT,
            token_lookup: TokenLookup::default(),
            password: PasswordParams::default(),
        }
    }
}

impl From<&configs::AuthConfig> for AuthConfig {
    fn from(c: &configs::AuthConfig) -> Self {
        Self {
            token_ttl: c.token_ttl(),
            db_timeout: c.db_timeout(),
            token_lookup: c.token_lookup,
            password: PasswordParams {
                memory_kib: c.argon2_memory_kib,
                iterations: c.argon2_iterations,
                parallelism: c.argon2_parallelism,
            },
        }
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(format!("password too short (>={MIN_PASSWORD_LEN})")));
    }
    Ok(())
}

/// Auth business service independent of web framework
pub struct AuthService<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    cfg: AuthConfig,
    verifier: CredentialVerifier<R>,
    tokens: TokenAuthority<R>,
}

impl<R: AuthRepository + ?Sized> AuthService<R> {
    /// Fails when the argon2 parameters are rejected.
    pub fn new(repo: Arc<R>, cfg: AuthConfig) -> Result<Self, AuthError> {
        let verifier = CredentialVerifier::new(repo.clone(), cfg.password, cfg.db_timeout)?;
        let tokens = TokenAuthority::new(repo.clone(), cfg.token_lookup, cfg.db_timeout);
        Ok(Self { repo, cfg, verifier, tokens })
    }

    pub fn tokens(&self) -> &TokenAuthority<R> {
        &self.tokens
    }

    /// Register a new student with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::RegisterInput, password::PasswordParams};
    /// use std::sync::Arc;
    /// let repo = Arc::new(MockAuthRepository::default());
    /// let cfg = AuthConfig { password: PasswordParams { memory_kib: 256, iterations: 1, parallelism: 1 }, ..Default::default() };
    /// let svc = AuthService::new(repo, cfg).unwrap();
    /// let input = RegisterInput {
    ///     email: "user@example.com".into(), first_name: "Test".into(), last_name: "User".into(),
    ///     password: "Secret123".into(), enrollment_no: None, faculty_no: None, course: None, semester: None,
    /// };
    /// let student = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(student.email, "user@example.com");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterInput) -> Result<Student, AuthError> {
        let email = input.email.trim().to_string();
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("invalid email".into()));
        }
        if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
            return Err(AuthError::Validation("name required".into()));
        }
        validate_password(&input.password)?;

        if within(self.cfg.db_timeout, self.repo.find_student_by_email(&email)).await?.is_some() {
            debug!("student exists");
            return Err(AuthError::Conflict);
        }

        let password_hash = hash_password_blocking(self.cfg.password, input.password.clone()).await?;
        let student = within(
            self.cfg.db_timeout,
            self.repo.insert_student(NewStudent {
                email,
                first_name: input.first_name.trim().to_string(),
                last_name: input.last_name.trim().to_string(),
                enrollment_no: input.enrollment_no,
                faculty_no: input.faculty_no,
                course: input.course,
                semester: input.semester,
                password_hash,
            }),
        )
        .await?;
        info!(student_id = %student.id, "student_registered");
        Ok(student)
    }

    /// Verify credentials and hand out a fresh token, replacing any prior one.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, repository::mock::MockAuthRepository};
    /// use service::auth::{domain::LoginInput, password::{hash_password, PasswordParams}};
    /// use std::sync::Arc;
    /// let params = PasswordParams { memory_kib: 256, iterations: 1, parallelism: 1 };
    /// let repo = Arc::new(MockAuthRepository::default());
    /// repo.seed_student("u@e.com", "U", "E", &hash_password(&params, "Passw0rd").unwrap());
    /// let svc = AuthService::new(repo, AuthConfig { password: params, ..Default::default() }).unwrap();
    /// let session = tokio_test::block_on(svc.login(LoginInput { email: "u@e.com".into(), password: "Passw0rd".into() })).unwrap();
    /// assert_eq!(session.user.email, "u@e.com");
    /// assert_eq!(session.token.token.len(), 26);
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<LoginSession, AuthError> {
        let student = self.verifier.verify(input.email.trim(), &input.password).await?;
        let token = self.tokens.mint(&student, self.cfg.token_ttl)?;
        self.tokens.commit(&token, &student).await?;
        info!(student_id = %student.id, fingerprint = %fingerprint(&token.token_hash), "student_logged_in");
        Ok(LoginSession { token, user: student })
    }

    /// Revoke a token. Unknown tokens are accepted silently.
    #[instrument(skip_all)]
    pub async fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.tokens.revoke(token).await?;
        info!("student_logged_out");
        Ok(())
    }

    /// Resolve an `Authorization` header value.
    pub async fn authenticate(&self, header: &str) -> Result<Student, AuthError> {
        self.tokens.authenticate(header).await
    }

    pub async fn is_valid(&self, token: &str) -> Result<bool, AuthError> {
        self.tokens.is_valid(token).await
    }

    /// Replace the password of an already authenticated student.
    ///
    /// The active token stays valid.
    #[instrument(skip(self, new_password), fields(student_id = %student_id))]
    pub async fn reset_password(&self, student_id: Uuid, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;
        let password_hash = hash_password_blocking(self.cfg.password, new_password.to_owned()).await?;
        within(self.cfg.db_timeout, self.repo.update_password(student_id, password_hash)).await?;
        info!("password_reset");
        Ok(())
    }
}
