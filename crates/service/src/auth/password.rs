//! Credential verification: argon2id PHC hashes checked against the stored
//! identity record.

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, PasswordHash, Version,
};
use rand::rngs::OsRng;
use tracing::{debug, instrument, warn};

use super::deadline::within;
use super::domain::Student;
use super::errors::AuthError;
use super::repository::StudentRepository;

/// Argon2id cost parameters used for new hashes. Existing hashes carry their
/// own parameters in the PHC string, so changing these never locks anyone out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordParams {
    fn hasher(&self) -> Result<Argon2<'static>, AuthError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AuthError::HashError(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hash a plaintext secret with a fresh OS-random salt.
pub fn hash_password(params: &PasswordParams, secret: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .hasher()?
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AuthError::HashError(e.to_string()))?
        .to_string();
    Ok(hash)
}

async fn off_runtime<T, F>(work: F) -> Result<T, AuthError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::HashError(format!("hashing task failed: {e}")))?
}

/// [`hash_password`] on the blocking pool, keeping argon2 off the async workers.
pub async fn hash_password_blocking(params: PasswordParams, secret: String) -> Result<String, AuthError> {
    off_runtime(move || hash_password(&params, &secret)).await
}

/// [`password_matches`] on the blocking pool.
pub async fn password_matches_blocking(stored_hash: String, secret: String) -> Result<bool, AuthError> {
    off_runtime(move || password_matches(&stored_hash, &secret)).await
}

/// Compare `secret` with a stored PHC string.
///
/// `Ok(false)` is a plain mismatch; `Err(CorruptHash)` means the stored value
/// is not something we can verify against.
pub fn password_matches(stored_hash: &str, secret: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AuthError::CorruptHash(e.to_string()))?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::CorruptHash(e.to_string())),
    }
}

/// Confirms that a plaintext secret matches the stored hash for an email.
pub struct CredentialVerifier<R: StudentRepository + ?Sized> {
    repo: Arc<R>,
    timeout: Duration,
    // Verified against when the email is unknown so that path costs the same.
    dummy_hash: String,
}

impl<R: StudentRepository + ?Sized> CredentialVerifier<R> {
    /// Fails only when `params` are not valid argon2 parameters.
    pub fn new(repo: Arc<R>, params: PasswordParams, timeout: Duration) -> Result<Self, AuthError> {
        let dummy_hash = hash_password(&params, "not-a-real-password")?;
        Ok(Self { repo, timeout, dummy_hash })
    }

    /// Resolve `email` and check `secret` against its stored hash.
    ///
    /// # Examples
    /// ```
    /// use service::auth::password::{hash_password, CredentialVerifier, PasswordParams};
    /// use service::auth::repository::mock::MockAuthRepository;
    /// use std::{sync::Arc, time::Duration};
    /// let params = PasswordParams { memory_kib: 256, iterations: 1, parallelism: 1 };
    /// let repo = Arc::new(MockAuthRepository::default());
    /// repo.seed_student("a@x.com", "A", "X", &hash_password(&params, "secret123").unwrap());
    /// let verifier = CredentialVerifier::new(repo, params, Duration::from_secs(3)).unwrap();
    /// let student = tokio_test::block_on(verifier.verify("a@x.com", "secret123")).unwrap();
    /// assert_eq!(student.email, "a@x.com");
    /// assert!(tokio_test::block_on(verifier.verify("a@x.com", "nope")).is_err());
    /// ```
    #[instrument(skip(self, secret), fields(email = %email))]
    pub async fn verify(&self, email: &str, secret: &str) -> Result<Student, AuthError> {
        let found = within(self.timeout, self.repo.find_student_by_email(email)).await?;
        let Some(student) = found else {
            // burn the same work as a real comparison before rejecting
            let _ = password_matches_blocking(self.dummy_hash.clone(), secret.to_owned()).await;
            debug!("unknown email");
            return Err(AuthError::IdentityNotFound);
        };

        match password_matches_blocking(student.password_hash.clone(), secret.to_owned()).await {
            Ok(true) => Ok(student),
            Ok(false) => {
                debug!(student_id = %student.id, "password mismatch");
                Err(AuthError::InvalidCredentials)
            }
            Err(e) => {
                warn!(student_id = %student.id, error = %e, "stored password hash unreadable");
                Err(e)
            }
        }
    }
}
