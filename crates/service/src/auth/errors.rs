use serde::Serialize;
use thiserror::Error;

/// Business errors for auth workflows.
///
/// Every variant stays distinguishable for logs and audits; [`AuthError::public_kind`]
/// and [`AuthError::public_message`] give the deliberately vaguer view shown to clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("identity not found")]
    IdentityNotFound,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("stored password hash is corrupt: {0}")]
    CorruptHash(String),
    #[error("no matching token found")]
    TokenNotFound,
    #[error("token expired")]
    TokenExpired,
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("persistence call timed out")]
    Timeout,
    #[error("token generation failed: {0}")]
    MintFailure(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("user already exists")]
    Conflict,
    #[error("hashing error: {0}")]
    HashError(String),
}

/// Client-facing error classes carried in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedInput,
    InvalidCredentials,
    TokenNotFound,
    TokenExpired,
    PersistenceError,
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::MalformedInput(_) => 1000,
            AuthError::Validation(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::IdentityNotFound => 1003,
            AuthError::InvalidCredentials => 1004,
            AuthError::TokenNotFound => 1005,
            AuthError::TokenExpired => 1006,
            AuthError::CorruptHash(_) => 1100,
            AuthError::HashError(_) => 1101,
            AuthError::MintFailure(_) => 1102,
            AuthError::Persistence(_) => 1200,
            AuthError::Timeout => 1201,
        }
    }

    /// Unknown identity, wrong password and an unreadable stored hash all
    /// collapse to `InvalidCredentials` so callers cannot enumerate accounts.
    pub fn public_kind(&self) -> ErrorKind {
        match self {
            AuthError::MalformedInput(_) => ErrorKind::MalformedInput,
            AuthError::IdentityNotFound
            | AuthError::InvalidCredentials
            | AuthError::CorruptHash(_) => ErrorKind::InvalidCredentials,
            AuthError::TokenNotFound => ErrorKind::TokenNotFound,
            AuthError::TokenExpired => ErrorKind::TokenExpired,
            AuthError::Persistence(_) | AuthError::Timeout => ErrorKind::PersistenceError,
            AuthError::Validation(_) => ErrorKind::Validation,
            AuthError::Conflict => ErrorKind::Conflict,
            AuthError::MintFailure(_) | AuthError::HashError(_) => ErrorKind::Internal,
        }
    }

    pub fn public_message(&self) -> String {
        match self.public_kind() {
            ErrorKind::InvalidCredentials => "invalid credentials".into(),
            ErrorKind::PersistenceError => "service temporarily unavailable".into(),
            ErrorKind::Internal => "internal error".into(),
            _ => self.to_string(),
        }
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::Persistence(_) | AuthError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_identity_and_wrong_password_look_the_same() {
        let a = AuthError::IdentityNotFound;
        let b = AuthError::InvalidCredentials;
        let c = AuthError::CorruptHash("bad phc".into());
        assert_eq!(a.public_kind(), b.public_kind());
        assert_eq!(a.public_message(), b.public_message());
        assert_eq!(c.public_message(), "invalid credentials");
        // internal codes still differ
        assert_ne!(a.code(), b.code());
        assert_ne!(b.code(), c.code());
    }

    #[test]
    fn persistence_failures_are_retryable_and_vague() {
        let e = AuthError::Persistence("connection reset by peer 10.0.0.5".into());
        assert!(e.is_retryable());
        assert!(AuthError::Timeout.is_retryable());
        assert!(!AuthError::TokenExpired.is_retryable());
        assert!(!e.public_message().contains("10.0.0.5"));
    }

    #[test]
    fn error_kind_serializes_snake_case() {
        let v = serde_json::to_value(ErrorKind::TokenExpired).unwrap();
        assert_eq!(v, serde_json::json!("token_expired"));
    }
}
