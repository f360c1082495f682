//! Token authority: mint, commit, authenticate and revoke opaque bearer tokens.
//!
//! A token is 16 bytes from the OS RNG encoded as unpadded RFC 4648 base-32
//! (26 characters). Only its SHA-256 digest is needed server-side; whether the
//! plaintext is also stored depends on [`TokenLookup`].
//!
//! Two concurrent logins for one student race between the delete and the
//! insert in [`TokenAuthority::commit`]: if both deletes run before either
//! insert, both tokens stay active until the student's next login.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

pub use configs::TokenLookup;

use super::deadline::within;
use super::domain::{StoredToken, Student, TokenRecord};
use super::errors::AuthError;
use super::repository::AuthRepository;

/// Random bytes per token.
pub const TOKEN_BYTES: usize = 16;
/// Length of the encoded plaintext token.
pub const TOKEN_LEN: usize = 26;
/// Default session lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// RFC 4648 base-32 without `=` padding.
pub fn base32_nopad(data: &[u8]) -> String {
    let mut output = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer = 0u32;
    let mut bits = 0u32;

    for byte in data {
        buffer = (buffer << 8) | u32::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            output.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        output.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    output
}

/// Fresh plaintext token. RNG failure is fatal for the request.
pub fn generate_plaintext() -> Result<String, AuthError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::MintFailure(e.to_string()))?;
    Ok(base32_nopad(&bytes))
}

/// SHA-256 of the plaintext token string.
pub fn token_digest(plaintext: &str) -> Vec<u8> {
    Sha256::digest(plaintext.as_bytes()).to_vec()
}

/// Short hex prefix of a digest, safe to put in logs.
pub fn fingerprint(digest: &[u8]) -> String {
    hex::encode(&digest[..digest.len().min(4)])
}

/// Split `Bearer <token>` and apply the cheap shape checks.
pub fn parse_bearer(header: &str) -> Result<&str, AuthError> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || parts[0] != "Bearer" {
        return Err(AuthError::MalformedInput("expected `Bearer <token>`".into()));
    }
    let token = parts[1];
    if token.len() != TOKEN_LEN {
        return Err(AuthError::MalformedInput(format!("token must be {TOKEN_LEN} characters")));
    }
    Ok(token)
}

pub struct TokenAuthority<R: AuthRepository + ?Sized> {
    repo: Arc<R>,
    lookup: TokenLookup,
    timeout: Duration,
}

impl<R: AuthRepository + ?Sized> TokenAuthority<R> {
    pub fn new(repo: Arc<R>, lookup: TokenLookup, timeout: Duration) -> Self {
        Self { repo, lookup, timeout }
    }

    pub fn lookup(&self) -> TokenLookup {
        self.lookup
    }

    /// Build a token for `student` valid for `ttl`. Nothing is persisted.
    pub fn mint(&self, student: &Student, ttl: Duration) -> Result<TokenRecord, AuthError> {
        self.mint_at(student, ttl, Utc::now())
    }

    pub fn mint_at(&self, student: &Student, ttl: Duration, now: DateTime<Utc>) -> Result<TokenRecord, AuthError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AuthError::Validation("token ttl out of range".into()))?;
        let expiry = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AuthError::Validation("token ttl out of range".into()))?;
        let token = generate_plaintext()?;
        let token_hash = token_digest(&token);
        Ok(TokenRecord {
            student_id: student.id,
            email: student.email.clone(),
            token,
            token_hash,
            created_at: now,
            updated_at: now,
            expiry,
        })
    }

    /// Replace whatever token `student` holds with `token`.
    ///
    /// Delete and insert are separate calls; if the insert fails the student
    /// is left with no token rather than two.
    #[instrument(skip(self, token, student), fields(student_id = %student.id))]
    pub async fn commit(&self, token: &TokenRecord, student: &Student) -> Result<(), AuthError> {
        if token.student_id != student.id || token.email != student.email {
            warn!(token_owner = %token.student_id, "token minted for another identity; re-stamping owner");
        }

        let removed = within(self.timeout, self.repo.delete_tokens_for_student(student.id)).await?;
        if removed > 0 {
            debug!(removed, "superseded previous tokens");
        }

        let now = Utc::now();
        let token_hash = token_digest(&token.token);
        let fp = fingerprint(&token_hash);
        let row = StoredToken {
            student_id: student.id,
            email: student.email.clone(),
            token: match self.lookup {
                TokenLookup::Plaintext => Some(token.token.clone()),
                TokenLookup::Hash => None,
            },
            token_hash,
            created_at: now,
            updated_at: now,
            expiry: token.expiry,
        };
        within(self.timeout, self.repo.insert_token(row)).await?;
        info!(fingerprint = %fp, expiry = %token.expiry, "token_committed");
        Ok(())
    }

    async fn find(&self, plaintext: &str) -> Result<Option<StoredToken>, AuthError> {
        match self.lookup {
            TokenLookup::Plaintext => within(self.timeout, self.repo.find_token_by_plaintext(plaintext)).await,
            TokenLookup::Hash => {
                let digest = token_digest(plaintext);
                within(self.timeout, self.repo.find_token_by_hash(&digest)).await
            }
        }
    }

    /// Resolve an `Authorization` header value to the owning student.
    pub async fn authenticate(&self, header: &str) -> Result<Student, AuthError> {
        self.authenticate_at(header, Utc::now()).await
    }

    #[instrument(skip_all)]
    pub async fn authenticate_at(&self, header: &str, now: DateTime<Utc>) -> Result<Student, AuthError> {
        let candidate = parse_bearer(header)?;
        let stored = self.find(candidate).await?.ok_or(AuthError::TokenNotFound)?;
        if stored.expiry <= now {
            debug!(fingerprint = %fingerprint(&stored.token_hash), expiry = %stored.expiry, "token expired");
            return Err(AuthError::TokenExpired);
        }
        within(self.timeout, self.repo.find_student_by_id(stored.student_id))
            .await?
            .ok_or(AuthError::IdentityNotFound)
    }

    /// Delete the token; revoking an unknown token is not an error.
    #[instrument(skip_all)]
    pub async fn revoke(&self, plaintext: &str) -> Result<(), AuthError> {
        let digest = token_digest(plaintext);
        let removed = match self.lookup {
            TokenLookup::Plaintext => within(self.timeout, self.repo.delete_token_by_plaintext(plaintext)).await?,
            TokenLookup::Hash => within(self.timeout, self.repo.delete_token_by_hash(&digest)).await?,
        };
        debug!(fingerprint = %fingerprint(&digest), removed, "token revoked");
        Ok(())
    }

    /// Yes/no form of authentication for a bare token. Storage failures are
    /// still returned as errors.
    pub async fn is_valid(&self, plaintext: &str) -> Result<bool, AuthError> {
        self.is_valid_at(plaintext, Utc::now()).await
    }

    pub async fn is_valid_at(&self, plaintext: &str, now: DateTime<Utc>) -> Result<bool, AuthError> {
        if plaintext.len() != TOKEN_LEN {
            return Ok(false);
        }
        let Some(stored) = self.find(plaintext).await? else { return Ok(false) };
        let owner = within(self.timeout, self.repo.find_student_by_id(stored.student_id)).await?;
        Ok(owner.is_some() && stored.expiry > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn setup(lookup: TokenLookup) -> (Arc<MockAuthRepository>, TokenAuthority<MockAuthRepository>, Student) {
        let repo = Arc::new(MockAuthRepository::default());
        let student = repo.seed_student("a@x.com", "Ada", "Lovelace", "unused");
        let authority = TokenAuthority::new(repo.clone(), lookup, Duration::from_secs(3));
        (repo, authority, student)
    }

    fn bearer(t: &str) -> String {
        format!("Bearer {t}")
    }

    #[test]
    fn base32_matches_rfc4648_vectors() {
        assert_eq!(base32_nopad(b""), "");
        assert_eq!(base32_nopad(b"f"), "MY");
        assert_eq!(base32_nopad(b"fo"), "MZXQ");
        assert_eq!(base32_nopad(b"foo"), "MZXW6");
        assert_eq!(base32_nopad(b"foob"), "MZXW6YQ");
        assert_eq!(base32_nopad(b"fooba"), "MZXW6YTB");
        assert_eq!(base32_nopad(b"foobar"), "MZXW6YTBOI");
        assert_eq!(base32_nopad(&[0xff; 16]).len(), TOKEN_LEN);
    }

    #[test]
    fn minted_tokens_are_26_base32_chars() {
        let (_, authority, student) = setup(TokenLookup::Hash);
        for _ in 0..64 {
            let t = authority.mint(&student, DEFAULT_TTL).unwrap();
            assert_eq!(t.token.len(), TOKEN_LEN);
            assert!(t.token.bytes().all(|b| BASE32_ALPHABET.contains(&b)), "{}", t.token);
            assert_eq!(t.token_hash, token_digest(&t.token));
            assert_eq!(t.token_hash.len(), 32);
        }
    }

    #[test]
    fn mint_sets_expiry_from_ttl() {
        let (_, authority, student) = setup(TokenLookup::Hash);
        let now = Utc::now();
        let t = authority.mint_at(&student, Duration::from_secs(3600), now).unwrap();
        assert_eq!(t.expiry - now, chrono::Duration::hours(1));
        assert_eq!(t.student_id, student.id);
        assert_eq!(t.email, "a@x.com");
    }

    #[test]
    fn parse_bearer_rejects_bad_shapes() {
        let good = "A".repeat(TOKEN_LEN);
        assert_eq!(parse_bearer(&bearer(&good)).unwrap(), good);
        for bad in ["", "Bearer", "Token xyz", "bearer AAAAAAAAAAAAAAAAAAAAAAAAAA", "Bearer  AAAAAAAAAAAAAAAAAAAAAAAAAA", "Bearer short"] {
            assert!(matches!(parse_bearer(bad), Err(AuthError::MalformedInput(_))), "{bad:?}");
        }
    }

    #[tokio::test]
    async fn malformed_headers_never_reach_storage() {
        let (repo, authority, _) = setup(TokenLookup::Hash);
        for bad in ["Token xyz", "Bearer", "", "Bearer tooshort"] {
            assert!(matches!(authority.authenticate(bad).await, Err(AuthError::MalformedInput(_))));
        }
        assert_eq!(repo.token_lookups(), 0);
    }

    #[tokio::test]
    async fn wrong_length_tokens_are_invalid_without_lookup() {
        let (repo, authority, student) = setup(TokenLookup::Hash);
        let t = authority.mint(&student, DEFAULT_TTL).unwrap();
        authority.commit(&t, &student).await.unwrap();
        let longer = format!("{}A", t.token);
        for bad in ["short", "", &t.token[..TOKEN_LEN - 1], longer.as_str()] {
            assert!(!authority.is_valid(bad).await.unwrap(), "{bad:?}");
        }
        assert_eq!(repo.token_lookups(), 0);
        assert!(authority.is_valid(&t.token).await.unwrap());
        assert_eq!(repo.token_lookups(), 1);
    }

    #[tokio::test]
    async fn authenticate_after_commit_returns_owner() {
        for lookup in [TokenLookup::Hash, TokenLookup::Plaintext] {
            let (repo, authority, student) = setup(lookup);
            let t = authority.mint(&student, DEFAULT_TTL).unwrap();
            authority.commit(&t, &student).await.unwrap();
            let who = authority.authenticate(&bearer(&t.token)).await.unwrap();
            assert_eq!(who.id, student.id);
            assert!(authority.is_valid(&t.token).await.unwrap());

            let stored = repo.tokens_for(student.id);
            assert_eq!(stored.len(), 1);
            match lookup {
                TokenLookup::Hash => assert_eq!(stored[0].token, None),
                TokenLookup::Plaintext => assert_eq!(stored[0].token.as_deref(), Some(t.token.as_str())),
            }
        }
    }

    #[tokio::test]
    async fn expiry_boundary() {
        let (_, authority, student) = setup(TokenLookup::Hash);
        let t = authority.mint(&student, DEFAULT_TTL).unwrap();
        authority.commit(&t, &student).await.unwrap();
        let header = bearer(&t.token);
        let one = chrono::Duration::seconds(1);

        assert!(authority.authenticate_at(&header, t.expiry - one).await.is_ok());
        assert!(matches!(authority.authenticate_at(&header, t.expiry).await, Err(AuthError::TokenExpired)));
        assert!(matches!(authority.authenticate_at(&header, t.expiry + one).await, Err(AuthError::TokenExpired)));
        assert!(authority.is_valid_at(&t.token, t.expiry - one).await.unwrap());
        assert!(!authority.is_valid_at(&t.token, t.expiry + one).await.unwrap());
    }

    #[tokio::test]
    async fn second_commit_supersedes_first() {
        let (repo, authority, student) = setup(TokenLookup::Hash);
        let first = authority.mint(&student, DEFAULT_TTL).unwrap();
        authority.commit(&first, &student).await.unwrap();
        let second = authority.mint(&student, DEFAULT_TTL).unwrap();
        authority.commit(&second, &student).await.unwrap();

        assert!(matches!(authority.authenticate(&bearer(&first.token)).await, Err(AuthError::TokenNotFound)));
        assert_eq!(authority.authenticate(&bearer(&second.token)).await.unwrap().id, student.id);
        assert_eq!(repo.tokens_for(student.id).len(), 1);
    }

    #[tokio::test]
    async fn commit_restamps_owner_from_identity() {
        let (repo, authority, student) = setup(TokenLookup::Hash);
        let mut t = authority.mint(&student, DEFAULT_TTL).unwrap();
        t.email = "mallory@x.com".into();
        authority.commit(&t, &student).await.unwrap();
        assert_eq!(repo.tokens_for(student.id)[0].email, "a@x.com");
    }

    #[tokio::test]
    async fn failed_write_leaves_at_most_one_token() {
        let (repo, authority, student) = setup(TokenLookup::Hash);
        let first = authority.mint(&student, DEFAULT_TTL).unwrap();
        authority.commit(&first, &student).await.unwrap();

        repo.fail_writes(true);
        let second = authority.mint(&student, DEFAULT_TTL).unwrap();
        assert!(matches!(authority.commit(&second, &student).await, Err(AuthError::Persistence(_))));
        repo.fail_writes(false);
        assert!(repo.tokens_for(student.id).len() <= 1);
        assert!(authority.authenticate(&bearer(&second.token)).await.is_err());
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        for lookup in [TokenLookup::Hash, TokenLookup::Plaintext] {
            let (_, authority, student) = setup(lookup);
            let t = authority.mint(&student, DEFAULT_TTL).unwrap();
            authority.commit(&t, &student).await.unwrap();

            authority.revoke(&t.token).await.unwrap();
            authority.revoke(&t.token).await.unwrap();
            authority.revoke("NEVERISSUEDNEVERISSUED2345").await.unwrap();
            assert!(matches!(authority.authenticate(&bearer(&t.token)).await, Err(AuthError::TokenNotFound)));
            assert!(!authority.is_valid(&t.token).await.unwrap());
        }
    }

    #[tokio::test]
    async fn token_for_deleted_student_is_rejected() {
        let (repo, authority, student) = setup(TokenLookup::Hash);
        let t = authority.mint(&student, DEFAULT_TTL).unwrap();
        authority.commit(&t, &student).await.unwrap();
        repo.remove_student(student.id);
        assert!(matches!(authority.authenticate(&bearer(&t.token)).await, Err(AuthError::IdentityNotFound)));
        assert!(!authority.is_valid(&t.token).await.unwrap());
    }

    #[tokio::test]
    async fn slow_store_times_out() {
        let (repo, _, student) = setup(TokenLookup::Hash);
        let authority = TokenAuthority::new(repo.clone(), TokenLookup::Hash, Duration::from_millis(20));
        let t = authority.mint(&student, DEFAULT_TTL).unwrap();
        repo.set_delay(Some(Duration::from_millis(200)));
        assert!(matches!(authority.commit(&t, &student).await, Err(AuthError::Timeout)));
        assert!(matches!(authority.authenticate(&bearer(&t.token)).await, Err(AuthError::Timeout)));
    }
}
