use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registration input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    #[serde(default)]
    pub enrollment_no: Option<String>,
    #[serde(default)]
    pub faculty_no: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub semester: Option<i32>,
}

/// Login input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Authenticated identity. The password hash stays server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub enrollment_no: Option<String>,
    #[serde(default)]
    pub faculty_no: Option<String>,
    #[serde(default)]
    pub course: Option<String>,
    #[serde(default)]
    pub semester: Option<i32>,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A student row about to be inserted; `password_hash` is already a PHC string.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub enrollment_no: Option<String>,
    pub faculty_no: Option<String>,
    pub course: Option<String>,
    pub semester: Option<i32>,
    pub password_hash: String,
}

/// Per-student course lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseData {
    pub registered_courses: Vec<String>,
    pub feedbacks: Vec<String>,
    pub filled_feedbacks: Vec<String>,
}

/// A freshly minted session token. `token` is the plaintext handed to the
/// client exactly once; `token_hash` is its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenRecord {
    pub student_id: Uuid,
    pub email: String,
    pub token: String,
    #[serde(skip)]
    pub token_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

/// Token row as the store holds it. `token` is `None` when plaintext is not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredToken {
    pub student_id: Uuid,
    pub email: String,
    pub token: Option<String>,
    pub token_hash: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

/// Login result (session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub token: TokenRecord,
    pub user: Student,
}
