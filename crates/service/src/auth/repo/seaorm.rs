use async_trait::async_trait;
use chrono::Utc;
use models::{errors::ModelError, student, token};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::domain::{CourseData, NewStudent, StoredToken, Student};
use crate::auth::errors::AuthError;
use crate::auth::repository::{AuthRepository, StudentRepository, TokenRepository};

/// Postgres-backed repository over the `student` and `token` tables.
#[derive(Clone)]
pub struct SeaOrmAuthRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmAuthRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<ModelError> for AuthError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => AuthError::Validation(msg),
            ModelError::NotFound(_) => AuthError::IdentityNotFound,
            ModelError::Conflict(_) => AuthError::Conflict,
            ModelError::Db(msg) => AuthError::Persistence(msg),
        }
    }
}

fn to_student(m: student::Model) -> Student {
    Student {
        id: m.id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        enrollment_no: m.enrollment_no,
        faculty_no: m.faculty_no,
        course: m.course,
        semester: m.semester,
        password_hash: m.password_hash,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn to_stored(m: token::Model) -> StoredToken {
    StoredToken {
        student_id: m.student_id,
        email: m.email,
        token: m.token,
        token_hash: m.token_hash,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
        expiry: m.expiry.with_timezone(&Utc),
    }
}

#[async_trait]
impl StudentRepository for SeaOrmAuthRepository {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, AuthError> {
        Ok(student::find_by_email(&self.db, email).await?.map(to_student))
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>, AuthError> {
        Ok(student::find_by_id(&self.db, id).await?.map(to_student))
    }

    async fn insert_student(&self, input: NewStudent) -> Result<Student, AuthError> {
        let created = student::create(
            &self.db,
            student::NewStudent {
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                enrollment_no: input.enrollment_no,
                faculty_no: input.faculty_no,
                course: input.course,
                semester: input.semester,
                password_hash: input.password_hash,
            },
        )
        .await?;
        Ok(to_student(created))
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), AuthError> {
        student::update_password(&self.db, id, password_hash).await?;
        Ok(())
    }

    async fn list_students(&self, page_idx: u64, per_page: u64) -> Result<Vec<Student>, AuthError> {
        let rows = student::list_by_last_name(&self.db, page_idx, per_page).await?;
        Ok(rows.into_iter().map(to_student).collect())
    }

    async fn find_courses(&self, id: Uuid) -> Result<Option<CourseData>, AuthError> {
        Ok(student::find_by_id(&self.db, id).await?.map(|m| CourseData {
            registered_courses: m.registered_courses,
            feedbacks: m.feedbacks,
            filled_feedbacks: m.filled_feedbacks,
        }))
    }
}

#[async_trait]
impl TokenRepository for SeaOrmAuthRepository {
    async fn delete_tokens_for_student(&self, student_id: Uuid) -> Result<u64, AuthError> {
        Ok(token::delete_for_student(&self.db, student_id).await?)
    }

    async fn insert_token(&self, t: StoredToken) -> Result<(), AuthError> {
        token::insert(
            &self.db,
            token::NewToken {
                student_id: t.student_id,
                email: t.email,
                token: t.token,
                token_hash: t.token_hash,
                expiry: t.expiry.into(),
            },
        )
        .await?;
        Ok(())
    }

    async fn find_token_by_plaintext(&self, plaintext: &str) -> Result<Option<StoredToken>, AuthError> {
        Ok(token::find_by_plaintext(&self.db, plaintext).await?.map(to_stored))
    }

    async fn find_token_by_hash(&self, hash: &[u8]) -> Result<Option<StoredToken>, AuthError> {
        Ok(token::find_by_hash(&self.db, hash).await?.map(to_stored))
    }

    async fn delete_token_by_plaintext(&self, plaintext: &str) -> Result<u64, AuthError> {
        Ok(token::delete_by_plaintext(&self.db, plaintext).await?)
    }

    async fn delete_token_by_hash(&self, hash: &[u8]) -> Result<u64, AuthError> {
        Ok(token::delete_by_hash(&self.db, hash).await?)
    }
}

impl AuthRepository for SeaOrmAuthRepository {}
