use async_trait::async_trait;
use uuid::Uuid;

use super::domain::{CourseData, NewStudent, StoredToken, Student};
use super::errors::AuthError;

/// Identity lookups and the few student writes the auth flows need.
#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, AuthError>;
    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>, AuthError>;
    async fn insert_student(&self, input: NewStudent) -> Result<Student, AuthError>;
    async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), AuthError>;
    /// Ordered by last name; `page_idx` is 0-based.
    async fn list_students(&self, page_idx: u64, per_page: u64) -> Result<Vec<Student>, AuthError>;
    async fn find_courses(&self, id: Uuid) -> Result<Option<CourseData>, AuthError>;
}

/// Token persistence. Replacing a student's token is two calls:
/// `delete_tokens_for_student` then `insert_token`.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn delete_tokens_for_student(&self, student_id: Uuid) -> Result<u64, AuthError>;
    async fn insert_token(&self, token: StoredToken) -> Result<(), AuthError>;
    async fn find_token_by_plaintext(&self, plaintext: &str) -> Result<Option<StoredToken>, AuthError>;
    async fn find_token_by_hash(&self, hash: &[u8]) -> Result<Option<StoredToken>, AuthError>;
    async fn delete_token_by_plaintext(&self, plaintext: &str) -> Result<u64, AuthError>;
    async fn delete_token_by_hash(&self, hash: &[u8]) -> Result<u64, AuthError>;
}

/// Both contracts behind one handle, so services can share a single `Arc`.
pub trait AuthRepository: StudentRepository + TokenRepository {}

/// Simple in-memory mock repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use chrono::Utc;

    #[derive(Default)]
    pub struct MockAuthRepository {
        students: Mutex<HashMap<Uuid, Student>>,   // key: student id
        courses: Mutex<HashMap<Uuid, CourseData>>, // key: student id
        tokens: Mutex<Vec<StoredToken>>,
        token_lookups: AtomicUsize,
        fail_writes: AtomicBool,
        delay: Mutex<Option<Duration>>,
    }

    impl MockAuthRepository {
        /// Insert a student directly, bypassing registration rules.
        pub fn seed_student(&self, email: &str, first_name: &str, last_name: &str, password_hash: &str) -> Student {
            let now = Utc::now();
            let s = Student {
                id: Uuid::new_v4(),
                email: email.to_string(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                enrollment_no: None,
                faculty_no: None,
                course: None,
                semester: None,
                password_hash: password_hash.to_string(),
                created_at: now,
                updated_at: now,
            };
            self.students.lock().unwrap().insert(s.id, s.clone());
            s
        }

        pub fn remove_student(&self, id: Uuid) {
            self.students.lock().unwrap().remove(&id);
        }

        pub fn set_courses(&self, id: Uuid, data: CourseData) {
            self.courses.lock().unwrap().insert(id, data);
        }

        /// Number of token lookups (by plaintext or hash) served so far.
        pub fn token_lookups(&self) -> usize {
            self.token_lookups.load(Ordering::SeqCst)
        }

        pub fn tokens_for(&self, student_id: Uuid) -> Vec<StoredToken> {
            self.tokens.lock().unwrap().iter().filter(|t| t.student_id == student_id).cloned().collect()
        }

        /// Make every write fail with a persistence error.
        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Delay every call, to exercise deadlines.
        pub fn set_delay(&self, delay: Option<Duration>) {
            *self.delay.lock().unwrap() = delay;
        }

        async fn pause(&self) {
            let delay = *self.delay.lock().unwrap();
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
        }

        fn check_write(&self) -> Result<(), AuthError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(AuthError::Persistence("write rejected by mock".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StudentRepository for MockAuthRepository {
        async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, AuthError> {
            self.pause().await;
            let students = self.students.lock().unwrap();
            Ok(students.values().find(|s| s.email == email).cloned())
        }

        async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>, AuthError> {
            self.pause().await;
            Ok(self.students.lock().unwrap().get(&id).cloned())
        }

        async fn insert_student(&self, input: NewStudent) -> Result<Student, AuthError> {
            self.pause().await;
            self.check_write()?;
            let mut students = self.students.lock().unwrap();
            if students.values().any(|s| s.email == input.email) {
                return Err(AuthError::Conflict);
            }
            let now = Utc::now();
            let s = Student {
                id: Uuid::new_v4(),
                email: input.email,
                first_name: input.first_name,
                last_name: input.last_name,
                enrollment_no: input.enrollment_no,
                faculty_no: input.faculty_no,
                course: input.course,
                semester: input.semester,
                password_hash: input.password_hash,
                created_at: now,
                updated_at: now,
            };
            students.insert(s.id, s.clone());
            Ok(s)
        }

        async fn update_password(&self, id: Uuid, password_hash: String) -> Result<(), AuthError> {
            self.pause().await;
            self.check_write()?;
            let mut students = self.students.lock().unwrap();
            let s = students.get_mut(&id).ok_or(AuthError::IdentityNotFound)?;
            s.password_hash = password_hash;
            s.updated_at = Utc::now();
            Ok(())
        }

        async fn list_students(&self, page_idx: u64, per_page: u64) -> Result<Vec<Student>, AuthError> {
            self.pause().await;
            let mut all: Vec<Student> = self.students.lock().unwrap().values().cloned().collect();
            all.sort_by(|a, b| a.last_name.cmp(&b.last_name).then_with(|| a.first_name.cmp(&b.first_name)));
            Ok(all
                .into_iter()
                .skip((page_idx * per_page) as usize)
                .take(per_page as usize)
                .collect())
        }

        async fn find_courses(&self, id: Uuid) -> Result<Option<CourseData>, AuthError> {
            self.pause().await;
            if !self.students.lock().unwrap().contains_key(&id) {
                return Ok(None);
            }
            Ok(Some(self.courses.lock().unwrap().get(&id).cloned().unwrap_or_default()))
        }
    }

    #[async_trait]
    impl TokenRepository for MockAuthRepository {
        async fn delete_tokens_for_student(&self, student_id: Uuid) -> Result<u64, AuthError> {
            self.pause().await;
            self.check_write()?;
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.student_id != student_id);
            Ok((before - tokens.len()) as u64)
        }

        async fn insert_token(&self, token: StoredToken) -> Result<(), AuthError> {
            self.pause().await;
            self.check_write()?;
            self.tokens.lock().unwrap().push(token);
            Ok(())
        }

        async fn find_token_by_plaintext(&self, plaintext: &str) -> Result<Option<StoredToken>, AuthError> {
            self.pause().await;
            self.token_lookups.fetch_add(1, Ordering::SeqCst);
            let tokens = self.tokens.lock().unwrap();
            Ok(tokens.iter().find(|t| t.token.as_deref() == Some(plaintext)).cloned())
        }

        async fn find_token_by_hash(&self, hash: &[u8]) -> Result<Option<StoredToken>, AuthError> {
            self.pause().await;
            self.token_lookups.fetch_add(1, Ordering::SeqCst);
            let tokens = self.tokens.lock().unwrap();
            Ok(tokens.iter().find(|t| t.token_hash == hash).cloned())
        }

        async fn delete_token_by_plaintext(&self, plaintext: &str) -> Result<u64, AuthError> {
            self.pause().await;
            self.check_write()?;
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.token.as_deref() != Some(plaintext));
            Ok((before - tokens.len()) as u64)
        }

        async fn delete_token_by_hash(&self, hash: &[u8]) -> Result<u64, AuthError> {
            self.pause().await;
            self.check_write()?;
            let mut tokens = self.tokens.lock().unwrap();
            let before = tokens.len();
            tokens.retain(|t| t.token_hash != hash);
            Ok((before - tokens.len()) as u64)
        }
    }

    impl AuthRepository for MockAuthRepository {}
}
