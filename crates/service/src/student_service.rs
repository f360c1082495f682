use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;
use uuid::Uuid;

use crate::auth::deadline::within;
use crate::auth::domain::{CourseData, Student};
use crate::auth::repository::StudentRepository;
use crate::errors::ServiceError;
use crate::pagination::Pagination;

/// Read-side student queries used by the protected routes.
pub struct StudentService<R: StudentRepository + ?Sized> {
    repo: Arc<R>,
    timeout: Duration,
}

impl<R: StudentRepository + ?Sized> StudentService<R> {
    pub fn new(repo: Arc<R>, timeout: Duration) -> Self {
        Self { repo, timeout }
    }

    /// List students ordered by last name.
    #[instrument(skip(self))]
    pub async fn list(&self, opts: Pagination) -> Result<Vec<Student>, ServiceError> {
        let (page_idx, per_page) = opts.normalize();
        Ok(within(self.timeout, self.repo.list_students(page_idx, per_page)).await?)
    }

    /// Course and feedback lists of one student.
    pub async fn courses(&self, id: Uuid) -> Result<CourseData, ServiceError> {
        within(self.timeout, self.repo.find_courses(id))
            .await?
            .ok_or_else(|| ServiceError::not_found("student"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repository::mock::MockAuthRepository;

    fn svc() -> (Arc<MockAuthRepository>, StudentService<MockAuthRepository>) {
        let repo = Arc::new(MockAuthRepository::default());
        (repo.clone(), StudentService::new(repo, Duration::from_secs(3)))
    }

    #[tokio::test]
    async fn list_is_ordered_by_last_name_and_paged() {
        let (repo, svc) = svc();
        for (first, last) in [("Alan", "Turing"), ("Ada", "Lovelace"), ("Grace", "Hopper"), ("Edsger", "Dijkstra")] {
            repo.seed_student(&format!("{}@x.com", first.to_lowercase()), first, last, "h");
        }
        let page1 = svc.list(Pagination { page: 1, per_page: 3 }).await.unwrap();
        let names: Vec<_> = page1.iter().map(|s| s.last_name.as_str()).collect();
        assert_eq!(names, ["Dijkstra", "Hopper", "Lovelace"]);

        let page2 = svc.list(Pagination { page: 2, per_page: 3 }).await.unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].last_name, "Turing");
    }

    #[tokio::test]
    async fn courses_for_known_and_unknown_students() {
        let (repo, svc) = svc();
        let s = repo.seed_student("a@x.com", "Ada", "Lovelace", "h");
        assert_eq!(svc.courses(s.id).await.unwrap(), CourseData::default());

        let data = CourseData {
            registered_courses: vec!["Algorithms".into()],
            feedbacks: vec!["Algorithms".into()],
            filled_feedbacks: vec![],
        };
        repo.set_courses(s.id, data.clone());
        assert_eq!(svc.courses(s.id).await.unwrap(), data);
        assert!(matches!(svc.courses(Uuid::new_v4()).await, Err(ServiceError::NotFound(_))));
    }
}
