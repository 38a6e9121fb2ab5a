use super::super::models::Enrollment;
use crate::core::{AppError, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// Result of an enrollment insert attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    Created,
    /// The (user, course) pair was already enrolled; benign on webhook
    /// redelivery
    AlreadyEnrolled,
}

/// Persistence contract for enrollments
#[async_trait]
pub trait EnrollmentStore: Send + Sync {
    /// Insert an enrollment; a unique violation on (user_id, course_id) is
    /// reported as `AlreadyEnrolled`, not as an error
    async fn create(&self, enrollment: &Enrollment) -> Result<EnrollmentOutcome>;

    async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>>;
}

/// MySQL-backed enrollment store
pub struct MySqlEnrollmentRepository {
    pool: MySqlPool,
}

impl MySqlEnrollmentRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EnrollmentStore for MySqlEnrollmentRepository {
    async fn create(&self, enrollment: &Enrollment) -> Result<EnrollmentOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO enrollments (id, user_id, course_id, payment_id, enrolled_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&enrollment.id)
        .bind(&enrollment.user_id)
        .bind(&enrollment.course_id)
        .bind(&enrollment.payment_id)
        .bind(enrollment.enrolled_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(EnrollmentOutcome::Created),
            Err(sqlx::Error::Database(db))
                if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
            {
                Ok(EnrollmentOutcome::AlreadyEnrolled)
            }
            Err(e) => Err(AppError::internal(format!(
                "Failed to create enrollment: {}",
                e
            ))),
        }
    }

    async fn find_by_user_and_course(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>> {
        let enrollment = sqlx::query_as::<_, Enrollment>(
            r#"
            SELECT id, user_id, course_id, payment_id, enrolled_at
            FROM enrollments
            WHERE user_id = ? AND course_id = ?
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to fetch enrollment: {}", e)))?;

        Ok(enrollment)
    }
}
