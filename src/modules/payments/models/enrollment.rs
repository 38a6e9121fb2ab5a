use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Course enrollment, created at most once per (user, course)
///
/// Only ever produced as a side effect of a payment reaching completed;
/// the unique constraint on (user_id, course_id) is the last line of
/// defense against concurrent webhook redeliveries.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    /// Payment that produced this enrollment
    pub payment_id: String,
    pub enrolled_at: DateTime<Utc>,
}

impl Enrollment {
    pub fn new(user_id: String, course_id: String, payment_id: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            course_id,
            payment_id,
            enrolled_at: Utc::now(),
        }
    }
}
