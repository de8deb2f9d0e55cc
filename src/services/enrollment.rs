use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::Enrollment;
use crate::repositories;

#[derive(Debug, Error)]
pub(crate) enum EnrollmentError {
    #[error("Student not found")]
    StudentNotFound,
    #[error("Active student not found")]
    NotEnrolled,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Newest enrolment of the student profile behind a login.
pub(crate) async fn for_user(pool: &PgPool, user_id: &str) -> Result<Enrollment, EnrollmentError> {
    let student = repositories::students::find_by_user_id(pool, user_id)
        .await?
        .ok_or(EnrollmentError::StudentNotFound)?;
    for_student(pool, &student.id).await
}

pub(crate) async fn for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Enrollment, EnrollmentError> {
    repositories::active_students::latest_for_student(pool, student_id)
        .await?
        .ok_or(EnrollmentError::NotEnrolled)
}
