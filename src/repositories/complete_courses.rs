use std::collections::HashSet;

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::CompleteCourse;

const COLUMNS: &str = "id, course_id, active_student_id, created_at";

pub(crate) async fn find(
    pool: &PgPool,
    active_student_id: &str,
    course_id: &str,
) -> Result<Option<CompleteCourse>, sqlx::Error> {
    sqlx::query_as::<_, CompleteCourse>(&format!(
        "SELECT {COLUMNS} FROM complete_courses WHERE active_student_id = $1 AND course_id = $2"
    ))
    .bind(active_student_id)
    .bind(course_id)
    .fetch_optional(pool)
    .await
}

/// Records the completion once; later calls return the first record.
pub(crate) async fn save(
    pool: &PgPool,
    id: &str,
    active_student_id: &str,
    course_id: &str,
    now: PrimitiveDateTime,
) -> Result<CompleteCourse, sqlx::Error> {
    let inserted = sqlx::query_as::<_, CompleteCourse>(&format!(
        "INSERT INTO complete_courses (id, course_id, active_student_id, created_at)
         VALUES ($1,$2,$3,$4)
         ON CONFLICT (active_student_id, course_id) DO NOTHING
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(course_id)
    .bind(active_student_id)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some(record) => Ok(record),
        None => find(pool, active_student_id, course_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound),
    }
}

/// Drops every student's completion of the course after its content grew.
pub(crate) async fn invalidate_course(
    executor: impl sqlx::PgExecutor<'_>,
    course_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM complete_courses WHERE course_id = $1")
        .bind(course_id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn completed_course_ids(
    pool: &PgPool,
    active_student_id: &str,
    course_ids: &[String],
) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT course_id FROM complete_courses
         WHERE active_student_id = $1 AND course_id = ANY($2)",
    )
    .bind(active_student_id)
    .bind(course_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

pub(crate) async fn count_for_course(pool: &PgPool, course_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM complete_courses WHERE course_id = $1")
        .bind(course_id)
        .fetch_one(pool)
        .await
}
