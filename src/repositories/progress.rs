use std::collections::HashSet;

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Progress;

pub(crate) async fn completed_material_ids(
    pool: &PgPool,
    active_student_id: &str,
    course_id: &str,
) -> Result<HashSet<String>, sqlx::Error> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT material_id FROM active_student_courses
         WHERE active_student_id = $1 AND course_id = $2",
    )
    .bind(active_student_id)
    .bind(course_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

pub(crate) struct RecordProgress<'a> {
    pub(crate) id: &'a str,
    pub(crate) active_student_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) material_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

/// Marks the material complete. Returns `None` when it already was.
pub(crate) async fn record(
    pool: &PgPool,
    params: RecordProgress<'_>,
) -> Result<Option<Progress>, sqlx::Error> {
    sqlx::query_as::<_, Progress>(
        "INSERT INTO active_student_courses (id, active_student_id, course_id, material_id, created_at)
         VALUES ($1,$2,$3,$4,$5)
         ON CONFLICT (active_student_id, course_id, material_id) DO NOTHING
         RETURNING id, active_student_id, course_id, material_id, created_at",
    )
    .bind(params.id)
    .bind(params.active_student_id)
    .bind(params.course_id)
    .bind(params.material_id)
    .bind(params.now)
    .fetch_optional(pool)
    .await
}
