use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{ActiveStudent, Enrollment};

const COLUMNS: &str = "id, student_id, school_year, class, class_slug, created_at, updated_at";

const ENROLLMENT_SELECT: &str = "\
    SELECT a.id, a.student_id, s.name AS student_name, s.school_id, a.school_year, a.class \
    FROM active_students a \
    JOIN students s ON s.id = a.student_id";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<ActiveStudent>, sqlx::Error> {
    sqlx::query_as::<_, ActiveStudent>(&format!(
        "SELECT {COLUMNS} FROM active_students WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn latest_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "{ENROLLMENT_SELECT} WHERE a.student_id = $1 ORDER BY a.created_at DESC, a.id DESC LIMIT 1"
    ))
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_user_in_year(
    pool: &PgPool,
    user_id: &str,
    school_year: &str,
) -> Result<Vec<ActiveStudent>, sqlx::Error> {
    sqlx::query_as::<_, ActiveStudent>(
        "SELECT a.id, a.student_id, a.school_year, a.class, a.class_slug, a.created_at, a.updated_at
         FROM active_students a
         JOIN students s ON s.id = a.student_id
         WHERE s.user_id = $1 AND a.school_year = $2
         ORDER BY a.class ASC",
    )
    .bind(user_id)
    .bind(school_year)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct ActiveStudentFilter<'a> {
    pub(crate) school_id: Option<&'a str>,
    pub(crate) class: Option<&'a str>,
    pub(crate) school_year: Option<&'a str>,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &ActiveStudentFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<ActiveStudent>, sqlx::Error> {
    sqlx::query_as::<_, ActiveStudent>(
        "SELECT a.id, a.student_id, a.school_year, a.class, a.class_slug, a.created_at, a.updated_at
         FROM active_students a
         JOIN students s ON s.id = a.student_id
         WHERE ($1::text IS NULL OR s.school_id = $1)
           AND ($2::text IS NULL OR a.class = $2)
           AND ($3::text IS NULL OR a.school_year = $3)
         ORDER BY a.created_at DESC
         OFFSET $4 LIMIT $5",
    )
    .bind(filter.school_id)
    .bind(filter.class)
    .bind(filter.school_year)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(
    pool: &PgPool,
    filter: &ActiveStudentFilter<'_>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*)
         FROM active_students a
         JOIN students s ON s.id = a.student_id
         WHERE ($1::text IS NULL OR s.school_id = $1)
           AND ($2::text IS NULL OR a.class = $2)
           AND ($3::text IS NULL OR a.school_year = $3)",
    )
    .bind(filter.school_id)
    .bind(filter.class)
    .bind(filter.school_year)
    .fetch_one(pool)
    .await
}

/// Distinct class names, optionally narrowed by a case-insensitive search.
pub(crate) async fn distinct_classes(
    pool: &PgPool,
    school_id: Option<&str>,
    search: Option<&str>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT a.class
         FROM active_students a
         JOIN students s ON s.id = a.student_id
         WHERE ($1::text IS NULL OR s.school_id = $1)
           AND ($2::text IS NULL OR a.class ILIKE '%' || $2 || '%')
         ORDER BY a.class ASC",
    )
    .bind(school_id)
    .bind(search)
    .fetch_all(pool)
    .await
}

pub(crate) async fn distinct_school_years(
    pool: &PgPool,
    school_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT a.school_year
         FROM active_students a
         JOIN students s ON s.id = a.student_id
         WHERE s.school_id = $1
         ORDER BY a.school_year DESC",
    )
    .bind(school_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct ActiveStudentFields<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) school_year: &'a str,
    pub(crate) class: &'a str,
    pub(crate) class_slug: &'a str,
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    fields: ActiveStudentFields<'_>,
    now: PrimitiveDateTime,
) -> Result<ActiveStudent, sqlx::Error> {
    sqlx::query_as::<_, ActiveStudent>(&format!(
        "INSERT INTO active_students (id, student_id, school_year, class, class_slug, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.student_id)
    .bind(fields.school_year)
    .bind(fields.class)
    .bind(fields.class_slug)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    fields: ActiveStudentFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Option<ActiveStudent>, sqlx::Error> {
    sqlx::query_as::<_, ActiveStudent>(&format!(
        "UPDATE active_students
         SET student_id = $2, school_year = $3, class = $4, class_slug = $5, updated_at = $6
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.student_id)
    .bind(fields.school_year)
    .bind(fields.class)
    .bind(fields.class_slug)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM active_students WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
