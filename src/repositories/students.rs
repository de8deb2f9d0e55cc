use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Student;

const COLUMNS: &str = "id, user_id, school_id, name, id_number, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_user_id(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn id_number_taken(
    pool: &PgPool,
    id_number: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, String>(
        "SELECT id FROM students WHERE id_number = $1 AND ($2::text IS NULL OR id <> $2)",
    )
    .bind(id_number)
    .bind(except_id)
    .fetch_optional(pool)
    .await?;
    Ok(existing.is_some())
}

#[derive(Debug, Default)]
pub(crate) struct StudentFilter<'a> {
    pub(crate) school_id: Option<&'a str>,
    pub(crate) search: Option<&'a str>,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &StudentFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students
         WHERE ($1::text IS NULL OR school_id = $1)
           AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR id_number = $2)
         ORDER BY name ASC
         OFFSET $3 LIMIT $4"
    ))
    .bind(filter.school_id)
    .bind(filter.search)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, filter: &StudentFilter<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM students
         WHERE ($1::text IS NULL OR school_id = $1)
           AND ($2::text IS NULL OR name ILIKE '%' || $2 || '%' OR id_number = $2)",
    )
    .bind(filter.school_id)
    .bind(filter.search)
    .fetch_one(pool)
    .await
}

pub(crate) struct StudentFields<'a> {
    pub(crate) school_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) id_number: &'a str,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    user_id: &str,
    fields: StudentFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (id, user_id, school_id, name, id_number, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(user_id)
    .bind(fields.school_id)
    .bind(fields.name)
    .bind(fields.id_number)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    fields: StudentFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students
         SET school_id = $2, name = $3, id_number = $4, updated_at = $5
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.school_id)
    .bind(fields.name)
    .bind(fields.id_number)
    .bind(now)
    .fetch_one(executor)
    .await
}
