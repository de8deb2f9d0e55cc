use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::School;

const COLUMNS: &str = "id, name, school_year, logo, address, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!("SELECT {COLUMNS} FROM schools WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn name_taken(
    pool: &PgPool,
    name: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, String>(
        "SELECT id FROM schools WHERE lower(name) = lower($1) AND ($2::text IS NULL OR id <> $2)",
    )
    .bind(name)
    .bind(except_id)
    .fetch_optional(pool)
    .await?;
    Ok(existing.is_some())
}

pub(crate) async fn list(
    pool: &PgPool,
    search: Option<&str>,
    skip: i64,
    limit: i64,
) -> Result<Vec<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "SELECT {COLUMNS} FROM schools
         WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
         ORDER BY name ASC
         OFFSET $2 LIMIT $3"
    ))
    .bind(search)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM schools WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%')",
    )
    .bind(search)
    .fetch_one(pool)
    .await
}

pub(crate) struct SchoolFields<'a> {
    pub(crate) name: &'a str,
    pub(crate) school_year: &'a str,
    pub(crate) logo: &'a str,
    pub(crate) address: &'a str,
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    fields: SchoolFields<'_>,
    now: PrimitiveDateTime,
) -> Result<School, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "INSERT INTO schools (id, name, school_year, logo, address, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.name)
    .bind(fields.school_year)
    .bind(fields.logo)
    .bind(fields.address)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    fields: SchoolFields<'_>,
    now: PrimitiveDateTime,
) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "UPDATE schools
         SET name = $2, school_year = $3, logo = $4, address = $5, updated_at = $6
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.name)
    .bind(fields.school_year)
    .bind(fields.logo)
    .bind(fields.address)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Removes the school together with the login accounts of its students and
/// school admins. Teachers stay and lose their school binding.
pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM users
         WHERE id IN (
             SELECT user_id FROM students WHERE school_id = $1
             UNION
             SELECT user_id FROM admin_schools WHERE school_id = $1
         )",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query("DELETE FROM schools WHERE id = $1").bind(id).execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// School the user belongs to, through whichever profile the user has.
pub(crate) async fn find_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "SELECT {COLUMNS} FROM schools
         WHERE id = (
             SELECT school_id FROM students WHERE user_id = $1
             UNION ALL
             SELECT school_id FROM teachers WHERE user_id = $1 AND school_id IS NOT NULL
             UNION ALL
             SELECT school_id FROM admin_schools WHERE user_id = $1
             LIMIT 1
         )"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
