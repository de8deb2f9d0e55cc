use std::collections::HashMap;

use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::User;
use crate::db::types::UserRole;

const COLUMNS: &str = "id, username, hashed_password, role, status, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_username(
    pool: &PgPool,
    username: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Whether another user already holds `username`; `except_id` is ignored.
pub(crate) async fn username_taken(
    executor: impl sqlx::PgExecutor<'_>,
    username: &str,
    except_id: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let existing = sqlx::query_scalar::<_, String>(
        "SELECT id FROM users WHERE username = $1 AND ($2::text IS NULL OR id <> $2)",
    )
    .bind(username)
    .bind(except_id)
    .fetch_optional(executor)
    .await?;
    Ok(existing.is_some())
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) username: &'a str,
    pub(crate) hashed_password: &'a str,
    pub(crate) role: UserRole,
    pub(crate) status: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (id, username, hashed_password, role, status, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.status)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

pub(crate) struct UpdateUser<'a> {
    pub(crate) username: Option<&'a str>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) role: Option<UserRole>,
    pub(crate) status: Option<&'a str>,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn update(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    params: UpdateUser<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            username = COALESCE($1, username),
            hashed_password = COALESCE($2, hashed_password),
            role = COALESCE($3, role),
            status = COALESCE($4, status),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.role)
    .bind(params.status)
    .bind(params.updated_at)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn delete(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}

/// Usernames keyed by user id.
pub(crate) async fn usernames(
    pool: &PgPool,
    ids: &[String],
) -> Result<HashMap<String, String>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String)>(
        "SELECT id, username FROM users WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
