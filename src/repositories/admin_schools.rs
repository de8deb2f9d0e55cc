use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::AdminSchool;

const SELECT: &str = "\
    SELECT a.id, a.user_id, a.school_id, u.username, s.name AS school_name, \
           a.created_at, a.updated_at \
    FROM admin_schools a \
    JOIN users u ON u.id = a.user_id \
    JOIN schools s ON s.id = a.school_id";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<AdminSchool>, sqlx::Error> {
    sqlx::query_as::<_, AdminSchool>(&format!("{SELECT} WHERE a.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<AdminSchool>, sqlx::Error> {
    sqlx::query_as::<_, AdminSchool>(&format!(
        "{SELECT} ORDER BY a.created_at DESC OFFSET $1 LIMIT $2"
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_schools").fetch_one(pool).await
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    user_id: &str,
    school_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO admin_schools (id, user_id, school_id, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$4)",
    )
    .bind(id)
    .bind(user_id)
    .bind(school_id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn update_school(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    school_id: &str,
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE admin_schools SET school_id = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(school_id)
        .bind(now)
        .execute(executor)
        .await?;
    Ok(())
}
