use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::Chapter;
use crate::repositories::complete_courses;
use crate::repositories::materials::{self, MaterialScope};

const COLUMNS: &str = "id, course_id, title, slug, is_draft, position, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!("SELECT {COLUMNS} FROM chapters WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "SELECT {COLUMNS} FROM chapters WHERE course_id = $1 ORDER BY position ASC"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateChapter<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) is_draft: bool,
    pub(crate) now: PrimitiveDateTime,
}

/// Appends a chapter to the course and drops stale course completions.
pub(crate) async fn create(pool: &PgPool, params: CreateChapter<'_>) -> Result<Chapter, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM courses WHERE id = $1 FOR UPDATE")
        .bind(params.course_id)
        .fetch_one(&mut *tx)
        .await?;

    let position = sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM chapters WHERE course_id = $1",
    )
    .bind(params.course_id)
    .fetch_one(&mut *tx)
    .await?;

    let chapter = sqlx::query_as::<_, Chapter>(&format!(
        "INSERT INTO chapters (id, course_id, title, slug, is_draft, position, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.slug)
    .bind(params.is_draft)
    .bind(position)
    .bind(params.now)
    .fetch_one(&mut *tx)
    .await?;

    let invalidated = complete_courses::invalidate_course(&mut *tx, params.course_id).await?;

    tx.commit().await?;

    if invalidated > 0 {
        tracing::info!(
            course_id = %params.course_id,
            invalidated,
            "Course completions invalidated by new chapter"
        );
    }

    Ok(chapter)
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    title: &str,
    slug: &str,
    is_draft: bool,
    now: PrimitiveDateTime,
) -> Result<Option<Chapter>, sqlx::Error> {
    sqlx::query_as::<_, Chapter>(&format!(
        "UPDATE chapters SET title = $2, slug = $3, is_draft = $4, updated_at = $5
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(slug)
    .bind(is_draft)
    .bind(now)
    .fetch_optional(pool)
    .await
}

/// Removes the chapter with its materials and their student records, and
/// clears completions of the owning course.
pub(crate) async fn delete(pool: &PgPool, chapter: &Chapter) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    materials::purge(&mut tx, MaterialScope::Chapter(&chapter.id)).await?;
    sqlx::query("DELETE FROM chapters WHERE id = $1").bind(&chapter.id).execute(&mut *tx).await?;
    complete_courses::invalidate_course(&mut *tx, &chapter.course_id).await?;

    tx.commit().await?;
    Ok(())
}
