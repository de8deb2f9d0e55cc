use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::Material;
use crate::db::types::MaterialType;
use crate::repositories::complete_courses;

const COLUMNS: &str = "\
    id, chapter_id, course_id, title, slug, material_type, position, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!("SELECT {COLUMNS} FROM materials WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(
        "SELECT m.id, m.chapter_id, m.course_id, m.title, m.slug, m.material_type, m.position,
                m.created_at, m.updated_at
         FROM materials m
         JOIN chapters ch ON ch.id = m.chapter_id
         WHERE m.course_id = $1
         ORDER BY ch.position ASC, m.position ASC",
    )
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_type_for_courses(
    pool: &PgPool,
    course_ids: &[String],
    material_type: MaterialType,
) -> Result<Vec<Material>, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "SELECT {COLUMNS} FROM materials
         WHERE course_id = ANY($1) AND material_type = $2
         ORDER BY course_id ASC, position ASC"
    ))
    .bind(course_ids)
    .bind(material_type)
    .fetch_all(pool)
    .await
}

pub(crate) struct NewMaterial<'a> {
    pub(crate) id: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) material_type: MaterialType,
    pub(crate) now: PrimitiveDateTime,
}

/// Appends a material to its chapter inside the caller's transaction and
/// drops the course completions it makes stale.
pub(crate) async fn insert(
    executor: &mut Transaction<'_, Postgres>,
    params: NewMaterial<'_>,
) -> Result<Material, sqlx::Error> {
    sqlx::query("SELECT id FROM chapters WHERE id = $1 FOR UPDATE")
        .bind(params.chapter_id)
        .fetch_one(&mut **executor)
        .await?;

    let position = sqlx::query_scalar::<_, i32>(
        "SELECT COALESCE(MAX(position), 0) + 1 FROM materials WHERE chapter_id = $1",
    )
    .bind(params.chapter_id)
    .fetch_one(&mut **executor)
    .await?;

    let material = sqlx::query_as::<_, Material>(&format!(
        "INSERT INTO materials (
            id, chapter_id, course_id, title, slug, material_type, position, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.chapter_id)
    .bind(params.course_id)
    .bind(params.title)
    .bind(params.slug)
    .bind(params.material_type)
    .bind(position)
    .bind(params.now)
    .fetch_one(&mut **executor)
    .await?;

    let invalidated = complete_courses::invalidate_course(&mut **executor, params.course_id).await?;
    if invalidated > 0 {
        tracing::info!(
            course_id = %params.course_id,
            material_id = %material.id,
            invalidated,
            "Course completions invalidated by new material"
        );
    }

    Ok(material)
}

pub(crate) async fn rename(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    title: &str,
    slug: &str,
    now: PrimitiveDateTime,
) -> Result<Material, sqlx::Error> {
    sqlx::query_as::<_, Material>(&format!(
        "UPDATE materials SET title = $2, slug = $3, updated_at = $4
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(title)
    .bind(slug)
    .bind(now)
    .fetch_one(executor)
    .await
}

/// Set of materials a cascading delete applies to.
#[derive(Debug, Clone, Copy)]
pub(crate) enum MaterialScope<'a> {
    Course(&'a str),
    Chapter(&'a str),
    Material(&'a str),
}

impl MaterialScope<'_> {
    fn subquery(&self) -> &'static str {
        match self {
            MaterialScope::Course(_) => "SELECT id FROM materials WHERE course_id = $1",
            MaterialScope::Chapter(_) => "SELECT id FROM materials WHERE chapter_id = $1",
            MaterialScope::Material(_) => "SELECT id FROM materials WHERE id = $1",
        }
    }

    fn key(&self) -> &str {
        match self {
            MaterialScope::Course(id) | MaterialScope::Chapter(id) | MaterialScope::Material(id) => {
                id
            }
        }
    }
}

/// Deletes the scoped materials with their payloads, quiz trees and
/// student records. Children go first so no foreign key is left dangling.
pub(crate) async fn purge(
    executor: &mut Transaction<'_, Postgres>,
    scope: MaterialScope<'_>,
) -> Result<u64, sqlx::Error> {
    let scoped = scope.subquery();
    let statements = [
        format!("DELETE FROM quiz_answer_students WHERE quiz_id IN ({scoped})"),
        format!(
            "DELETE FROM quiz_answers WHERE quiz_question_id IN (
                SELECT id FROM quiz_questions WHERE quiz_id IN ({scoped}))"
        ),
        format!("DELETE FROM quiz_questions WHERE quiz_id IN ({scoped})"),
        format!("DELETE FROM quizzes WHERE id IN ({scoped})"),
        format!("DELETE FROM theories WHERE material_id IN ({scoped})"),
        format!("DELETE FROM submissions WHERE material_id IN ({scoped})"),
        format!("DELETE FROM submission_students WHERE material_id IN ({scoped})"),
        format!("DELETE FROM active_student_courses WHERE material_id IN ({scoped})"),
    ];

    for statement in &statements {
        sqlx::query(statement).bind(scope.key()).execute(&mut **executor).await?;
    }

    let result = sqlx::query(&format!("DELETE FROM materials WHERE id IN ({scoped})"))
        .bind(scope.key())
        .execute(&mut **executor)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let deleted = purge(&mut tx, MaterialScope::Material(id)).await?;
    tx.commit().await?;
    Ok(deleted > 0)
}
