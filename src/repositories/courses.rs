use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::{Course, CourseClass};
use crate::repositories::materials::{self, MaterialScope};

const COLUMNS: &str = "\
    id, teacher_id, title, slug, description, detail, estimation_hour, estimation_minute, \
    thumbnail_img, is_draft, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!("SELECT {COLUMNS} FROM courses WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_many(pool: &PgPool, ids: &[String]) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses WHERE id = ANY($1) ORDER BY title ASC, id ASC"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) struct CourseFields<'a> {
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) description: &'a str,
    pub(crate) detail: &'a str,
    pub(crate) estimation_hour: i32,
    pub(crate) estimation_minute: i32,
    pub(crate) thumbnail_img: &'a str,
    pub(crate) is_draft: bool,
}

pub(crate) struct ClassEntry {
    pub(crate) id: String,
    pub(crate) class: String,
    pub(crate) slug: String,
}

pub(crate) async fn create(
    pool: &PgPool,
    id: &str,
    teacher_id: &str,
    fields: CourseFields<'_>,
    classes: &[ClassEntry],
    now: PrimitiveDateTime,
) -> Result<Course, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "INSERT INTO courses (
            id, teacher_id, title, slug, description, detail, estimation_hour,
            estimation_minute, thumbnail_img, is_draft, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11)
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(teacher_id)
    .bind(fields.title)
    .bind(fields.slug)
    .bind(fields.description)
    .bind(fields.detail)
    .bind(fields.estimation_hour)
    .bind(fields.estimation_minute)
    .bind(fields.thumbnail_img)
    .bind(fields.is_draft)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    insert_classes(&mut tx, id, classes).await?;

    tx.commit().await?;
    Ok(course)
}

/// Overwrites every editable field and replaces the class list.
pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    fields: CourseFields<'_>,
    classes: &[ClassEntry],
    now: PrimitiveDateTime,
) -> Result<Course, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let course = sqlx::query_as::<_, Course>(&format!(
        "UPDATE courses SET
            title = $2, slug = $3, description = $4, detail = $5, estimation_hour = $6,
            estimation_minute = $7, thumbnail_img = $8, is_draft = $9, updated_at = $10
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.title)
    .bind(fields.slug)
    .bind(fields.description)
    .bind(fields.detail)
    .bind(fields.estimation_hour)
    .bind(fields.estimation_minute)
    .bind(fields.thumbnail_img)
    .bind(fields.is_draft)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM course_classes WHERE course_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    insert_classes(&mut tx, id, classes).await?;

    tx.commit().await?;
    Ok(course)
}

async fn insert_classes(
    executor: &mut Transaction<'_, Postgres>,
    course_id: &str,
    classes: &[ClassEntry],
) -> Result<(), sqlx::Error> {
    for entry in classes {
        sqlx::query("INSERT INTO course_classes (id, course_id, class, slug) VALUES ($1,$2,$3,$4)")
            .bind(&entry.id)
            .bind(course_id)
            .bind(&entry.class)
            .bind(&entry.slug)
            .execute(&mut **executor)
            .await?;
    }
    Ok(())
}

/// Deletes the course and everything hanging off it in one transaction.
pub(crate) async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    materials::purge(&mut tx, MaterialScope::Course(id)).await?;

    for statement in [
        "DELETE FROM complete_courses WHERE course_id = $1",
        "DELETE FROM active_student_courses WHERE course_id = $1",
        "DELETE FROM submission_students WHERE course_id = $1",
        "DELETE FROM chapters WHERE course_id = $1",
        "DELETE FROM course_classes WHERE course_id = $1",
    ] {
        sqlx::query(statement).bind(id).execute(&mut *tx).await?;
    }

    let result = sqlx::query("DELETE FROM courses WHERE id = $1").bind(id).execute(&mut *tx).await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_classes(
    pool: &PgPool,
    course_ids: &[String],
) -> Result<HashMap<String, Vec<CourseClass>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CourseClass>(
        "SELECT id, course_id, class, slug FROM course_classes
         WHERE course_id = ANY($1)
         ORDER BY class ASC",
    )
    .bind(course_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<String, Vec<CourseClass>> = HashMap::new();
    for row in rows {
        grouped.entry(row.course_id.clone()).or_default().push(row);
    }
    Ok(grouped)
}

/// Filters for course listings. `completed` is evaluated against the
/// enrolment in `completed_by` and ignored without one.
#[derive(Debug, Default)]
pub(crate) struct CourseFilter<'a> {
    pub(crate) teacher_id: Option<&'a str>,
    pub(crate) published_only: bool,
    pub(crate) class_slug: Option<&'a str>,
    pub(crate) major: Option<&'a str>,
    pub(crate) completed_by: Option<&'a str>,
    pub(crate) completed: Option<bool>,
}

const FILTER_CLAUSE: &str = "\
    WHERE ($1::text IS NULL OR c.teacher_id = $1) \
      AND (NOT $2 OR c.is_draft = FALSE) \
      AND ($3::text IS NULL OR EXISTS ( \
          SELECT 1 FROM course_classes cc WHERE cc.course_id = c.id AND cc.slug = $3)) \
      AND ($4::text IS NULL OR EXISTS ( \
          SELECT 1 FROM course_classes cc WHERE cc.course_id = c.id AND cc.slug LIKE '%' || $4 || '%')) \
      AND ($5::text IS NULL OR $6::boolean IS NULL OR $6 = EXISTS ( \
          SELECT 1 FROM complete_courses cp WHERE cp.course_id = c.id AND cp.active_student_id = $5))";

pub(crate) async fn list(
    pool: &PgPool,
    filter: &CourseFilter<'_>,
    skip: i64,
    limit: i64,
) -> Result<Vec<Course>, sqlx::Error> {
    sqlx::query_as::<_, Course>(&format!(
        "SELECT {COLUMNS} FROM courses c {FILTER_CLAUSE}
         ORDER BY c.created_at DESC, c.id ASC
         OFFSET $7 LIMIT $8"
    ))
    .bind(filter.teacher_id)
    .bind(filter.published_only)
    .bind(filter.class_slug)
    .bind(filter.major)
    .bind(filter.completed_by)
    .bind(filter.completed)
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool, filter: &CourseFilter<'_>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM courses c {FILTER_CLAUSE}"))
        .bind(filter.teacher_id)
        .bind(filter.published_only)
        .bind(filter.class_slug)
        .bind(filter.major)
        .bind(filter.completed_by)
        .bind(filter.completed)
        .fetch_one(pool)
        .await
}

pub(crate) async fn chapter_counts(
    pool: &PgPool,
    course_ids: &[String],
) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT course_id, COUNT(*) FROM chapters WHERE course_id = ANY($1) GROUP BY course_id",
    )
    .bind(course_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}

/// Students who recorded progress in each course.
pub(crate) async fn student_counts(
    pool: &PgPool,
    course_ids: &[String],
) -> Result<HashMap<String, i64>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT course_id, COUNT(DISTINCT active_student_id)
         FROM active_student_courses
         WHERE course_id = ANY($1)
         GROUP BY course_id",
    )
    .bind(course_ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().collect())
}
