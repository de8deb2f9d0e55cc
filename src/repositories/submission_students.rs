use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::SubmissionStudent;
use crate::db::types::SubmissionStatus;

const COLUMNS: &str = "\
    id, material_id, course_id, school_id, teacher_id, active_student_id, status, file_url, \
    description, grade, comment, course_title, class, school_year, created_at, updated_at";

/// Attempt joined with the student and material it belongs to.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct SubmissionRow {
    #[sqlx(flatten)]
    pub(crate) submission: SubmissionStudent,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) material_title: String,
}

const ROW_SELECT: &str = "\
    SELECT ss.id, ss.material_id, ss.course_id, ss.school_id, ss.teacher_id, \
           ss.active_student_id, ss.status, ss.file_url, ss.description, ss.grade, ss.comment, \
           ss.course_title, ss.class, ss.school_year, ss.created_at, ss.updated_at, \
           st.id AS student_id, st.name AS student_name, m.title AS material_title \
    FROM submission_students ss \
    JOIN active_students a ON a.id = ss.active_student_id \
    JOIN students st ON st.id = a.student_id \
    JOIN materials m ON m.id = ss.material_id";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<SubmissionStudent>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionStudent>(&format!(
        "SELECT {COLUMNS} FROM submission_students WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_row(pool: &PgPool, id: &str) -> Result<Option<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!("{ROW_SELECT} WHERE ss.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateSubmission<'a> {
    pub(crate) id: &'a str,
    pub(crate) material_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) school_id: &'a str,
    pub(crate) teacher_id: &'a str,
    pub(crate) active_student_id: &'a str,
    pub(crate) file_url: &'a str,
    pub(crate) description: &'a str,
    pub(crate) course_title: &'a str,
    pub(crate) class: &'a str,
    pub(crate) school_year: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSubmission<'_>,
) -> Result<SubmissionStudent, sqlx::Error> {
    sqlx::query_as::<_, SubmissionStudent>(&format!(
        "INSERT INTO submission_students (
            id, material_id, course_id, school_id, teacher_id, active_student_id, status,
            file_url, description, course_title, class, school_year, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$13)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.material_id)
    .bind(params.course_id)
    .bind(params.school_id)
    .bind(params.teacher_id)
    .bind(params.active_student_id)
    .bind(SubmissionStatus::Pending)
    .bind(params.file_url)
    .bind(params.description)
    .bind(params.course_title)
    .bind(params.class)
    .bind(params.school_year)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

/// Every attempt of the student at the material, newest first.
pub(crate) async fn attempts_for(
    pool: &PgPool,
    active_student_id: &str,
    material_id: &str,
) -> Result<Vec<SubmissionStudent>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionStudent>(&format!(
        "SELECT {COLUMNS} FROM submission_students
         WHERE active_student_id = $1 AND material_id = $2
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(active_student_id)
    .bind(material_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn latest_current_for_student(
    pool: &PgPool,
    active_student_id: &str,
) -> Result<Option<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "{ROW_SELECT}
         WHERE ss.active_student_id = $1 AND ss.status <> $2
         ORDER BY ss.created_at DESC, ss.id DESC
         LIMIT 1"
    ))
    .bind(active_student_id)
    .bind(SubmissionStatus::PendingAfterReset)
    .fetch_optional(pool)
    .await
}

pub(crate) struct Review<'a> {
    pub(crate) status: SubmissionStatus,
    pub(crate) grade: Option<i32>,
    pub(crate) comment: Option<&'a str>,
    pub(crate) teacher_id: &'a str,
    pub(crate) now: PrimitiveDateTime,
}

/// Moves `id` from `expected` to the reviewed status. `None` when the row
/// changed underneath.
pub(crate) async fn review(
    pool: &PgPool,
    id: &str,
    expected: SubmissionStatus,
    review: Review<'_>,
) -> Result<Option<SubmissionStudent>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionStudent>(&format!(
        "UPDATE submission_students
         SET status = $3, grade = COALESCE($4, grade), comment = COALESCE($5, comment),
             teacher_id = $6, updated_at = $7
         WHERE id = $1 AND status = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(expected)
    .bind(review.status)
    .bind(review.grade)
    .bind(review.comment)
    .bind(review.teacher_id)
    .bind(review.now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_status(
    pool: &PgPool,
    id: &str,
    expected: SubmissionStatus,
    status: SubmissionStatus,
    now: PrimitiveDateTime,
) -> Result<Option<SubmissionStudent>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionStudent>(&format!(
        "UPDATE submission_students SET status = $3, updated_at = $4
         WHERE id = $1 AND status = $2
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(expected)
    .bind(status)
    .bind(now)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Default)]
pub(crate) struct SubmissionFilter<'a> {
    pub(crate) teacher_id: Option<&'a str>,
    pub(crate) active_student_id: Option<&'a str>,
    pub(crate) material_id: Option<&'a str>,
    pub(crate) course_id: Option<&'a str>,
    pub(crate) class: Option<&'a str>,
    pub(crate) school_year: Option<&'a str>,
    /// Drops attempts archived by a reset.
    pub(crate) current_only: bool,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: &SubmissionFilter<'_>,
) -> Result<Vec<SubmissionRow>, sqlx::Error> {
    sqlx::query_as::<_, SubmissionRow>(&format!(
        "{ROW_SELECT}
         WHERE ($1::text IS NULL OR ss.teacher_id = $1)
           AND ($2::text IS NULL OR ss.active_student_id = $2)
           AND ($3::text IS NULL OR ss.material_id = $3)
           AND ($4::text IS NULL OR ss.course_id = $4)
           AND ($5::text IS NULL OR ss.class = $5)
           AND ($6::text IS NULL OR ss.school_year = $6)
           AND (NOT $7 OR ss.status <> $8)
         ORDER BY ss.created_at DESC, ss.id DESC"
    ))
    .bind(filter.teacher_id)
    .bind(filter.active_student_id)
    .bind(filter.material_id)
    .bind(filter.course_id)
    .bind(filter.class)
    .bind(filter.school_year)
    .bind(filter.current_only)
    .bind(SubmissionStatus::PendingAfterReset)
    .fetch_all(pool)
    .await
}

/// Courses that received at least one attempt, optionally for one teacher.
pub(crate) async fn course_ids_with_submissions(
    pool: &PgPool,
    teacher_id: Option<&str>,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT course_id FROM submission_students
         WHERE ($1::text IS NULL OR teacher_id = $1)",
    )
    .bind(teacher_id)
    .fetch_all(pool)
    .await
}
