use sqlx::{PgPool, Postgres, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::{Material, Quiz, QuizAnswer, QuizAnswerStudent, QuizQuestion};
use crate::db::types::MaterialType;
use crate::repositories::materials::{self, NewMaterial};
use crate::services::ids;

const QUIZ_COLUMNS: &str = "id, chapter_id, title, description, created_at, updated_at";
const QUESTION_COLUMNS: &str = "id, quiz_id, question, img_url, position, created_at";
const STUDENT_ANSWER_COLUMNS: &str = "\
    id, quiz_id, quiz_question_id, quiz_answer_id, active_student_id, answered, score, grade, \
    created_at";

#[derive(Debug, Clone)]
pub(crate) struct NewQuestion {
    pub(crate) question: String,
    pub(crate) img_url: Option<String>,
    pub(crate) answers: Vec<NewAnswer>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewAnswer {
    pub(crate) answer: String,
    pub(crate) is_correct: bool,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_questions(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuizQuestion>, sqlx::Error> {
    sqlx::query_as::<_, QuizQuestion>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM quiz_questions WHERE quiz_id = $1 ORDER BY position ASC"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_answers(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuizAnswer>, sqlx::Error> {
    sqlx::query_as::<_, QuizAnswer>(
        "SELECT a.id, a.quiz_question_id, a.answer, a.is_correct, a.created_at
         FROM quiz_answers a
         JOIN quiz_questions q ON q.id = a.quiz_question_id
         WHERE q.quiz_id = $1
         ORDER BY q.position ASC, a.created_at ASC, a.id ASC",
    )
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) struct CreateQuiz<'a> {
    pub(crate) material_id: &'a str,
    pub(crate) chapter_id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) description: &'a str,
    pub(crate) questions: &'a [NewQuestion],
    pub(crate) now: PrimitiveDateTime,
}

/// Creates the QUIZ material, the quiz and its question tree atomically.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuiz<'_>,
) -> Result<(Material, Quiz), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let material = materials::insert(
        &mut tx,
        NewMaterial {
            id: params.material_id,
            chapter_id: params.chapter_id,
            course_id: params.course_id,
            title: params.title,
            slug: params.slug,
            material_type: MaterialType::Quiz,
            now: params.now,
        },
    )
    .await?;

    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (id, chapter_id, title, description, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5)
         RETURNING {QUIZ_COLUMNS}"
    ))
    .bind(params.material_id)
    .bind(params.chapter_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.now)
    .fetch_one(&mut *tx)
    .await?;

    insert_questions(&mut tx, &quiz.id, params.questions, params.now).await?;

    tx.commit().await?;
    Ok((material, quiz))
}

pub(crate) struct UpdateQuiz<'a> {
    pub(crate) title: &'a str,
    pub(crate) slug: &'a str,
    pub(crate) description: &'a str,
    /// Replaces the whole question tree when non-empty.
    pub(crate) questions: &'a [NewQuestion],
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuiz<'_>,
) -> Result<(Material, Quiz), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let material = materials::rename(&mut *tx, id, params.title, params.slug, params.now).await?;
    let quiz = sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET title = $2, description = $3, updated_at = $4
         WHERE id = $1
         RETURNING {QUIZ_COLUMNS}"
    ))
    .bind(id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.now)
    .fetch_one(&mut *tx)
    .await?;

    if !params.questions.is_empty() {
        for statement in [
            "DELETE FROM quiz_answer_students WHERE quiz_id = $1",
            "DELETE FROM quiz_answers WHERE quiz_question_id IN (
                SELECT id FROM quiz_questions WHERE quiz_id = $1)",
            "DELETE FROM quiz_questions WHERE quiz_id = $1",
        ] {
            sqlx::query(statement).bind(id).execute(&mut *tx).await?;
        }
        insert_questions(&mut tx, id, params.questions, params.now).await?;
    }

    tx.commit().await?;
    Ok((material, quiz))
}

async fn insert_questions(
    executor: &mut Transaction<'_, Postgres>,
    quiz_id: &str,
    questions: &[NewQuestion],
    now: PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    for (index, question) in questions.iter().enumerate() {
        let question_id = ids::new_id();
        sqlx::query(
            "INSERT INTO quiz_questions (id, quiz_id, question, img_url, position, created_at)
             VALUES ($1,$2,$3,$4,$5,$6)",
        )
        .bind(&question_id)
        .bind(quiz_id)
        .bind(&question.question)
        .bind(question.img_url.as_deref())
        .bind(index as i32 + 1)
        .bind(now)
        .execute(&mut **executor)
        .await?;

        for answer in &question.answers {
            sqlx::query(
                "INSERT INTO quiz_answers (id, quiz_question_id, answer, is_correct, created_at)
                 VALUES ($1,$2,$3,$4,$5)",
            )
            .bind(ids::new_id())
            .bind(&question_id)
            .bind(&answer.answer)
            .bind(answer.is_correct)
            .bind(now)
            .execute(&mut **executor)
            .await?;
        }
    }
    Ok(())
}

pub(crate) struct RecordAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) quiz_question_id: &'a str,
    pub(crate) quiz_answer_id: &'a str,
    pub(crate) active_student_id: &'a str,
    pub(crate) answered: i32,
    pub(crate) score: i32,
    pub(crate) grade: i32,
    pub(crate) now: PrimitiveDateTime,
}

pub(crate) async fn record_answer(
    executor: impl sqlx::PgExecutor<'_>,
    params: RecordAnswer<'_>,
) -> Result<QuizAnswerStudent, sqlx::Error> {
    sqlx::query_as::<_, QuizAnswerStudent>(&format!(
        "INSERT INTO quiz_answer_students (
            id, quiz_id, quiz_question_id, quiz_answer_id, active_student_id,
            answered, score, grade, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {STUDENT_ANSWER_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.quiz_question_id)
    .bind(params.quiz_answer_id)
    .bind(params.active_student_id)
    .bind(params.answered)
    .bind(params.score)
    .bind(params.grade)
    .bind(params.now)
    .fetch_one(executor)
    .await
}

/// Newest answer row of the student for the quiz; it carries the final
/// grade of the latest attempt.
pub(crate) async fn latest_result(
    pool: &PgPool,
    quiz_id: &str,
    active_student_id: &str,
) -> Result<Option<QuizAnswerStudent>, sqlx::Error> {
    sqlx::query_as::<_, QuizAnswerStudent>(&format!(
        "SELECT {STUDENT_ANSWER_COLUMNS} FROM quiz_answer_students
         WHERE quiz_id = $1 AND active_student_id = $2
         ORDER BY created_at DESC, answered DESC
         LIMIT 1"
    ))
    .bind(quiz_id)
    .bind(active_student_id)
    .fetch_optional(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct QuizGradeRow {
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) score: i32,
    pub(crate) grade: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn latest_grades_for_student(
    pool: &PgPool,
    active_student_id: &str,
) -> Result<Vec<QuizGradeRow>, sqlx::Error> {
    sqlx::query_as::<_, QuizGradeRow>(
        "SELECT DISTINCT ON (qas.quiz_id)
                qas.quiz_id, q.title AS quiz_title, c.id AS course_id, c.title AS course_title,
                qas.score, qas.grade, qas.created_at
         FROM quiz_answer_students qas
         JOIN quizzes q ON q.id = qas.quiz_id
         JOIN materials m ON m.id = q.id
         JOIN courses c ON c.id = m.course_id
         WHERE qas.active_student_id = $1
         ORDER BY qas.quiz_id, qas.created_at DESC, qas.answered DESC",
    )
    .bind(active_student_id)
    .fetch_all(pool)
    .await
}
