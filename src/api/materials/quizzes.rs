use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{delete_material, find_material, owned_material, surroundings};
use crate::api::chapters::owned_chapter;
use crate::api::courses::viewable_course;
use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Material, Quiz};
use crate::db::types::{MaterialType, UserRole};
use crate::repositories;
use crate::repositories::quizzes::{NewQuestion, RecordAnswer};
use crate::schemas::quiz::{AnswerResult, QuizAnswerRequest, QuizDetail, QuizRequest, QuizResponse};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::ids::new_id;
use crate::services::quiz_scoring::RunningGrade;
use crate::services::slug::slugify;

fn question_tree(payload: &QuizRequest) -> Result<Vec<NewQuestion>, ApiError> {
    if let Some(position) = payload.questions.iter().position(|q| !q.has_correct_answer()) {
        return Err(ApiError::BadRequest(format!(
            "Question {} has no correct answer",
            position + 1
        )));
    }
    Ok(payload.questions.iter().map(|question| question.to_new()).collect())
}

async fn load_quiz(
    state: &AppState,
    material: Material,
    reveal: bool,
) -> Result<QuizResponse, ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), &material.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;
    assemble(state, material, quiz, reveal).await
}

async fn assemble(
    state: &AppState,
    material: Material,
    quiz: Quiz,
    reveal: bool,
) -> Result<QuizResponse, ApiError> {
    let questions = repositories::quizzes::list_questions(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz questions"))?;
    let answers = repositories::quizzes::list_answers(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz answers"))?;
    Ok(QuizResponse::assemble(material, quiz, questions, answers, reveal))
}

pub(super) async fn create_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
    Json(payload): Json<QuizRequest>,
) -> Result<(StatusCode, Json<WebResponse<QuizResponse>>), ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let questions = question_tree(&payload)?;
    let chapter = owned_chapter(&state, &user, &chapter_id).await?;

    let title = payload.title.trim();
    let (material, quiz) = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            material_id: &new_id(),
            chapter_id: &chapter.id,
            course_id: &chapter.course_id,
            title,
            slug: &slugify(title),
            description: &payload.description,
            questions: &questions,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    tracing::info!(
        material_id = %material.id,
        chapter_id = %chapter.id,
        questions = questions.len(),
        action = "quiz_create",
        "Quiz created"
    );

    let response = assemble(&state, material, quiz, true).await?;
    Ok((StatusCode::CREATED, Json(WebResponse::success("Quiz created", response))))
}

pub(super) async fn get_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<QuizDetail>>, ApiError> {
    authorize(&user, Capability::BrowseCourses)?;
    let material = find_material(&state, &material_id, MaterialType::Quiz).await?;
    let around = surroundings(&state, &user, &material).await?;

    let (is_complete, latest) = match &around.student {
        Some((enrollment, done)) => {
            let latest =
                repositories::quizzes::latest_result(state.db(), &material.id, &enrollment.id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch quiz result"))?;
            (Some(*done), latest)
        }
        None => (None, None),
    };

    let quiz = load_quiz(&state, material, user.role != UserRole::Student).await?;
    Ok(Json(WebResponse::success(
        "Quiz fetched",
        QuizDetail {
            quiz,
            is_complete,
            grade: latest.as_ref().map(|row| row.grade),
            score: latest.as_ref().map(|row| row.score),
            next: around.next,
        },
    )))
}

pub(super) async fn update_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
    Json(payload): Json<QuizRequest>,
) -> Result<Json<WebResponse<QuizResponse>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let questions = question_tree(&payload)?;
    let existing = owned_material(&state, &user, &material_id, MaterialType::Quiz).await?;

    let title = payload.title.trim();
    let (material, quiz) = repositories::quizzes::update(
        state.db(),
        &existing.id,
        repositories::quizzes::UpdateQuiz {
            title,
            slug: &slugify(title),
            description: &payload.description,
            questions: &questions,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?;

    tracing::info!(
        material_id = %material.id,
        replaced_questions = !questions.is_empty(),
        action = "quiz_update",
        "Quiz updated"
    );

    let response = assemble(&state, material, quiz, true).await?;
    Ok(Json(WebResponse::success("Quiz updated", response)))
}

pub(super) async fn delete_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    delete_material(&state, &user, &material_id, MaterialType::Quiz).await?;
    Ok(Json(WebResponse::success("Quiz deleted", ())))
}

/// Scores a batch of answers in request order. Every row carries the grade
/// as of that answer, so the last one holds the final grade.
pub(super) async fn answer_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(quiz_id): Path<String>,
    Json(payload): Json<QuizAnswerRequest>,
) -> Result<(StatusCode, Json<WebResponse<Vec<AnswerResult>>>), ApiError> {
    authorize(&user, Capability::AnswerQuiz)?;
    validate_payload(&payload)?;
    let material = find_material(&state, &quiz_id, MaterialType::Quiz).await?;
    viewable_course(&state, &user, &material.course_id).await?;
    let enrollment = enrollment::for_user(state.db(), &user.id).await?;

    let questions = repositories::quizzes::list_questions(state.db(), &material.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz questions"))?;
    let answers = repositories::quizzes::list_answers(state.db(), &material.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz answers"))?;

    let mut running = RunningGrade::default();
    let mut scored = Vec::with_capacity(payload.answer.len());
    for choice in &payload.answer {
        let question = questions
            .iter()
            .find(|question| question.id == choice.quizes_id)
            .ok_or_else(|| ApiError::BadRequest("Question does not belong to this quiz".into()))?;
        let chosen = answers
            .iter()
            .find(|answer| {
                answer.id == choice.quiz_answer_id && answer.quiz_question_id == question.id
            })
            .ok_or_else(|| {
                ApiError::BadRequest("Answer does not belong to this question".into())
            })?;
        let correct = answers
            .iter()
            .find(|answer| answer.quiz_question_id == question.id && answer.is_correct);
        scored.push((question, chosen, correct, running.record(chosen.is_correct)));
    }

    let now = primitive_now_utc();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let mut results = Vec::with_capacity(scored.len());
    for (question, chosen, correct, outcome) in scored {
        let row = repositories::quizzes::record_answer(
            &mut *tx,
            RecordAnswer {
                id: &new_id(),
                quiz_id: &material.id,
                quiz_question_id: &question.id,
                quiz_answer_id: &chosen.id,
                active_student_id: &enrollment.id,
                answered: outcome.answered,
                score: outcome.score,
                grade: outcome.grade,
                now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to record quiz answer"))?;
        results.push(AnswerResult::from_db(
            row,
            question.question.clone(),
            chosen.answer.clone(),
            correct.map(|answer| answer.answer.clone()),
            outcome.correct,
        ));
    }
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit quiz answers"))?;

    metrics::record_quiz_answers(running.answered() as usize, running.score() as usize);
    tracing::info!(
        quiz_id = %material.id,
        active_student_id = %enrollment.id,
        answered = running.answered(),
        score = running.score(),
        action = "quiz_answer",
        "Quiz answered"
    );

    Ok((StatusCode::CREATED, Json(WebResponse::success("Quiz answered", results))))
}
