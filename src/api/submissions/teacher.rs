use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, owned_course, teacher_profile, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{SubmissionStudent, User};
use crate::db::types::{MaterialType, UserRole};
use crate::repositories;
use crate::repositories::submission_students::Review;
use crate::schemas::submission::{
    ApproveRequest, IdTitle, RejectRequest, SubmissionPlaceholder, SubmissionStudentResponse,
};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::submission_flow::{advance, Transition};

/// Attempt `submission_id` of the student, at a course the caller owns.
async fn reviewable(
    state: &AppState,
    user: &User,
    student_id: &str,
    submission_id: &str,
) -> Result<SubmissionStudent, ApiError> {
    let enrollment = enrollment::for_student(state.db(), student_id).await?;
    let submission = repositories::submission_students::find_by_id(state.db(), submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .filter(|submission| submission.active_student_id == enrollment.id)
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    owned_course(state, user, &submission.course_id).await?;
    Ok(submission)
}

async fn apply_review(
    state: &AppState,
    user: &User,
    submission: SubmissionStudent,
    transition: Transition,
    grade: Option<i32>,
    comment: Option<&str>,
) -> Result<SubmissionStudent, ApiError> {
    let teacher = teacher_profile(state, user).await?;
    let next = advance(submission.status, transition)?;

    let reviewed = repositories::submission_students::review(
        state.db(),
        &submission.id,
        submission.status,
        Review { status: next, grade, comment, teacher_id: &teacher.id, now: primitive_now_utc() },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to review submission"))?
    .ok_or_else(|| ApiError::Conflict("Submission has already been reviewed".to_string()))?;

    metrics::record_submission_transition(next);
    tracing::info!(
        submission_id = %reviewed.id,
        teacher_id = %teacher.id,
        status = reviewed.status.as_db_str(),
        grade = ?reviewed.grade,
        action = "submission_review",
        "Submission reviewed"
    );
    Ok(reviewed)
}

pub(super) async fn approve_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(payload): Json<ApproveRequest>,
) -> Result<Json<WebResponse<SubmissionStudentResponse>>, ApiError> {
    authorize(&user, Capability::ReviewSubmissions)?;
    validate_payload(&payload)?;

    let submission = reviewable(&state, &user, &student_id, &payload.submission_id).await?;
    let reviewed = apply_review(
        &state,
        &user,
        submission,
        Transition::Approve,
        Some(payload.grade),
        None,
    )
    .await?;

    Ok(Json(WebResponse::success(
        "Submission approved",
        SubmissionStudentResponse::from_db(reviewed),
    )))
}

pub(super) async fn reject_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(payload): Json<RejectRequest>,
) -> Result<Json<WebResponse<SubmissionStudentResponse>>, ApiError> {
    authorize(&user, Capability::ReviewSubmissions)?;
    validate_payload(&payload)?;

    let submission = reviewable(&state, &user, &student_id, &payload.submission_id).await?;
    let reviewed = apply_review(
        &state,
        &user,
        submission,
        Transition::Reject,
        None,
        Some(payload.comment.trim()),
    )
    .await?;

    Ok(Json(WebResponse::success(
        "Submission rejected",
        SubmissionStudentResponse::from_db(reviewed),
    )))
}

/// Courses that received attempts, each with its SUBMISSION materials, for
/// filter dropdowns.
pub(super) async fn submission_placeholder(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<WebResponse<Vec<SubmissionPlaceholder>>>, ApiError> {
    authorize(&user, Capability::ViewSubmissions)?;

    let teacher_id = match user.role {
        UserRole::Teacher => Some(teacher_profile(&state, &user).await?.id),
        _ => None,
    };

    let course_ids =
        repositories::submission_students::course_ids_with_submissions(state.db(), teacher_id.as_deref())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission courses"))?;
    let courses = repositories::courses::find_many(state.db(), &course_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch courses"))?;
    let materials = repositories::materials::list_by_type_for_courses(
        state.db(),
        &course_ids,
        MaterialType::Submission,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch materials"))?;

    let mut by_course: HashMap<String, Vec<IdTitle>> = HashMap::new();
    for material in materials {
        by_course
            .entry(material.course_id)
            .or_default()
            .push(IdTitle { id: material.id, title: material.title });
    }

    let placeholders = courses
        .into_iter()
        .map(|course| SubmissionPlaceholder {
            materials: by_course.remove(&course.id).unwrap_or_default(),
            id: course.id,
            title: course.title,
        })
        .collect();

    Ok(Json(WebResponse::success("Submission placeholders fetched", placeholders)))
}
