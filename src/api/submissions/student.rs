use axum::{extract::State, http::StatusCode, Json};

use crate::api::courses::viewable_course;
use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::metrics;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{MaterialType, SubmissionStatus};
use crate::repositories;
use crate::schemas::submission::{ResetRequest, SubmissionStudentRequest, SubmissionStudentResponse};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::ids::new_id;
use crate::services::submission_flow::{advance, current_and_history, Transition};

/// Uploads a new attempt. The course, teacher and enrolment are copied onto
/// the attempt so later edits do not rewrite history.
pub(super) async fn create_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmissionStudentRequest>,
) -> Result<(StatusCode, Json<WebResponse<SubmissionStudentResponse>>), ApiError> {
    authorize(&user, Capability::SubmitWork)?;
    validate_payload(&payload)?;

    let material = repositories::materials::find_by_id(state.db(), &payload.material_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch material"))?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;
    if material.material_type != MaterialType::Submission || material.course_id != payload.course_id
    {
        return Err(ApiError::BadRequest(
            "Material is not a submission of this course".to_string(),
        ));
    }

    let course = viewable_course(&state, &user, &material.course_id).await?;
    let enrollment = enrollment::for_user(state.db(), &user.id).await?;

    let attempts =
        repositories::submission_students::attempts_for(state.db(), &enrollment.id, &material.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission attempts"))?;
    if current_and_history(attempts).0.is_some() {
        return Err(ApiError::Conflict(
            "Submission already exists for this material".to_string(),
        ));
    }

    let submission = repositories::submission_students::create(
        state.db(),
        repositories::submission_students::CreateSubmission {
            id: &new_id(),
            material_id: &material.id,
            course_id: &course.id,
            school_id: &enrollment.school_id,
            teacher_id: &course.teacher_id,
            active_student_id: &enrollment.id,
            file_url: payload.file_url.trim(),
            description: &payload.description,
            course_title: &course.title,
            class: &enrollment.class,
            school_year: &enrollment.school_year,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create submission"))?;

    metrics::record_submission_transition(SubmissionStatus::Pending);
    tracing::info!(
        submission_id = %submission.id,
        material_id = %material.id,
        active_student_id = %enrollment.id,
        action = "submission_create",
        "Submission uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Submission created",
            SubmissionStudentResponse::from_db(submission),
        )),
    ))
}

/// Archives a teacher-rejected attempt so a fresh one can be uploaded.
pub(super) async fn reset_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> Result<Json<WebResponse<SubmissionStudentResponse>>, ApiError> {
    authorize(&user, Capability::SubmitWork)?;
    validate_payload(&payload)?;
    let enrollment = enrollment::for_user(state.db(), &user.id).await?;

    let submission = repositories::submission_students::find_by_id(state.db(), &payload.submitted_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .filter(|submission| submission.active_student_id == enrollment.id)
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let next = advance(submission.status, Transition::Reset)?;
    let updated = repositories::submission_students::set_status(
        state.db(),
        &submission.id,
        submission.status,
        next,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to reset submission"))?
    .ok_or_else(|| ApiError::Conflict("Submission changed while resetting".to_string()))?;

    metrics::record_submission_transition(next);
    tracing::info!(
        submission_id = %updated.id,
        active_student_id = %enrollment.id,
        action = "submission_reset",
        "Submission reset"
    );

    Ok(Json(WebResponse::success("Submission reset", SubmissionStudentResponse::from_db(updated))))
}
