mod student;
mod teacher;

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, teacher_profile, CurrentUser};
use crate::api::validation::non_empty;
use crate::core::state::AppState;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::submission_students::{SubmissionFilter, SubmissionRow};
use crate::schemas::submission::{SubmissionList, SubmissionListQuery, SubmissionStudentResponse};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::submission_flow::StatusCounts;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/submission-student", get(list_submissions).post(student::create_submission))
        .route("/submission-student/:student_id", get(latest_submission))
        .route("/submission-student/detail/:id", get(submission_detail))
        .route("/submission-student/approve/:student_id", put(teacher::approve_submission))
        .route("/submission-student/reject/:student_id", put(teacher::reject_submission))
        .route("/reset-submission", put(student::reset_submission))
        .route("/placeholder/submission-student", get(teacher::submission_placeholder))
}

/// Teachers see attempts at their own courses, students only their own.
async fn ensure_visible(state: &AppState, user: &User, row: &SubmissionRow) -> Result<(), ApiError> {
    let visible = match user.role {
        UserRole::Teacher => teacher_profile(state, user).await?.id == row.submission.teacher_id,
        _ => {
            let student = repositories::students::find_by_user_id(state.db(), &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;
            student.is_some_and(|student| student.id == row.student_id)
        }
    };

    if visible {
        Ok(())
    } else {
        Err(ApiError::NotFound("Submission not found".to_string()))
    }
}

async fn list_submissions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<WebResponse<SubmissionList>>, ApiError> {
    authorize(&user, Capability::ViewSubmissions)?;

    let (teacher, enrollment) = match user.role {
        UserRole::Teacher => (Some(teacher_profile(&state, &user).await?), None),
        _ => (None, Some(enrollment::for_user(state.db(), &user.id).await?)),
    };

    let filter = match (&teacher, &enrollment) {
        (Some(teacher), _) => SubmissionFilter {
            teacher_id: Some(&teacher.id),
            material_id: non_empty(query.material_id.as_deref()),
            class: non_empty(query.class.as_deref()),
            current_only: true,
            ..SubmissionFilter::default()
        },
        (None, enrollment) => SubmissionFilter {
            active_student_id: enrollment.as_ref().map(|e| e.id.as_str()),
            teacher_id: non_empty(query.teacher_id.as_deref()),
            course_id: non_empty(query.course_id.as_deref()),
            current_only: true,
            ..SubmissionFilter::default()
        },
    };

    let rows = repositories::submission_students::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    let status = StatusCounts::tally(rows.iter().map(|row| row.submission.status));
    Ok(Json(WebResponse::success(
        "Submissions fetched",
        SubmissionList {
            status,
            submissions: rows.into_iter().map(SubmissionStudentResponse::from_row).collect(),
        },
    )))
}

async fn latest_submission(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<WebResponse<SubmissionStudentResponse>>, ApiError> {
    authorize(&user, Capability::ViewSubmissions)?;
    let enrollment = enrollment::for_student(state.db(), &student_id).await?;

    let row = repositories::submission_students::latest_current_for_student(
        state.db(),
        &enrollment.id,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
    .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    ensure_visible(&state, &user, &row).await?;

    Ok(Json(WebResponse::success("Submission fetched", SubmissionStudentResponse::from_row(row))))
}

async fn submission_detail(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(submission_id): Path<String>,
) -> Result<Json<WebResponse<SubmissionStudentResponse>>, ApiError> {
    authorize(&user, Capability::ViewSubmissions)?;

    let row = repositories::submission_students::find_row(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    ensure_visible(&state, &user, &row).await?;

    Ok(Json(WebResponse::success("Submission fetched", SubmissionStudentResponse::from_row(row))))
}

#[cfg(test)]
mod tests;
