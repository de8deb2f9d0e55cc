use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::courses::viewable_course;
use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::course::{
    CompleteCourseRequest, CompleteCourseResponse, ProgressRequest, ProgressResponse,
    StudentClassEntry,
};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::ids::new_id;
use crate::services::progression::CourseOutline;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/progress", put(record_progress))
        .route("/complete-course", put(complete_course))
        .route("/class/student", get(student_classes))
}

async fn record_progress(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ProgressRequest>,
) -> Result<(StatusCode, Json<WebResponse<ProgressResponse>>), ApiError> {
    authorize(&user, Capability::TrackProgress)?;
    validate_payload(&payload)?;

    let material = repositories::materials::find_by_id(state.db(), &payload.material_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch material"))?
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))?;
    if material.course_id != payload.course_id {
        return Err(ApiError::BadRequest("Material does not belong to this course".to_string()));
    }
    let course = viewable_course(&state, &user, &material.course_id).await?;
    let enrollment = enrollment::for_user(state.db(), &user.id).await?;

    let progress = repositories::progress::record(
        state.db(),
        repositories::progress::RecordProgress {
            id: &new_id(),
            active_student_id: &enrollment.id,
            course_id: &course.id,
            material_id: &material.id,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record progress"))?
    .ok_or_else(|| ApiError::BadRequest("Student already finished this material".to_string()))?;

    tracing::info!(
        material_id = %material.id,
        course_id = %course.id,
        active_student_id = %enrollment.id,
        action = "progress_record",
        "Material completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Progress recorded",
            ProgressResponse {
                id: progress.id,
                course_id: progress.course_id,
                material_id: progress.material_id,
                created_at: format_primitive(progress.created_at),
            },
        )),
    ))
}

/// Saves the course completion once every material has progress. Saving
/// again returns the existing record.
async fn complete_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CompleteCourseRequest>,
) -> Result<(StatusCode, Json<WebResponse<CompleteCourseResponse>>), ApiError> {
    authorize(&user, Capability::TrackProgress)?;
    validate_payload(&payload)?;

    let course = viewable_course(&state, &user, &payload.course_id).await?;
    let enrollment = enrollment::for_user(state.db(), &user.id).await?;

    let outline = CourseOutline::load(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course outline"))?;
    let completed =
        repositories::progress::completed_material_ids(state.db(), &enrollment.id, &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch progress"))?;
    if !outline.is_fully_complete(&completed) {
        return Err(ApiError::BadRequest("Course still has unfinished materials".to_string()));
    }

    let record = repositories::complete_courses::save(
        state.db(),
        &new_id(),
        &enrollment.id,
        &course.id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save course completion"))?;

    tracing::info!(
        course_id = %course.id,
        active_student_id = %enrollment.id,
        completion_id = %record.id,
        action = "course_complete",
        "Course completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Course completed",
            CompleteCourseResponse { course_id: record.course_id },
        )),
    ))
}

async fn student_classes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<WebResponse<Vec<StudentClassEntry>>>, ApiError> {
    authorize(&user, Capability::TrackProgress)?;

    let school = repositories::schools::find_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?
        .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;
    let classes =
        repositories::active_students::list_for_user_in_year(state.db(), &user.id, &school.school_year)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch classes"))?;

    let entries = classes
        .into_iter()
        .map(|active| StudentClassEntry {
            label: format!("Kelas {} ({})", active.class, active.school_year),
            id: active.id,
            class: active.class,
            school_year: active.school_year,
        })
        .collect();

    Ok(Json(WebResponse::success("Classes fetched", entries)))
}

#[cfg(test)]
mod tests;
