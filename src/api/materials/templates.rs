use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{delete_material, find_material, owned_material, surroundings};
use crate::api::chapters::owned_chapter;
use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::MaterialType;
use crate::repositories;
use crate::repositories::submission_students::SubmissionFilter;
use crate::schemas::material::{
    CreateMaterialRequest, MaterialContent, SubmissionReviewDetail, SubmissionTemplateDetail,
    UpdateMaterialRequest,
};
use crate::schemas::submission::SubmissionStudentResponse;
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::ids::new_id;
use crate::services::slug::slugify;
use crate::services::submission_flow::current_and_history;

pub(super) async fn create_template(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<WebResponse<MaterialContent>>), ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let chapter = owned_chapter(&state, &user, &payload.chapter_id).await?;

    let title = payload.title.trim();
    let (material, template) = repositories::submission_templates::create(
        state.db(),
        repositories::submission_templates::CreateTemplate {
            material_id: &new_id(),
            template_id: &new_id(),
            chapter_id: &chapter.id,
            course_id: &chapter.course_id,
            title,
            slug: &slugify(title),
            content: &payload.content,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create submission"))?;

    tracing::info!(
        material_id = %material.id,
        chapter_id = %chapter.id,
        position = material.position,
        action = "submission_template_create",
        "Submission created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Submission created",
            MaterialContent::from_db(material, template.content),
        )),
    ))
}

async fn template_content(state: &AppState, material_id: &str) -> Result<String, ApiError> {
    let template = repositories::submission_templates::find_by_material(state.db(), material_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;
    Ok(template.content)
}

pub(super) async fn get_template(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<SubmissionTemplateDetail>>, ApiError> {
    authorize(&user, Capability::BrowseCourses)?;
    let material = find_material(&state, &material_id, MaterialType::Submission).await?;
    let around = surroundings(&state, &user, &material).await?;
    let content = template_content(&state, &material.id).await?;

    let (is_complete, submitted, history) = match around.student {
        Some((enrollment, done)) => {
            let attempts = repositories::submission_students::attempts_for(
                state.db(),
                &enrollment.id,
                &material.id,
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch submission attempts"))?;
            let (current, history) = current_and_history(attempts);
            (
                Some(done),
                current.map(SubmissionStudentResponse::from_db),
                history.into_iter().map(SubmissionStudentResponse::from_db).collect(),
            )
        }
        None => (None, None, Vec::new()),
    };

    Ok(Json(WebResponse::success(
        "Submission fetched",
        SubmissionTemplateDetail {
            material: MaterialContent::from_db(material, content),
            is_complete,
            next: around.next,
            submitted,
            history,
        },
    )))
}

pub(super) async fn review_template(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<SubmissionReviewDetail>>, ApiError> {
    authorize(&user, Capability::ReviewSubmissions)?;
    let material = owned_material(&state, &user, &material_id, MaterialType::Submission).await?;
    let content = template_content(&state, &material.id).await?;

    let rows = repositories::submission_students::list(
        state.db(),
        &SubmissionFilter {
            material_id: Some(&material.id),
            current_only: true,
            ..SubmissionFilter::default()
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list submission attempts"))?;

    Ok(Json(WebResponse::success(
        "Submission fetched",
        SubmissionReviewDetail {
            material: MaterialContent::from_db(material, content),
            submissions: rows.into_iter().map(SubmissionStudentResponse::from_row).collect(),
        },
    )))
}

pub(super) async fn update_template(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<Json<WebResponse<MaterialContent>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let existing = owned_material(&state, &user, &material_id, MaterialType::Submission).await?;

    let title = payload.title.trim();
    let (material, template) = repositories::submission_templates::update(
        state.db(),
        &existing.id,
        title,
        &slugify(title),
        &payload.content,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update submission"))?;

    tracing::info!(
        material_id = %material.id,
        action = "submission_template_update",
        "Submission updated"
    );

    Ok(Json(WebResponse::success(
        "Submission updated",
        MaterialContent::from_db(material, template.content),
    )))
}

pub(super) async fn delete_template(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    delete_material(&state, &user, &material_id, MaterialType::Submission).await?;
    Ok(Json(WebResponse::success("Submission deleted", ())))
}
