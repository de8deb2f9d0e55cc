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
use crate::schemas::material::{
    CreateMaterialRequest, MaterialContent, TheoryDetail, UpdateMaterialRequest,
};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::ids::new_id;
use crate::services::slug::slugify;

pub(super) async fn create_theory(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<WebResponse<MaterialContent>>), ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let chapter = owned_chapter(&state, &user, &payload.chapter_id).await?;

    let title = payload.title.trim();
    let material_id = new_id();
    let (material, theory) = repositories::theories::create(
        state.db(),
        repositories::theories::CreateTheory {
            material_id: &material_id,
            theory_id: &new_id(),
            chapter_id: &chapter.id,
            course_id: &chapter.course_id,
            title,
            slug: &slugify(title),
            content: &payload.content,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create theory"))?;

    tracing::info!(
        material_id = %material.id,
        chapter_id = %chapter.id,
        position = material.position,
        action = "theory_create",
        "Theory created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Theory created",
            MaterialContent::from_db(material, theory.content),
        )),
    ))
}

pub(super) async fn get_theory(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<TheoryDetail>>, ApiError> {
    authorize(&user, Capability::BrowseCourses)?;
    let material = find_material(&state, &material_id, MaterialType::Theory).await?;
    let around = surroundings(&state, &user, &material).await?;

    let theory = repositories::theories::find_by_material(state.db(), &material.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch theory"))?
        .ok_or_else(|| ApiError::NotFound("Theory not found".to_string()))?;

    Ok(Json(WebResponse::success(
        "Theory fetched",
        TheoryDetail {
            material: MaterialContent::from_db(material, theory.content),
            is_complete: around.student.map(|(_, done)| done),
            next: around.next,
        },
    )))
}

pub(super) async fn update_theory(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<Json<WebResponse<MaterialContent>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let existing = owned_material(&state, &user, &material_id, MaterialType::Theory).await?;

    let title = payload.title.trim();
    let (material, theory) = repositories::theories::update(
        state.db(),
        &existing.id,
        title,
        &slugify(title),
        &payload.content,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update theory"))?;

    tracing::info!(material_id = %material.id, action = "theory_update", "Theory updated");

    Ok(Json(WebResponse::success(
        "Theory updated",
        MaterialContent::from_db(material, theory.content),
    )))
}

pub(super) async fn delete_theory(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(material_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    delete_material(&state, &user, &material_id, MaterialType::Theory).await?;
    Ok(Json(WebResponse::success("Theory deleted", ())))
}
