use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::courses::viewable_course;
use crate::api::errors::ApiError;
use crate::api::guards::{authorize, owned_course, CurrentUser};
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Chapter, User};
use crate::repositories;
use crate::schemas::course::{ChapterResponse, CreateChapterRequest, UpdateChapterRequest};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::ids::new_id;
use crate::services::slug::slugify;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/chapters", post(create_chapter))
        .route("/chapters/:id", get(get_chapter).put(update_chapter).delete(delete_chapter))
}

async fn find_chapter(state: &AppState, chapter_id: &str) -> Result<Chapter, ApiError> {
    repositories::chapters::find_by_id(state.db(), chapter_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch chapter"))?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))
}

/// Chapter of a course the calling teacher owns.
pub(crate) async fn owned_chapter(
    state: &AppState,
    user: &User,
    chapter_id: &str,
) -> Result<Chapter, ApiError> {
    let chapter = find_chapter(state, chapter_id).await?;
    owned_course(state, user, &chapter.course_id).await?;
    Ok(chapter)
}

async fn create_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateChapterRequest>,
) -> Result<(StatusCode, Json<WebResponse<ChapterResponse>>), ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let (_, course) = owned_course(&state, &user, &payload.course_id).await?;

    let title = payload.title.trim();
    let chapter = repositories::chapters::create(
        state.db(),
        repositories::chapters::CreateChapter {
            id: &new_id(),
            course_id: &course.id,
            title,
            slug: &slugify(title),
            is_draft: payload.is_draft,
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create chapter"))?;

    tracing::info!(
        chapter_id = %chapter.id,
        course_id = %course.id,
        position = chapter.position,
        action = "chapter_create",
        "Chapter created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("Chapter created", ChapterResponse::from_db(chapter))),
    ))
}

async fn get_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> Result<Json<WebResponse<ChapterResponse>>, ApiError> {
    authorize(&user, Capability::BrowseCourses)?;
    let chapter = find_chapter(&state, &chapter_id).await?;
    viewable_course(&state, &user, &chapter.course_id).await?;

    Ok(Json(WebResponse::success("Chapter fetched", ChapterResponse::from_db(chapter))))
}

async fn update_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
    Json(payload): Json<UpdateChapterRequest>,
) -> Result<Json<WebResponse<ChapterResponse>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let existing = owned_chapter(&state, &user, &chapter_id).await?;

    let title = payload.title.trim();
    let chapter = repositories::chapters::update(
        state.db(),
        &existing.id,
        title,
        &slugify(title),
        payload.is_draft,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update chapter"))?
    .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))?;

    tracing::info!(chapter_id = %chapter.id, action = "chapter_update", "Chapter updated");

    Ok(Json(WebResponse::success("Chapter updated", ChapterResponse::from_db(chapter))))
}

async fn delete_chapter(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    let chapter = owned_chapter(&state, &user, &chapter_id).await?;

    repositories::chapters::delete(state.db(), &chapter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete chapter"))?;

    tracing::info!(
        chapter_id = %chapter.id,
        course_id = %chapter.course_id,
        action = "chapter_delete",
        "Chapter deleted"
    );

    Ok(Json(WebResponse::success("Chapter deleted", ())))
}
