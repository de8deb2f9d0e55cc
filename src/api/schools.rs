use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::pagination::{Page, PageQuery};
use crate::api::validation::{non_empty, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::school::{SchoolRequest, SchoolResponse, SearchQuery};
use crate::schemas::{Paginated, WebResponse};
use crate::services::access_policy::Capability;
use crate::services::ids::new_id;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/schools", get(list_schools).post(create_school))
        .route("/schools/:id", get(get_school).put(update_school).delete(delete_school))
        .route("/classes", get(list_classes))
}

async fn create_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SchoolRequest>,
) -> Result<(StatusCode, Json<WebResponse<SchoolResponse>>), ApiError> {
    authorize(&user, Capability::ManageSchools)?;
    validate_payload(&payload)?;

    let name = payload.name.trim();
    let taken = repositories::schools::name_taken(state.db(), name, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check school name"))?;
    if taken {
        return Err(ApiError::Conflict("School name already exists".to_string()));
    }

    let school = repositories::schools::create(
        state.db(),
        &new_id(),
        repositories::schools::SchoolFields {
            name,
            school_year: payload.school_year.trim(),
            logo: &payload.logo,
            address: &payload.address,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create school"))?;

    tracing::info!(school_id = %school.id, action = "school_create", "School created");

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("School created", SchoolResponse::from_db(school))),
    ))
}

async fn list_schools(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(search): Query<SearchQuery>,
) -> Result<Json<WebResponse<Paginated<SchoolResponse>>>, ApiError> {
    authorize(&user, Capability::ViewSchools)?;

    let page = Page::resolve(page, state.settings().course().max_page_size);
    let search = non_empty(search.q.as_deref());

    let schools = repositories::schools::list(state.db(), search, page.offset(), page.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list schools"))?;
    let total = repositories::schools::count(state.db(), search)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count schools"))?;

    Ok(Json(WebResponse::success(
        "Schools fetched",
        Paginated {
            items: schools.into_iter().map(SchoolResponse::from_db).collect(),
            pagination: page.describe(total),
        },
    )))
}

async fn get_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Json<WebResponse<SchoolResponse>>, ApiError> {
    authorize(&user, Capability::ViewSchools)?;

    let school = repositories::schools::find_by_id(state.db(), &school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?
        .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;

    Ok(Json(WebResponse::success("School fetched", SchoolResponse::from_db(school))))
}

async fn update_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(school_id): Path<String>,
    Json(payload): Json<SchoolRequest>,
) -> Result<Json<WebResponse<SchoolResponse>>, ApiError> {
    authorize(&user, Capability::ManageSchools)?;
    validate_payload(&payload)?;

    let name = payload.name.trim();
    let taken = repositories::schools::name_taken(state.db(), name, Some(&school_id))
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check school name"))?;
    if taken {
        return Err(ApiError::Conflict("School name already exists".to_string()));
    }

    let school = repositories::schools::update(
        state.db(),
        &school_id,
        repositories::schools::SchoolFields {
            name,
            school_year: payload.school_year.trim(),
            logo: &payload.logo,
            address: &payload.address,
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update school"))?
    .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;

    tracing::info!(school_id = %school.id, action = "school_update", "School updated");

    Ok(Json(WebResponse::success("School updated", SchoolResponse::from_db(school))))
}

async fn delete_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(school_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::ManageSchools)?;

    let deleted = repositories::schools::delete(state.db(), &school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete school"))?;
    if !deleted {
        return Err(ApiError::NotFound("School not found".to_string()));
    }

    tracing::info!(school_id = %school_id, action = "school_delete", "School deleted");

    Ok(Json(WebResponse::success("School deleted", ())))
}

/// Distinct class names of the caller's school (every school for SUPER_ADMIN).
async fn list_classes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(search): Query<SearchQuery>,
) -> Result<Json<WebResponse<Vec<String>>>, ApiError> {
    authorize(&user, Capability::ViewDirectory)?;

    let school_id = match user.role {
        UserRole::SuperAdmin => None,
        _ => repositories::schools::find_for_user(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?
            .map(|school| school.id),
    };

    let classes = repositories::active_students::distinct_classes(
        state.db(),
        school_id.as_deref(),
        non_empty(search.q.as_deref()),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list classes"))?;

    Ok(Json(WebResponse::success("Classes fetched", classes)))
}
