use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::{Course, Teacher, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::access_policy::{self, Capability};

pub(crate) struct CurrentUser(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active() {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

pub(crate) fn authorize(user: &User, capability: Capability) -> Result<(), ApiError> {
    access_policy::authorize(user, capability).map_err(ApiError::from)
}

/// Teacher profile behind the caller's login.
pub(crate) async fn teacher_profile(state: &AppState, user: &User) -> Result<Teacher, ApiError> {
    repositories::teachers::find_by_user_id(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))
}

pub(crate) async fn find_course(state: &AppState, course_id: &str) -> Result<Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

/// Loads the course and checks that the calling teacher authored it.
pub(crate) async fn owned_course(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<(Teacher, Course), ApiError> {
    let teacher = teacher_profile(state, user).await?;
    let course = find_course(state, course_id).await?;

    if course.teacher_id != teacher.id {
        return Err(ApiError::Forbidden("Course belongs to another teacher"));
    }

    Ok((teacher, course))
}

/// School an ADMIN is bound to; `None` (no narrowing) for everyone else.
pub(crate) async fn admin_school_scope(
    state: &AppState,
    user: &User,
) -> Result<Option<String>, ApiError> {
    if user.role != UserRole::Admin {
        return Ok(None);
    }

    let school = repositories::schools::find_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?
        .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;
    Ok(Some(school.id))
}
