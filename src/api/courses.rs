use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, find_course, owned_course, teacher_profile, CurrentUser};
use crate::api::pagination::{Page, PageQuery};
use crate::api::validation::{non_empty, validate_payload};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::course::{
    ChapterDetail, CourseDetail, CourseListEntry, CourseListQuery, CourseRequest, CourseResponse,
    MaterialEntry,
};
use crate::schemas::{Paginated, WebResponse};
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::ids::new_id;
use crate::services::progression::CourseOutline;
use crate::services::slug::slugify;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses).post(create_course))
        .route("/courses/detail/:id", get(course_detail))
        .route("/courses/:id", put(update_course).delete(delete_course))
}

/// One class entry per distinct slug, in request order.
fn class_entries(classes: &[String]) -> Vec<repositories::courses::ClassEntry> {
    let mut seen = HashSet::new();
    classes
        .iter()
        .map(|class| class.trim())
        .filter(|class| !class.is_empty())
        .filter_map(|class| {
            let slug = slugify(class);
            seen.insert(slug.clone()).then(|| repositories::courses::ClassEntry {
                id: new_id(),
                class: class.to_string(),
                slug,
            })
        })
        .collect()
}

fn course_fields<'a>(
    payload: &'a CourseRequest,
    slug: &'a str,
    default_thumbnail: &'a str,
) -> repositories::courses::CourseFields<'a> {
    let thumbnail = payload.thumbnail_img.trim();
    repositories::courses::CourseFields {
        title: payload.title.trim(),
        slug,
        description: &payload.description,
        detail: &payload.detail,
        estimation_hour: payload.estimation_hour,
        estimation_minute: payload.estimation_minute,
        thumbnail_img: if thumbnail.is_empty() { default_thumbnail } else { thumbnail },
        is_draft: payload.is_draft,
    }
}

async fn classes_of(
    state: &AppState,
    course_id: &str,
) -> Result<Vec<crate::db::models::CourseClass>, ApiError> {
    let mut classes = repositories::courses::list_classes(state.db(), &[course_id.to_string()])
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course classes"))?;
    Ok(classes.remove(course_id).unwrap_or_default())
}

async fn create_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<CourseRequest>,
) -> Result<(StatusCode, Json<WebResponse<CourseResponse>>), ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let teacher = teacher_profile(&state, &user).await?;

    let slug = slugify(&payload.title);
    let classes = class_entries(&payload.classes);
    let course = repositories::courses::create(
        state.db(),
        &new_id(),
        &teacher.id,
        course_fields(&payload, &slug, &state.settings().course().default_thumbnail_url),
        &classes,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(
        course_id = %course.id,
        teacher_id = %teacher.id,
        classes = classes.len(),
        action = "course_create",
        "Course created"
    );

    let classes = classes_of(&state, &course.id).await?;
    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("Course created", CourseResponse::from_db(course, classes))),
    ))
}

async fn list_courses(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(query): Query<CourseListQuery>,
) -> Result<Json<WebResponse<Paginated<CourseListEntry>>>, ApiError> {
    authorize(&user, Capability::BrowseCourses)?;
    let page = Page::resolve(page, state.settings().course().max_page_size);

    let class_slug = non_empty(query.class.as_deref()).map(slugify);
    let major = non_empty(query.major.as_deref()).map(slugify);

    let (teacher_id, enrollment) = match user.role {
        UserRole::Teacher => (Some(teacher_profile(&state, &user).await?.id), None),
        _ => (None, Some(enrollment::for_user(state.db(), &user.id).await?)),
    };

    // `is_complete` wins over `is_active` when both are sent.
    let completed = match (query.is_complete, query.is_active) {
        (Some(true), _) => Some(true),
        (_, Some(true)) => Some(false),
        _ => None,
    };

    let filter = repositories::courses::CourseFilter {
        teacher_id: teacher_id.as_deref(),
        published_only: enrollment.is_some(),
        class_slug: class_slug.as_deref(),
        major: major.as_deref(),
        completed_by: enrollment.as_ref().map(|e| e.id.as_str()),
        completed,
    };

    let courses = repositories::courses::list(state.db(), &filter, page.offset(), page.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;
    let total = repositories::courses::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count courses"))?;

    let ids: Vec<String> = courses.iter().map(|course| course.id.clone()).collect();
    let mut classes = repositories::courses::list_classes(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course classes"))?;
    let chapters = repositories::courses::chapter_counts(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count chapters"))?;
    let students = repositories::courses::student_counts(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;
    let completed_ids = match &enrollment {
        Some(enrollment) => Some(
            repositories::complete_courses::completed_course_ids(state.db(), &enrollment.id, &ids)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch completed courses"))?,
        ),
        None => None,
    };

    let items = courses
        .into_iter()
        .map(|course| {
            let id = course.id.clone();
            CourseListEntry {
                total_chapter: chapters.get(&id).copied().unwrap_or(0),
                total_student: students.get(&id).copied().unwrap_or(0),
                is_complete: completed_ids.as_ref().map(|done| done.contains(&id)),
                course: CourseResponse::from_db(course, classes.remove(&id).unwrap_or_default()),
            }
        })
        .collect();

    Ok(Json(WebResponse::success(
        "Courses fetched",
        Paginated { items, pagination: page.describe(total) },
    )))
}

async fn course_detail(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<WebResponse<CourseDetail>>, ApiError> {
    authorize(&user, Capability::BrowseCourses)?;

    let course = viewable_course(&state, &user, &course_id).await?;
    let outline = CourseOutline::load(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course outline"))?;

    let (states, is_complete) = if user.role == UserRole::Student {
        let enrollment = enrollment::for_user(state.db(), &user.id).await?;
        let completed =
            repositories::progress::completed_material_ids(state.db(), &enrollment.id, &course.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch progress"))?;
        let saved = repositories::complete_courses::find(state.db(), &enrollment.id, &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch course completion"))?;
        (Some(outline.material_states(&completed)), Some(saved.is_some()))
    } else {
        (None, None)
    };

    let chapters = outline
        .chapters
        .iter()
        .map(|entry| ChapterDetail {
            id: entry.chapter.id.clone(),
            title: entry.chapter.title.clone(),
            slug: entry.chapter.slug.clone(),
            is_draft: entry.chapter.is_draft,
            position: entry.chapter.position,
            materials: entry
                .materials
                .iter()
                .map(|material| {
                    let state = states.as_ref().and_then(|s| s.get(&material.id).copied());
                    MaterialEntry::from_db(material, state)
                })
                .collect(),
        })
        .collect();

    let classes = classes_of(&state, &course.id).await?;
    Ok(Json(WebResponse::success(
        "Course fetched",
        CourseDetail { course: CourseResponse::from_db(course, classes), is_complete, chapters },
    )))
}

/// Teachers see their own courses; students see published ones.
pub(crate) async fn viewable_course(
    state: &AppState,
    user: &User,
    course_id: &str,
) -> Result<crate::db::models::Course, ApiError> {
    if user.role == UserRole::Teacher {
        let (_, course) = owned_course(state, user, course_id).await?;
        return Ok(course);
    }

    let course = find_course(state, course_id).await?;
    if course.is_draft {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }
    Ok(course)
}

async fn update_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<CourseRequest>,
) -> Result<Json<WebResponse<CourseResponse>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    validate_payload(&payload)?;
    let (_, existing) = owned_course(&state, &user, &course_id).await?;

    let slug = slugify(&payload.title);
    let classes = class_entries(&payload.classes);
    let course = repositories::courses::update(
        state.db(),
        &existing.id,
        course_fields(&payload, &slug, &state.settings().course().default_thumbnail_url),
        &classes,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?;

    tracing::info!(course_id = %course.id, action = "course_update", "Course updated");

    let classes = classes_of(&state, &course.id).await?;
    Ok(Json(WebResponse::success("Course updated", CourseResponse::from_db(course, classes))))
}

async fn delete_course(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::AuthorCourse)?;
    let (_, course) = owned_course(&state, &user, &course_id).await?;

    repositories::courses::delete(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete course"))?;

    tracing::info!(course_id = %course.id, action = "course_delete", "Course deleted");

    Ok(Json(WebResponse::success("Course deleted", ())))
}

#[cfg(test)]
mod tests;
