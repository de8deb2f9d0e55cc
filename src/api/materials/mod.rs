mod quizzes;
mod templates;
mod theories;

use axum::{
    routing::{get, post},
    Router,
};

use crate::api::courses::viewable_course;
use crate::api::errors::ApiError;
use crate::api::guards::owned_course;
use crate::core::state::AppState;
use crate::db::models::{Enrollment, Material, User};
use crate::db::types::{MaterialType, UserRole};
use crate::repositories;
use crate::schemas::course::NextEntry;
use crate::services::enrollment;
use crate::services::progression::CourseOutline;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/theories", post(theories::create_theory))
        .route(
            "/theories/:id",
            get(theories::get_theory).put(theories::update_theory).delete(theories::delete_theory),
        )
        .route("/submission", post(templates::create_template))
        .route(
            "/submission/:id",
            get(templates::get_template)
                .put(templates::update_template)
                .delete(templates::delete_template),
        )
        .route("/submission/detail/:id", get(templates::review_template))
        .route(
            "/quizz/:id",
            get(quizzes::get_quiz)
                .post(quizzes::create_quiz)
                .put(quizzes::update_quiz)
                .delete(quizzes::delete_quiz),
        )
        .route("/quizz/answer-student/:quiz_id", post(quizzes::answer_quiz))
}

/// Material of the given type; any other type reads as missing.
async fn find_material(
    state: &AppState,
    material_id: &str,
    material_type: MaterialType,
) -> Result<Material, ApiError> {
    repositories::materials::find_by_id(state.db(), material_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch material"))?
        .filter(|material| material.material_type == material_type)
        .ok_or_else(|| ApiError::NotFound("Material not found".to_string()))
}

async fn owned_material(
    state: &AppState,
    user: &User,
    material_id: &str,
    material_type: MaterialType,
) -> Result<Material, ApiError> {
    let material = find_material(state, material_id, material_type).await?;
    owned_course(state, user, &material.course_id).await?;
    Ok(material)
}

/// What a reader sees around one material: where to go next and, for a
/// student, their enrolment and whether the material is done.
struct Surroundings {
    next: Option<NextEntry>,
    student: Option<(Enrollment, bool)>,
}

async fn surroundings(
    state: &AppState,
    user: &User,
    material: &Material,
) -> Result<Surroundings, ApiError> {
    let course = viewable_course(state, user, &material.course_id).await?;
    let outline = CourseOutline::load(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course outline"))?;
    let next = outline.next_material(&material.id).map(NextEntry::from);

    if user.role != UserRole::Student {
        return Ok(Surroundings { next, student: None });
    }

    let enrollment = enrollment::for_user(state.db(), &user.id).await?;
    let completed =
        repositories::progress::completed_material_ids(state.db(), &enrollment.id, &course.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch progress"))?;
    let is_complete = completed.contains(&material.id);
    Ok(Surroundings { next, student: Some((enrollment, is_complete)) })
}

async fn delete_material(
    state: &AppState,
    user: &User,
    material_id: &str,
    material_type: MaterialType,
) -> Result<Material, ApiError> {
    let material = owned_material(state, user, material_id, material_type).await?;

    repositories::materials::delete(state.db(), &material.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete material"))?;

    tracing::info!(
        material_id = %material.id,
        course_id = %material.course_id,
        material_type = ?material.material_type,
        action = "material_delete",
        "Material deleted"
    );
    Ok(material)
}
