use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, teacher_profile, CurrentUser};
use crate::api::validation::non_empty;
use crate::core::state::AppState;
use crate::repositories;
use crate::repositories::submission_students::SubmissionFilter;
use crate::schemas::grade::{GradeEntry, GradeQuery, StudentGradeReport, TeacherGradeReport};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::enrollment;
use crate::services::grade_book;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/grades-student", get(student_grades))
        .route("/grades-teacher", get(teacher_grades))
}

/// Class names and school years a school has enrolments for.
async fn filter_options(
    state: &AppState,
    school_id: Option<&str>,
) -> Result<(Vec<String>, Vec<String>), ApiError> {
    let Some(school_id) = school_id else {
        return Ok((Vec::new(), Vec::new()));
    };

    let classes = repositories::active_students::distinct_classes(state.db(), Some(school_id), None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch classes"))?;
    let years = repositories::active_students::distinct_school_years(state.db(), school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school years"))?;
    Ok((classes, years))
}

async fn student_grades(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<GradeQuery>,
) -> Result<Json<WebResponse<StudentGradeReport>>, ApiError> {
    authorize(&user, Capability::ViewOwnGrades)?;
    let enrollment = enrollment::for_user(state.db(), &user.id).await?;

    let class = non_empty(query.class.as_deref());
    let school_year = non_empty(query.school_year.as_deref());

    let rows = repositories::submission_students::list(
        state.db(),
        &SubmissionFilter {
            active_student_id: Some(&enrollment.id),
            class,
            school_year,
            current_only: true,
            ..SubmissionFilter::default()
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch submission grades"))?;

    let mut grades: Vec<GradeEntry> = rows
        .into_iter()
        .filter_map(|row| {
            let grade = row.submission.grade?;
            Some(GradeEntry::from_submission(row, grade))
        })
        .collect();

    // Quiz answers belong to the enrolment, so they follow its class and year.
    let enrolment_matches = class.map_or(true, |class| class == enrollment.class)
        && school_year.map_or(true, |year| year == enrollment.school_year);
    if enrolment_matches {
        let quizzes = repositories::quizzes::latest_grades_for_student(state.db(), &enrollment.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch quiz grades"))?;
        grades.extend(quizzes.into_iter().map(GradeEntry::from_quiz));
    }

    let (class, school_year) = filter_options(&state, Some(&enrollment.school_id)).await?;
    Ok(Json(WebResponse::success(
        "Grades fetched",
        StudentGradeReport { count: grades.len(), grades, class, school_year },
    )))
}

async fn teacher_grades(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<GradeQuery>,
) -> Result<Json<WebResponse<TeacherGradeReport>>, ApiError> {
    authorize(&user, Capability::ViewClassGrades)?;
    let teacher = teacher_profile(&state, &user).await?;

    let rows = repositories::submission_students::list(
        state.db(),
        &SubmissionFilter {
            teacher_id: Some(&teacher.id),
            class: non_empty(query.class.as_deref()),
            school_year: non_empty(query.school_year.as_deref()),
            current_only: true,
            ..SubmissionFilter::default()
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch grades"))?;

    let (students, averages) = grade_book::summarize(rows);
    let (class, school_year) = filter_options(&state, teacher.school_id.as_deref()).await?;

    Ok(Json(WebResponse::success(
        "Grades fetched",
        TeacherGradeReport { students, averages, class, school_year },
    )))
}

#[cfg(test)]
mod tests;
