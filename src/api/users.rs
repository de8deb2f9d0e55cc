use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{admin_school_scope, authorize, CurrentUser};
use crate::api::pagination::{Page, PageQuery};
use crate::api::validation::{non_empty, validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db;
use crate::db::models::{Student, Teacher};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::user::{
    ActiveStudentRequest, ActiveStudentResponse, AdminSchoolRequest, AdminSchoolResponse,
    MemberListQuery, StudentRequest, StudentResponse, TeacherRequest, TeacherResponse,
};
use crate::schemas::{IdName, Paginated, WebResponse};
use crate::services::access_policy::Capability;
use crate::services::ids::new_id;
use crate::services::slug::slugify;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/students", get(list_students).post(create_student))
        .route("/students/:id", get(get_student).put(update_student).delete(delete_student))
        .route("/teachers", get(list_teachers).post(create_teacher))
        .route("/teachers/:id", get(get_teacher).put(update_teacher).delete(delete_teacher))
        .route("/placeholder/teachers", get(placeholder_teachers))
        .route("/active-students", get(list_active_students).post(create_active_student))
        .route(
            "/active-students/:id",
            get(get_active_student).put(update_active_student).delete(delete_active_student),
        )
        .route("/super-admin/admin-schools", get(list_admin_schools).post(create_admin_school))
        .route(
            "/super-admin/admin-schools/:id",
            get(get_admin_school).put(update_admin_school).delete(delete_admin_school),
        )
}

fn in_scope(scope: Option<&str>, school_id: Option<&str>) -> bool {
    match scope {
        Some(scope) => school_id == Some(scope),
        None => true,
    }
}

/// The school must exist and, for an ADMIN caller, be the admin's own school.
async fn check_school(
    state: &AppState,
    scope: Option<&str>,
    school_id: &str,
) -> Result<(), ApiError> {
    if !in_scope(scope, Some(school_id)) {
        return Err(ApiError::Forbidden("School belongs to another admin"));
    }

    repositories::schools::find_by_id(state.db(), school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?
        .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;
    Ok(())
}

async fn ensure_username_free(
    state: &AppState,
    username: &str,
    except_user_id: Option<&str>,
) -> Result<(), ApiError> {
    let taken = repositories::users::username_taken(state.db(), username, except_user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check username"))?;
    if taken {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    Ok(())
}

fn required_password(password: Option<&str>) -> Result<String, ApiError> {
    let password =
        password.ok_or_else(|| ApiError::BadRequest("password is required".to_string()))?;
    validate_password_len(password)?;
    security::hash_password(password).map_err(|e| ApiError::internal(e, "Failed to hash password"))
}

/// New hash when a non-empty password is supplied on update.
fn optional_password(password: Option<&str>) -> Result<Option<String>, ApiError> {
    match non_empty(password) {
        Some(password) => {
            validate_password_len(password)?;
            security::hash_password(password)
                .map(Some)
                .map_err(|e| ApiError::internal(e, "Failed to hash password"))
        }
        None => Ok(None),
    }
}

fn write_error(err: sqlx::Error, context: &str) -> ApiError {
    if db::is_unique_violation(&err) {
        return ApiError::Conflict("Duplicate value violates a unique constraint".to_string());
    }
    ApiError::internal(err, context)
}

async fn username_of(state: &AppState, user_id: &str) -> Result<String, ApiError> {
    repositories::users::find_by_id(state.db(), user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .map(|user| user.username)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn find_student(
    state: &AppState,
    scope: Option<&str>,
    student_id: &str,
) -> Result<Student, ApiError> {
    let student = repositories::students::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;
    if !in_scope(scope, Some(&student.school_id)) {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }
    Ok(student)
}

async fn find_teacher(
    state: &AppState,
    scope: Option<&str>,
    teacher_id: &str,
) -> Result<Teacher, ApiError> {
    let teacher = repositories::teachers::find_by_id(state.db(), teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;
    if !in_scope(scope, teacher.school_id.as_deref()) {
        return Err(ApiError::NotFound("Teacher not found".to_string()));
    }
    Ok(teacher)
}

async fn create_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<StudentRequest>,
) -> Result<(StatusCode, Json<WebResponse<StudentResponse>>), ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    validate_payload(&payload)?;
    let scope = admin_school_scope(&state, &user).await?;
    check_school(&state, scope.as_deref(), &payload.school_id).await?;

    let username = payload.username.trim();
    ensure_username_free(&state, username, None).await?;
    let id_number = payload.id_number.trim();
    let id_taken = repositories::students::id_number_taken(state.db(), id_number, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check id number"))?;
    if id_taken {
        return Err(ApiError::Conflict("ID number already exists".to_string()));
    }

    let hashed_password = required_password(payload.password.as_deref())?;
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let account = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &new_id(),
            username,
            hashed_password: &hashed_password,
            role: UserRole::Student,
            status: "ACTIVE",
            now,
        },
    )
    .await
    .map_err(|e| write_error(e, "Failed to create user"))?;
    let student = repositories::students::create(
        &mut *tx,
        &new_id(),
        &account.id,
        repositories::students::StudentFields {
            school_id: &payload.school_id,
            name: payload.name.trim(),
            id_number,
        },
        now,
    )
    .await
    .map_err(|e| write_error(e, "Failed to create student"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit student"))?;

    tracing::info!(
        student_id = %student.id,
        school_id = %student.school_id,
        action = "student_create",
        "Student created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Student created",
            StudentResponse::from_db(student, account.username),
        )),
    ))
}

async fn list_students(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(query): Query<MemberListQuery>,
) -> Result<Json<WebResponse<Paginated<StudentResponse>>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let page = Page::resolve(page, state.settings().course().max_page_size);

    let filter = repositories::students::StudentFilter {
        school_id: scope.as_deref().or(non_empty(query.school_id.as_deref())),
        search: non_empty(query.q.as_deref()),
    };
    let students = repositories::students::list(state.db(), &filter, page.offset(), page.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;
    let total = repositories::students::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count students"))?;

    let user_ids: Vec<String> = students.iter().map(|s| s.user_id.clone()).collect();
    let mut usernames = repositories::users::usernames(state.db(), &user_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch usernames"))?;

    let items = students
        .into_iter()
        .map(|student| {
            let username = usernames.remove(&student.user_id).unwrap_or_default();
            StudentResponse::from_db(student, username)
        })
        .collect();

    Ok(Json(WebResponse::success(
        "Students fetched",
        Paginated { items, pagination: page.describe(total) },
    )))
}

async fn get_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<WebResponse<StudentResponse>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let student = find_student(&state, scope.as_deref(), &student_id).await?;
    let username = username_of(&state, &student.user_id).await?;

    Ok(Json(WebResponse::success("Student fetched", StudentResponse::from_db(student, username))))
}

async fn update_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(payload): Json<StudentRequest>,
) -> Result<Json<WebResponse<StudentResponse>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    validate_payload(&payload)?;
    let scope = admin_school_scope(&state, &user).await?;
    let existing = find_student(&state, scope.as_deref(), &student_id).await?;
    check_school(&state, scope.as_deref(), &payload.school_id).await?;

    let username = payload.username.trim();
    ensure_username_free(&state, username, Some(&existing.user_id)).await?;
    let id_number = payload.id_number.trim();
    let id_taken =
        repositories::students::id_number_taken(state.db(), id_number, Some(&existing.id))
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check id number"))?;
    if id_taken {
        return Err(ApiError::Conflict("ID number already exists".to_string()));
    }

    let hashed_password = optional_password(payload.password.as_deref())?;
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::users::update(
        &mut *tx,
        &existing.user_id,
        repositories::users::UpdateUser {
            username: Some(username),
            hashed_password,
            role: None,
            status: None,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| write_error(e, "Failed to update user"))?;
    let student = repositories::students::update(
        &mut *tx,
        &existing.id,
        repositories::students::StudentFields {
            school_id: &payload.school_id,
            name: payload.name.trim(),
            id_number,
        },
        now,
    )
    .await
    .map_err(|e| write_error(e, "Failed to update student"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit student"))?;

    tracing::info!(student_id = %student.id, action = "student_update", "Student updated");

    Ok(Json(WebResponse::success(
        "Student updated",
        StudentResponse::from_db(student, username.to_string()),
    )))
}

/// Removes the login; the student profile and its enrolments go with it.
async fn delete_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let student = find_student(&state, scope.as_deref(), &student_id).await?;

    repositories::users::delete(state.db(), &student.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;

    tracing::info!(student_id = %student.id, action = "student_delete", "Student deleted");

    Ok(Json(WebResponse::success("Student deleted", ())))
}

async fn create_teacher(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<TeacherRequest>,
) -> Result<(StatusCode, Json<WebResponse<TeacherResponse>>), ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    validate_payload(&payload)?;
    let scope = admin_school_scope(&state, &user).await?;

    let school_id = non_empty(payload.school_id.as_deref()).or(scope.as_deref());
    if let Some(school_id) = school_id {
        check_school(&state, scope.as_deref(), school_id).await?;
    }

    let username = payload.username.trim();
    ensure_username_free(&state, username, None).await?;
    let id_number = non_empty(payload.id_number.as_deref());
    if let Some(id_number) = id_number {
        let taken = repositories::teachers::id_number_taken(state.db(), id_number, None)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check id number"))?;
        if taken {
            return Err(ApiError::Conflict("ID number already exists".to_string()));
        }
    }

    let hashed_password = required_password(payload.password.as_deref())?;
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let account = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &new_id(),
            username,
            hashed_password: &hashed_password,
            role: UserRole::Teacher,
            status: "ACTIVE",
            now,
        },
    )
    .await
    .map_err(|e| write_error(e, "Failed to create user"))?;
    let teacher = repositories::teachers::create(
        &mut *tx,
        &new_id(),
        &account.id,
        repositories::teachers::TeacherFields { school_id, name: payload.name.trim(), id_number },
        now,
    )
    .await
    .map_err(|e| write_error(e, "Failed to create teacher"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit teacher"))?;

    tracing::info!(teacher_id = %teacher.id, action = "teacher_create", "Teacher created");

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success(
            "Teacher created",
            TeacherResponse::from_db(teacher, account.username),
        )),
    ))
}

async fn list_teachers(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(query): Query<MemberListQuery>,
) -> Result<Json<WebResponse<Paginated<TeacherResponse>>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let page = Page::resolve(page, state.settings().course().max_page_size);

    let filter = repositories::teachers::TeacherFilter {
        school_id: scope.as_deref().or(non_empty(query.school_id.as_deref())),
        search: non_empty(query.q.as_deref()),
    };
    let teachers = repositories::teachers::list(state.db(), &filter, page.offset(), page.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;
    let total = repositories::teachers::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count teachers"))?;

    let user_ids: Vec<String> = teachers.iter().map(|t| t.user_id.clone()).collect();
    let mut usernames = repositories::users::usernames(state.db(), &user_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch usernames"))?;

    let items = teachers
        .into_iter()
        .map(|teacher| {
            let username = usernames.remove(&teacher.user_id).unwrap_or_default();
            TeacherResponse::from_db(teacher, username)
        })
        .collect();

    Ok(Json(WebResponse::success(
        "Teachers fetched",
        Paginated { items, pagination: page.describe(total) },
    )))
}

async fn get_teacher(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
) -> Result<Json<WebResponse<TeacherResponse>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let teacher = find_teacher(&state, scope.as_deref(), &teacher_id).await?;
    let username = username_of(&state, &teacher.user_id).await?;

    Ok(Json(WebResponse::success("Teacher fetched", TeacherResponse::from_db(teacher, username))))
}

async fn update_teacher(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
    Json(payload): Json<TeacherRequest>,
) -> Result<Json<WebResponse<TeacherResponse>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    validate_payload(&payload)?;
    let scope = admin_school_scope(&state, &user).await?;
    let existing = find_teacher(&state, scope.as_deref(), &teacher_id).await?;

    let school_id = non_empty(payload.school_id.as_deref()).or(scope.as_deref());
    if let Some(school_id) = school_id {
        check_school(&state, scope.as_deref(), school_id).await?;
    }

    let username = payload.username.trim();
    ensure_username_free(&state, username, Some(&existing.user_id)).await?;
    let id_number = non_empty(payload.id_number.as_deref());
    if let Some(id_number) = id_number {
        let taken =
            repositories::teachers::id_number_taken(state.db(), id_number, Some(&existing.id))
                .await
                .map_err(|e| ApiError::internal(e, "Failed to check id number"))?;
        if taken {
            return Err(ApiError::Conflict("ID number already exists".to_string()));
        }
    }

    let hashed_password = optional_password(payload.password.as_deref())?;
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::users::update(
        &mut *tx,
        &existing.user_id,
        repositories::users::UpdateUser {
            username: Some(username),
            hashed_password,
            role: None,
            status: None,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| write_error(e, "Failed to update user"))?;
    let teacher = repositories::teachers::update(
        &mut *tx,
        &existing.id,
        repositories::teachers::TeacherFields { school_id, name: payload.name.trim(), id_number },
        now,
    )
    .await
    .map_err(|e| write_error(e, "Failed to update teacher"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit teacher"))?;

    tracing::info!(teacher_id = %teacher.id, action = "teacher_update", "Teacher updated");

    Ok(Json(WebResponse::success(
        "Teacher updated",
        TeacherResponse::from_db(teacher, username.to_string()),
    )))
}

async fn delete_teacher(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(teacher_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let teacher = find_teacher(&state, scope.as_deref(), &teacher_id).await?;

    repositories::users::delete(state.db(), &teacher.user_id).await.map_err(|e| {
        if db::is_foreign_key_violation(&e) {
            ApiError::Conflict("Teacher still owns courses".to_string())
        } else {
            ApiError::internal(e, "Failed to delete teacher")
        }
    })?;

    tracing::info!(teacher_id = %teacher.id, action = "teacher_delete", "Teacher deleted");

    Ok(Json(WebResponse::success("Teacher deleted", ())))
}

async fn placeholder_teachers(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<WebResponse<Vec<IdName>>>, ApiError> {
    authorize(&user, Capability::ViewDirectory)?;

    let teachers = repositories::teachers::list_all(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;

    Ok(Json(WebResponse::success(
        "Teachers fetched",
        teachers.into_iter().map(|t| IdName { id: t.id, name: t.name }).collect(),
    )))
}

async fn create_active_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ActiveStudentRequest>,
) -> Result<(StatusCode, Json<WebResponse<ActiveStudentResponse>>), ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    validate_payload(&payload)?;
    let scope = admin_school_scope(&state, &user).await?;
    let student = find_student(&state, scope.as_deref(), &payload.student_id).await?;

    let class = payload.class.trim();
    let active = repositories::active_students::create(
        state.db(),
        &new_id(),
        repositories::active_students::ActiveStudentFields {
            student_id: &student.id,
            school_year: payload.school_year.trim(),
            class,
            class_slug: &slugify(class),
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create active student"))?;

    tracing::info!(
        active_student_id = %active.id,
        student_id = %student.id,
        action = "active_student_create",
        "Student enrolled"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("Active student created", ActiveStudentResponse::from_db(active))),
    ))
}

async fn list_active_students(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
    Query(query): Query<MemberListQuery>,
) -> Result<Json<WebResponse<Paginated<ActiveStudentResponse>>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;
    let page = Page::resolve(page, state.settings().course().max_page_size);

    let filter = repositories::active_students::ActiveStudentFilter {
        school_id: scope.as_deref().or(non_empty(query.school_id.as_deref())),
        class: non_empty(query.class.as_deref()),
        school_year: non_empty(query.school_year.as_deref()),
    };
    let rows =
        repositories::active_students::list(state.db(), &filter, page.offset(), page.limit)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list active students"))?;
    let total = repositories::active_students::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count active students"))?;

    Ok(Json(WebResponse::success(
        "Active students fetched",
        Paginated {
            items: rows.into_iter().map(ActiveStudentResponse::from_db).collect(),
            pagination: page.describe(total),
        },
    )))
}

async fn get_active_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(active_id): Path<String>,
) -> Result<Json<WebResponse<ActiveStudentResponse>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;

    let active = repositories::active_students::find_by_id(state.db(), &active_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch active student"))?
        .ok_or_else(|| ApiError::NotFound("Active student not found".to_string()))?;
    find_student(&state, scope.as_deref(), &active.student_id).await?;

    Ok(Json(WebResponse::success("Active student fetched", ActiveStudentResponse::from_db(active))))
}

async fn update_active_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(active_id): Path<String>,
    Json(payload): Json<ActiveStudentRequest>,
) -> Result<Json<WebResponse<ActiveStudentResponse>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    validate_payload(&payload)?;
    let scope = admin_school_scope(&state, &user).await?;
    let student = find_student(&state, scope.as_deref(), &payload.student_id).await?;

    let class = payload.class.trim();
    let active = repositories::active_students::update(
        state.db(),
        &active_id,
        repositories::active_students::ActiveStudentFields {
            student_id: &student.id,
            school_year: payload.school_year.trim(),
            class,
            class_slug: &slugify(class),
        },
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update active student"))?
    .ok_or_else(|| ApiError::NotFound("Active student not found".to_string()))?;

    tracing::info!(active_student_id = %active.id, action = "active_student_update", "Enrolment updated");

    Ok(Json(WebResponse::success("Active student updated", ActiveStudentResponse::from_db(active))))
}

async fn delete_active_student(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(active_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::ManageMembers)?;
    let scope = admin_school_scope(&state, &user).await?;

    let active = repositories::active_students::find_by_id(state.db(), &active_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch active student"))?
        .ok_or_else(|| ApiError::NotFound("Active student not found".to_string()))?;
    find_student(&state, scope.as_deref(), &active.student_id).await?;

    repositories::active_students::delete(state.db(), &active.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete active student"))?;

    tracing::info!(active_student_id = %active.id, action = "active_student_delete", "Enrolment deleted");

    Ok(Json(WebResponse::success("Active student deleted", ())))
}

async fn create_admin_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AdminSchoolRequest>,
) -> Result<(StatusCode, Json<WebResponse<AdminSchoolResponse>>), ApiError> {
    authorize(&user, Capability::ManageSchoolAdmins)?;
    validate_payload(&payload)?;
    check_school(&state, None, &payload.school_id).await?;

    let username = payload.username.trim();
    ensure_username_free(&state, username, None).await?;
    let hashed_password = required_password(payload.password.as_deref())?;
    let now = primitive_now_utc();
    let admin_id = new_id();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    let account = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &new_id(),
            username,
            hashed_password: &hashed_password,
            role: UserRole::Admin,
            status: "ACTIVE",
            now,
        },
    )
    .await
    .map_err(|e| write_error(e, "Failed to create user"))?;
    repositories::admin_schools::create(&mut *tx, &admin_id, &account.id, &payload.school_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create school admin"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit school admin"))?;

    let admin = repositories::admin_schools::find_by_id(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school admin"))?
        .ok_or_else(|| ApiError::NotFound("School admin not found".to_string()))?;

    tracing::info!(
        admin_school_id = %admin.id,
        school_id = %admin.school_id,
        action = "admin_school_create",
        "School admin created"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("School admin created", AdminSchoolResponse::from_db(admin))),
    ))
}

async fn list_admin_schools(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> Result<Json<WebResponse<Paginated<AdminSchoolResponse>>>, ApiError> {
    authorize(&user, Capability::ManageSchoolAdmins)?;
    let page = Page::resolve(page, state.settings().course().max_page_size);

    let admins = repositories::admin_schools::list(state.db(), page.offset(), page.limit)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list school admins"))?;
    let total = repositories::admin_schools::count(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count school admins"))?;

    Ok(Json(WebResponse::success(
        "School admins fetched",
        Paginated {
            items: admins.into_iter().map(AdminSchoolResponse::from_db).collect(),
            pagination: page.describe(total),
        },
    )))
}

async fn get_admin_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(admin_id): Path<String>,
) -> Result<Json<WebResponse<AdminSchoolResponse>>, ApiError> {
    authorize(&user, Capability::ManageSchoolAdmins)?;

    let admin = repositories::admin_schools::find_by_id(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school admin"))?
        .ok_or_else(|| ApiError::NotFound("School admin not found".to_string()))?;

    Ok(Json(WebResponse::success("School admin fetched", AdminSchoolResponse::from_db(admin))))
}

async fn update_admin_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(admin_id): Path<String>,
    Json(payload): Json<AdminSchoolRequest>,
) -> Result<Json<WebResponse<AdminSchoolResponse>>, ApiError> {
    authorize(&user, Capability::ManageSchoolAdmins)?;
    validate_payload(&payload)?;

    let existing = repositories::admin_schools::find_by_id(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school admin"))?
        .ok_or_else(|| ApiError::NotFound("School admin not found".to_string()))?;
    check_school(&state, None, &payload.school_id).await?;

    let username = payload.username.trim();
    ensure_username_free(&state, username, Some(&existing.user_id)).await?;
    let hashed_password = optional_password(payload.password.as_deref())?;
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
    repositories::users::update(
        &mut *tx,
        &existing.user_id,
        repositories::users::UpdateUser {
            username: Some(username),
            hashed_password,
            role: None,
            status: None,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| write_error(e, "Failed to update user"))?;
    repositories::admin_schools::update_school(&mut *tx, &existing.id, &payload.school_id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update school admin"))?;
    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit school admin"))?;

    let admin = repositories::admin_schools::find_by_id(state.db(), &existing.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school admin"))?
        .ok_or_else(|| ApiError::NotFound("School admin not found".to_string()))?;

    tracing::info!(admin_school_id = %admin.id, action = "admin_school_update", "School admin updated");

    Ok(Json(WebResponse::success("School admin updated", AdminSchoolResponse::from_db(admin))))
}

async fn delete_admin_school(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(admin_id): Path<String>,
) -> Result<Json<WebResponse<()>>, ApiError> {
    authorize(&user, Capability::ManageSchoolAdmins)?;

    let admin = repositories::admin_schools::find_by_id(state.db(), &admin_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school admin"))?
        .ok_or_else(|| ApiError::NotFound("School admin not found".to_string()))?;

    repositories::users::delete(state.db(), &admin.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete school admin"))?;

    tracing::info!(admin_school_id = %admin.id, action = "admin_school_delete", "School admin deleted");

    Ok(Json(WebResponse::success("School admin deleted", ())))
}

#[cfg(test)]
mod tests;
