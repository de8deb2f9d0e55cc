use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{authorize, CurrentUser};
use crate::api::validation::{validate_password_len, validate_payload};
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::auth::{
    LoginRequest, LoginResponse, RegisterRequest, UserResponse, VerifyResponse,
};
use crate::schemas::WebResponse;
use crate::services::access_policy::Capability;
use crate::services::ids::new_id;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/verify", get(verify))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<WebResponse<LoginResponse>>, ApiError> {
    validate_payload(&payload)?;

    let user = repositories::users::find_by_username(state.db(), payload.username.trim())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?
        .ok_or(ApiError::Unauthorized("Incorrect username or password"))?;

    let verified = security::verify_password(&payload.password, &user.hashed_password)
        .map_err(|_| ApiError::Unauthorized("Incorrect username or password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Incorrect username or password"));
    }

    if !user.is_active() {
        return Err(ApiError::BadRequest("Inactive user".to_string()));
    }

    let token =
        security::create_access_token(&user.id, &user.username, user.role, state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    let name = display_name(&state, &user).await?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), action = "login", "User logged in");

    Ok(Json(WebResponse::success(
        "Login successful",
        LoginResponse { token, role: user.role, username: user.username, name },
    )))
}

async fn register(
    CurrentUser(current): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<WebResponse<UserResponse>>), ApiError> {
    authorize(&current, Capability::RegisterUser)?;
    validate_payload(&payload)?;
    validate_password_len(&payload.password)?;

    match payload.role {
        UserRole::Student => {
            return Err(ApiError::BadRequest(
                "Students are registered through the students endpoint".to_string(),
            ));
        }
        UserRole::SuperAdmin if current.role != UserRole::SuperAdmin => {
            return Err(ApiError::Unauthorized("You are not authorized to perform this action"));
        }
        _ => {}
    }

    let username = payload.username.trim();
    let taken = repositories::users::username_taken(state.db(), username, None)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check username"))?;
    if taken {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let hashed_password = security::hash_password(&payload.password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;
    let status = payload.status.as_deref().unwrap_or("ACTIVE").to_ascii_uppercase();
    let now = primitive_now_utc();

    let mut tx =
        state.db().begin().await.map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let user = repositories::users::create(
        &mut *tx,
        repositories::users::CreateUser {
            id: &new_id(),
            username,
            hashed_password: &hashed_password,
            role: payload.role,
            status: &status,
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    if user.role == UserRole::Teacher {
        let name = payload.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
        repositories::teachers::create(
            &mut *tx,
            &new_id(),
            &user.id,
            repositories::teachers::TeacherFields {
                school_id: None,
                name: name.unwrap_or(username),
                id_number: None,
            },
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create teacher"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit user"))?;

    tracing::info!(
        user_id = %user.id,
        role = user.role.as_str(),
        registered_by = %current.id,
        action = "user_register",
        "User registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(WebResponse::success("User registered", UserResponse::from_db(user))),
    ))
}

async fn verify(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<WebResponse<VerifyResponse>>, ApiError> {
    let name = display_name(&state, &user).await?;
    Ok(Json(WebResponse::success(
        "Token is valid",
        VerifyResponse { id: user.id, username: user.username, role: user.role, name },
    )))
}

/// Profile name for teachers and students, the username for everyone else.
async fn display_name(state: &AppState, user: &User) -> Result<String, ApiError> {
    let name = match user.role {
        UserRole::Teacher => repositories::teachers::find_by_user_id(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?
            .map(|teacher| teacher.name),
        UserRole::Student => repositories::students::find_by_user_id(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
            .map(|student| student.name),
        UserRole::SuperAdmin | UserRole::Admin => None,
    };
    Ok(name.unwrap_or_else(|| user.username.clone()))
}

#[cfg(test)]
mod tests;
