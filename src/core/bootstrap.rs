use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::UserRole;
use crate::repositories;
use crate::repositories::users::{CreateUser, UpdateUser};
use crate::services::ids::new_id;

pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let username = &admin.first_superuser_username;
    let now = primitive_now_utc();

    if let Some(user) = repositories::users::find_by_username(state.db(), username).await? {
        let verified =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);
        let hashed_password = if verified {
            None
        } else {
            Some(security::hash_password(&admin.first_superuser_password)?)
        };
        let role = (user.role != UserRole::SuperAdmin).then_some(UserRole::SuperAdmin);
        let status = (!user.is_active()).then_some("ACTIVE");

        if hashed_password.is_none() && role.is_none() && status.is_none() {
            tracing::info!("Default superuser already up to date");
            return Ok(());
        }

        repositories::users::update(
            state.db(),
            &user.id,
            UpdateUser { username: None, hashed_password, role, status, updated_at: now },
        )
        .await?;
        tracing::info!(username = %username, "Updated default superuser");
        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;
    repositories::users::create(
        state.db(),
        CreateUser {
            id: &new_id(),
            username,
            hashed_password: &hashed_password,
            role: UserRole::SuperAdmin,
            status: "ACTIVE",
            now,
        },
    )
    .await?;

    tracing::info!(username = %username, "Created default superuser");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_superuser;
    use crate::db::types::UserRole;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn superuser_is_created_then_repaired() {
        let ctx = test_support::setup_test_context().await;
        std::env::set_var("FIRST_SUPERUSER_USERNAME", "root-admin");
        std::env::set_var("FIRST_SUPERUSER_PASSWORD", "bootstrap-pass");
        let settings = crate::core::config::Settings::load().expect("settings");
        std::env::remove_var("FIRST_SUPERUSER_USERNAME");
        std::env::remove_var("FIRST_SUPERUSER_PASSWORD");
        let state =
            crate::core::state::AppState::new(settings, ctx.state.db().clone(), None);

        ensure_superuser(&state).await.expect("create superuser");
        let user = repositories::users::find_by_username(state.db(), "root-admin")
            .await
            .expect("lookup")
            .expect("superuser");
        assert_eq!(user.role, UserRole::SuperAdmin);

        repositories::users::update(
            state.db(),
            &user.id,
            repositories::users::UpdateUser {
                username: None,
                hashed_password: None,
                role: Some(UserRole::Teacher),
                status: Some("INACTIVE"),
                updated_at: user.updated_at,
            },
        )
        .await
        .expect("demote");

        ensure_superuser(&state).await.expect("repair superuser");
        let repaired = repositories::users::find_by_username(state.db(), "root-admin")
            .await
            .expect("lookup")
            .expect("superuser");
        assert_eq!(repaired.role, UserRole::SuperAdmin);
        assert!(repaired.is_active());
        assert_eq!(repaired.id, user.id);
    }
}
