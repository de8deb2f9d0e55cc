use crate::db::types::UserRole;
use crate::repositories;
use crate::test_support;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn login_returns_token_and_profile_name() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/login",
            None,
            Some(json!({"username": "siswa01", "password": test_support::TEST_PASSWORD})),
        ))
        .await
        .expect("login");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["role"], "STUDENT");
    assert_eq!(body["data"]["name"], "siswa01");
    let token = body["data"]["token"].as_str().expect("token").to_string();

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/verify", Some(&token), None))
        .await
        .expect("verify");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["username"], "siswa01");
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let ctx = test_support::setup_test_context().await;
    test_support::insert_user(ctx.state.db(), "admin01", UserRole::Admin).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/login",
            None,
            Some(json!({"username": "admin01", "password": "wrong-password"})),
        ))
        .await
        .expect("login");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "response: {body}");
    assert_eq!(body["status"], "error");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn admin_registers_teacher_with_profile() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "admin01", UserRole::Admin).await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let payload = json!({
        "username": "guru01",
        "password": "guru-pass",
        "role": "TEACHER",
        "name": "Bu Sari"
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/register",
            Some(&token),
            Some(payload.clone()),
        ))
        .await
        .expect("register");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    let user_id = body["data"]["id"].as_str().expect("user id");

    let teacher = repositories::teachers::find_by_user_id(ctx.state.db(), user_id)
        .await
        .expect("teacher lookup")
        .expect("teacher row");
    assert_eq!(teacher.name, "Bu Sari");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/register",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("register again");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn register_requires_staff_role() {
    let ctx = test_support::setup_test_context().await;
    let (teacher_user, _) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;
    let token = test_support::bearer_token(&teacher_user, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/register",
            Some(&token),
            Some(json!({"username": "admin02", "password": "admin-pass", "role": "ADMIN"})),
        ))
        .await
        .expect("register");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "response: {body}");
    assert_eq!(body["message"], "You are not authorized to perform this action");

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/verify", None, None))
        .await
        .expect("verify");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
