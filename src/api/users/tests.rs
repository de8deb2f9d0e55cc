use crate::db::types::UserRole;
use crate::repositories;
use crate::test_support;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn admin_creates_student_and_enrols_them() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let admin = test_support::insert_user(ctx.state.db(), "root", UserRole::SuperAdmin).await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let payload = json!({
        "username": "siswa01",
        "password": "siswa-pass",
        "name": "Budi",
        "id_number": "1001",
        "school_id": school.id
    });

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students",
            Some(&token),
            Some(payload.clone()),
        ))
        .await
        .expect("create student");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["data"]["username"], "siswa01");
    let student_id = body["data"]["id"].as_str().expect("student id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/students",
            Some(&token),
            Some(payload),
        ))
        .await
        .expect("duplicate student");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/active-students",
            Some(&token),
            Some(json!({"student_id": student_id, "school_year": "2024/2025", "class": "X IPA 1"})),
        ))
        .await
        .expect("enrol student");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["data"]["class_slug"], "x-ipa-1");

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/students?page=1&limit=5&q=Budi",
            Some(&token),
            None,
        ))
        .await
        .expect("list students");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["pagination"]["total_rows"], 1);
    assert_eq!(body["data"]["pagination"]["limit"], 5);
    assert_eq!(body["data"]["items"][0]["username"], "siswa01");
}

#[tokio::test]
async fn admin_sees_only_their_own_school() {
    let ctx = test_support::setup_test_context().await;
    let own = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let other = test_support::insert_school(ctx.state.db(), "SMA 2", "2024/2025").await;
    test_support::insert_student(ctx.state.db(), "siswa01", &own, "X IPA 1").await;
    let (_, foreign, _) =
        test_support::insert_student(ctx.state.db(), "siswa02", &other, "X IPA 2").await;

    let admin = test_support::insert_user(ctx.state.db(), "admin01", UserRole::Admin).await;
    repositories::admin_schools::create(
        ctx.state.db(),
        "admin-school-1",
        &admin.id,
        &own.id,
        crate::core::time::primitive_now_utc(),
    )
    .await
    .expect("bind admin");
    let token = test_support::bearer_token(&admin, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::GET, "/api/v1/students", Some(&token), None))
        .await
        .expect("list students");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["pagination"]["total_rows"], 1);
    assert_eq!(body["data"]["items"][0]["school_id"], own.id.as_str());

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/students/{}", foreign.id),
            Some(&token),
            None,
        ))
        .await
        .expect("get foreign student");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn teacher_with_courses_cannot_be_deleted() {
    let ctx = test_support::setup_test_context().await;
    let admin = test_support::insert_user(ctx.state.db(), "root", UserRole::SuperAdmin).await;
    let token = test_support::bearer_token(&admin, ctx.state.settings());
    let (_, teacher) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;
    test_support::insert_course(ctx.state.db(), &teacher.id, "Algebra", &["X IPA 1"]).await;

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/teachers/{}", teacher.id),
            Some(&token),
            None,
        ))
        .await
        .expect("delete teacher");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CONFLICT, "response: {body}");
}

#[tokio::test]
async fn super_admin_binds_admin_to_school() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let root = test_support::insert_user(ctx.state.db(), "root", UserRole::SuperAdmin).await;
    let token = test_support::bearer_token(&root, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/super-admin/admin-schools",
            Some(&token),
            Some(json!({"username": "admin01", "password": "admin-pass", "school_id": school.id})),
        ))
        .await
        .expect("create admin school");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["data"]["school_name"], "SMA 1");

    let admin = repositories::users::find_by_username(ctx.state.db(), "admin01")
        .await
        .expect("lookup")
        .expect("admin user");
    assert_eq!(admin.role, UserRole::Admin);

    let admin_token = test_support::bearer_token(&admin, ctx.state.settings());
    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/super-admin/admin-schools",
            Some(&admin_token),
            None,
        ))
        .await
        .expect("list as admin");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
