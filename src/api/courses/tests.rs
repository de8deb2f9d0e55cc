use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::models::User;
use crate::repositories;
use crate::test_support::{self, TestContext};

async fn call(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    user: &User,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let token = test_support::bearer_token(user, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(method, uri, Some(&token), body))
        .await
        .expect("request");
    let status = response.status();
    (status, test_support::read_json(response).await)
}

#[tokio::test]
async fn teacher_creates_updates_and_deletes_course() {
    let ctx = test_support::setup_test_context().await;
    let (teacher, profile) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/courses",
        &teacher,
        Some(json!({
            "title": "Aljabar Linear",
            "description": "Vectors and matrices",
            "estimation_hour": 2,
            "estimation_minute": 15,
            "classes": ["X IPA 1", "x ipa 1", "XI IPS 2", "  "]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    let course_id = body["data"]["id"].as_str().expect("course id").to_string();
    assert_eq!(body["data"]["slug"], "aljabar-linear");
    assert_eq!(body["data"]["teacher_id"], profile.id.as_str());
    assert_eq!(body["data"]["classes"].as_array().map(Vec::len), Some(2));
    assert_eq!(
        body["data"]["thumbnail_img"],
        ctx.state.settings().course().default_thumbnail_url.as_str()
    );

    let (status, body) = call(
        &ctx,
        Method::PUT,
        &format!("/api/v1/courses/{course_id}"),
        &teacher,
        Some(json!({"title": "Aljabar", "classes": ["XII IPA 3"], "is_draft": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["slug"], "aljabar");
    assert_eq!(body["data"]["is_draft"], true);
    assert_eq!(body["data"]["classes"][0]["slug"], "xii-ipa-3");

    let (status, body) =
        call(&ctx, Method::DELETE, &format!("/api/v1/courses/{course_id}"), &teacher, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let found = repositories::courses::find_by_id(ctx.state.db(), &course_id)
        .await
        .expect("find course after deletion");
    assert!(found.is_none());
}

#[tokio::test]
async fn course_validation_rejects_bad_estimates() {
    let ctx = test_support::setup_test_context().await;
    let (teacher, _) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/v1/courses",
        &teacher,
        Some(json!({"title": "Fisika", "estimation_minute": 75})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        call(&ctx, Method::POST, "/api/v1/courses", &teacher, Some(json!({"title": ""}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_teachers_and_students_cannot_manage_course() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (_, owner) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;
    let (intruder, _) = test_support::insert_teacher(ctx.state.db(), "guru02", None).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &owner.id, "Algebra", &["X IPA 1"]).await;
    let uri = format!("/api/v1/courses/{}", course.id);

    let (status, body) = call(&ctx, Method::DELETE, &uri, &intruder, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Course belongs to another teacher");

    let (status, _) = call(&ctx, Method::DELETE, &uri, &student, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let still_there = repositories::courses::find_by_id(ctx.state.db(), &course.id)
        .await
        .expect("find course");
    assert!(still_there.is_some());
}

#[tokio::test]
async fn listings_follow_role_and_filters() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (teacher, profile) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;
    let (_, other) = test_support::insert_teacher(ctx.state.db(), "guru02", None).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;

    let algebra =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    test_support::insert_course(ctx.state.db(), &profile.id, "Sociology", &["XI IPS 2"]).await;
    test_support::insert_course(ctx.state.db(), &other.id, "Biology", &["X IPA 1"]).await;
    test_support::insert_chapter(ctx.state.db(), &algebra.id, "Basics").await;

    let (status, body) = call(&ctx, Method::GET, "/api/v1/courses", &teacher, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["pagination"]["total_rows"], 2);
    assert!(body["data"]["items"][0].get("is_complete").is_none());

    let (_, body) =
        call(&ctx, Method::GET, "/api/v1/courses?class=X%20IPA%201", &teacher, None).await;
    assert_eq!(body["data"]["pagination"]["total_rows"], 1);
    assert_eq!(body["data"]["items"][0]["id"], algebra.id.as_str());
    assert_eq!(body["data"]["items"][0]["total_chapter"], 1);

    let (_, body) = call(&ctx, Method::GET, "/api/v1/courses?major=ips", &teacher, None).await;
    assert_eq!(body["data"]["pagination"]["total_rows"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Sociology");

    let (status, body) =
        call(&ctx, Method::GET, "/api/v1/courses?limit=1&page=2", &student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["pagination"]["total_rows"], 3);
    assert_eq!(body["data"]["pagination"]["total_pages"], 3);
    assert_eq!(body["data"]["pagination"]["current_page"], 2);
    assert_eq!(body["data"]["items"][0]["is_complete"], false);

    let (status, body) = call(
        &ctx,
        Method::GET,
        "/api/v1/courses?page=9223372036854775807",
        &student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(body["data"]["pagination"]["total_rows"], 3);
}

#[tokio::test]
async fn drafts_are_hidden_from_students() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (teacher, profile) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;

    let (status, _) = call(
        &ctx,
        Method::PUT,
        &format!("/api/v1/courses/{}", course.id),
        &teacher,
        Some(json!({"title": "Algebra", "is_draft": true, "classes": ["X IPA 1"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = call(&ctx, Method::GET, "/api/v1/courses", &student, None).await;
    assert_eq!(body["data"]["pagination"]["total_rows"], 0);

    let detail = format!("/api/v1/courses/detail/{}", course.id);
    let (status, _) = call(&ctx, Method::GET, &detail, &student, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&ctx, Method::GET, &detail, &teacher, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body["data"].get("is_complete").is_none());
}
