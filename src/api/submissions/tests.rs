use crate::db::models::User;
use crate::test_support::{self, TestContext};
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

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
async fn submission_lifecycle_through_reject_reset_and_approve() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (teacher, profile) =
        test_support::insert_teacher(ctx.state.db(), "guru01", Some(&school.id)).await;
    let (student, student_profile, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    let chapter = test_support::insert_chapter(ctx.state.db(), &course.id, "Practice").await;
    let worksheet = test_support::insert_template(ctx.state.db(), &chapter, "Worksheet").await;

    let upload = json!({
        "material_id": worksheet.id,
        "course_id": course.id,
        "file_url": "https://files.example/ws-1.pdf",
        "description": "first try"
    });

    let (status, body) =
        call(&ctx, Method::POST, "/api/v1/submission-student", &student, Some(upload.clone()))
            .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["data"]["status"], "PENDING");
    assert_eq!(body["data"]["course_title"], "Algebra");
    assert_eq!(body["data"]["class"], "X IPA 1");
    let first_id = body["data"]["id"].as_str().expect("submission id").to_string();

    let (status, _) =
        call(&ctx, Method::POST, "/api/v1/submission-student", &student, Some(upload.clone()))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        call(&ctx, Method::GET, "/api/v1/submission-student", &teacher, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["status"], json!({"pending": 1, "rejected": 0, "approved": 0}));
    assert_eq!(body["data"]["submissions"][0]["student_name"], "siswa01");

    let (status, body) = call(
        &ctx,
        Method::PUT,
        &format!("/api/v1/submission-student/reject/{}", student_profile.id),
        &teacher,
        Some(json!({"submission_id": first_id, "comment": "Show your steps"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["status"], "REJECTED");
    assert_eq!(body["data"]["comment"], "Show your steps");

    let (status, _) = call(
        &ctx,
        Method::PUT,
        &format!("/api/v1/submission-student/approve/{}", student_profile.id),
        &teacher,
        Some(json!({"submission_id": first_id, "grade": 80})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        call(&ctx, Method::POST, "/api/v1/submission-student", &student, Some(upload.clone()))
            .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = call(
        &ctx,
        Method::PUT,
        "/api/v1/reset-submission",
        &student,
        Some(json!({"submitted_id": first_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");

    let (status, body) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/submission/{}", worksheet.id),
        &student,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert!(body["data"]["submitted"].is_null());
    assert_eq!(body["data"]["history"][0]["id"], first_id.as_str());

    let (status, body) =
        call(&ctx, Method::POST, "/api/v1/submission-student", &student, Some(upload)).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    let second_id = body["data"]["id"].as_str().expect("submission id").to_string();

    let (status, body) = call(
        &ctx,
        Method::PUT,
        &format!("/api/v1/submission-student/approve/{}", student_profile.id),
        &teacher,
        Some(json!({"submission_id": second_id, "grade": 90})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["status"], "APPROVED");
    assert_eq!(body["data"]["grade"], 90);

    let (status, body) =
        call(&ctx, Method::GET, "/api/v1/submission-student", &teacher, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["status"], json!({"pending": 0, "rejected": 0, "approved": 1}));

    let (status, body) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/submission-student/{}", student_profile.id),
        &teacher,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["id"], second_id.as_str());

    let (status, body) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/submission/detail/{}", worksheet.id),
        &teacher,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["submissions"].as_array().map(Vec::len), Some(1));

    let (status, body) =
        call(&ctx, Method::GET, "/api/v1/placeholder/submission-student", &teacher, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"][0]["title"], "Algebra");
    assert_eq!(body["data"][0]["materials"][0]["id"], worksheet.id.as_str());
}

#[tokio::test]
async fn attempts_stay_private_to_their_course_and_student() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (_, profile) =
        test_support::insert_teacher(ctx.state.db(), "guru01", Some(&school.id)).await;
    let (stranger, _) = test_support::insert_teacher(ctx.state.db(), "guru02", None).await;
    let (student, student_profile, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let (classmate, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa02", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    let chapter = test_support::insert_chapter(ctx.state.db(), &course.id, "Practice").await;
    let worksheet = test_support::insert_template(ctx.state.db(), &chapter, "Worksheet").await;
    let intro = test_support::insert_theory(ctx.state.db(), &chapter, "Intro").await;

    let (status, _) = call(
        &ctx,
        Method::POST,
        "/api/v1/submission-student",
        &student,
        Some(json!({
            "material_id": intro.id,
            "course_id": course.id,
            "file_url": "https://files.example/x.pdf"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/submission-student",
        &student,
        Some(json!({
            "material_id": worksheet.id,
            "course_id": course.id,
            "file_url": "https://files.example/x.pdf"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    let submission_id = body["data"]["id"].as_str().expect("submission id").to_string();
    let detail = format!("/api/v1/submission-student/detail/{submission_id}");

    let (status, _) = call(&ctx, Method::GET, &detail, &student, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&ctx, Method::GET, &detail, &classmate, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&ctx, Method::GET, &detail, &stranger, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &ctx,
        Method::PUT,
        &format!("/api/v1/submission-student/approve/{}", student_profile.id),
        &stranger,
        Some(json!({"submission_id": submission_id, "grade": 100})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/reset-submission",
        &student,
        Some(json!({"submitted_id": submission_id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
