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

fn lock_flags(detail: &Value) -> Vec<(bool, bool)> {
    detail["data"]["chapters"]
        .as_array()
        .expect("chapters")
        .iter()
        .flat_map(|chapter| chapter["materials"].as_array().expect("materials").iter())
        .map(|material| {
            (
                material["is_complete"].as_bool().expect("is_complete"),
                material["is_lock"].as_bool().expect("is_lock"),
            )
        })
        .collect()
}

#[tokio::test]
async fn materials_unlock_in_reading_order_until_course_completes() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (_, profile) =
        test_support::insert_teacher(ctx.state.db(), "guru01", Some(&school.id)).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    let basics = test_support::insert_chapter(ctx.state.db(), &course.id, "Basics").await;
    let practice = test_support::insert_chapter(ctx.state.db(), &course.id, "Practice").await;
    let intro = test_support::insert_theory(ctx.state.db(), &basics, "Intro").await;
    let worksheet = test_support::insert_template(ctx.state.db(), &basics, "Worksheet").await;
    let recap = test_support::insert_theory(ctx.state.db(), &practice, "Recap").await;
    let detail_uri = format!("/api/v1/courses/detail/{}", course.id);

    let (status, body) = call(&ctx, Method::GET, &detail_uri, &student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(lock_flags(&body), vec![(false, false), (false, true), (false, true)]);
    assert_eq!(body["data"]["is_complete"], false);

    let finish = |material_id: &str| json!({"material_id": material_id, "course_id": course.id});

    let (status, body) =
        call(&ctx, Method::PUT, "/api/v1/progress", &student, Some(finish(&intro.id))).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(body["data"]["material_id"], intro.id.as_str());

    let (status, body) =
        call(&ctx, Method::PUT, "/api/v1/progress", &student, Some(finish(&intro.id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Student already finished this material");

    let (_, body) = call(&ctx, Method::GET, &detail_uri, &student, None).await;
    assert_eq!(lock_flags(&body), vec![(true, false), (false, false), (false, true)]);

    let complete = json!({"course_id": course.id});
    let (status, _) =
        call(&ctx, Method::PUT, "/api/v1/complete-course", &student, Some(complete.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for material in [&worksheet, &recap] {
        let (status, body) =
            call(&ctx, Method::PUT, "/api/v1/progress", &student, Some(finish(&material.id)))
                .await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
    }

    for _ in 0..2 {
        let (status, body) =
            call(&ctx, Method::PUT, "/api/v1/complete-course", &student, Some(complete.clone()))
                .await;
        assert_eq!(status, StatusCode::CREATED, "response: {body}");
        assert_eq!(body["data"]["course_id"], course.id.as_str());
    }
    let saved = completions_for(&ctx, &course.id).await;
    assert_eq!(saved, 1);

    let (status, body) =
        call(&ctx, Method::GET, "/api/v1/courses?is_complete=true", &student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["items"][0]["id"], course.id.as_str());
    assert_eq!(body["data"]["items"][0]["is_complete"], true);

    let (_, body) = call(&ctx, Method::GET, "/api/v1/courses?is_active=true", &student, None).await;
    assert_eq!(body["data"]["pagination"]["total_rows"], 0);
}

async fn completions_for(ctx: &TestContext, course_id: &str) -> i64 {
    crate::repositories::complete_courses::count_for_course(ctx.state.db(), course_id)
        .await
        .expect("count completions")
}

#[tokio::test]
async fn new_material_reopens_a_completed_course() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (teacher, profile) =
        test_support::insert_teacher(ctx.state.db(), "guru01", Some(&school.id)).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    let chapter = test_support::insert_chapter(ctx.state.db(), &course.id, "Basics").await;
    let intro = test_support::insert_theory(ctx.state.db(), &chapter, "Intro").await;

    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/progress",
        &student,
        Some(json!({"material_id": intro.id, "course_id": course.id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/complete-course",
        &student,
        Some(json!({"course_id": course.id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(completions_for(&ctx, &course.id).await, 1);

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/theories",
        &teacher,
        Some(json!({"chapter_id": chapter.id, "title": "Follow up", "content": "more"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(completions_for(&ctx, &course.id).await, 0);

    let (_, body) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/courses/detail/{}", course.id),
        &student,
        None,
    )
    .await;
    assert_eq!(body["data"]["is_complete"], false);
    assert_eq!(lock_flags(&body), vec![(true, false), (false, false)]);

    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/complete-course",
        &student,
        Some(json!({"course_id": course.id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn new_chapter_reopens_a_completed_course() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (teacher, profile) =
        test_support::insert_teacher(ctx.state.db(), "guru01", Some(&school.id)).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let course =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    let chapter = test_support::insert_chapter(ctx.state.db(), &course.id, "Basics").await;
    let intro = test_support::insert_theory(ctx.state.db(), &chapter, "Intro").await;

    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/progress",
        &student,
        Some(json!({"material_id": intro.id, "course_id": course.id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = call(
        &ctx,
        Method::PUT,
        "/api/v1/complete-course",
        &student,
        Some(json!({"course_id": course.id})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(completions_for(&ctx, &course.id).await, 1);

    let (status, body) = call(
        &ctx,
        Method::POST,
        "/api/v1/chapters",
        &teacher,
        Some(json!({"course_id": course.id, "title": "Practice"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    assert_eq!(completions_for(&ctx, &course.id).await, 0);

    let (_, body) = call(
        &ctx,
        Method::GET,
        &format!("/api/v1/courses/detail/{}", course.id),
        &student,
        None,
    )
    .await;
    assert_eq!(body["data"]["is_complete"], false);
}

#[tokio::test]
async fn progress_requires_material_of_the_course() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (_, profile) = test_support::insert_teacher(ctx.state.db(), "guru01", None).await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;
    let algebra =
        test_support::insert_course(ctx.state.db(), &profile.id, "Algebra", &["X IPA 1"]).await;
    let physics =
        test_support::insert_course(ctx.state.db(), &profile.id, "Physics", &["X IPA 1"]).await;
    let chapter = test_support::insert_chapter(ctx.state.db(), &physics.id, "Motion").await;
    let intro = test_support::insert_theory(ctx.state.db(), &chapter, "Intro").await;

    let (status, body) = call(
        &ctx,
        Method::PUT,
        "/api/v1/progress",
        &student,
        Some(json!({"material_id": intro.id, "course_id": algebra.id})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
}

#[tokio::test]
async fn class_labels_follow_the_school_year() {
    let ctx = test_support::setup_test_context().await;
    let school = test_support::insert_school(ctx.state.db(), "SMA 1", "2024/2025").await;
    let (student, _, _) =
        test_support::insert_student(ctx.state.db(), "siswa01", &school, "X IPA 1").await;

    let (status, body) = call(&ctx, Method::GET, "/api/v1/class/student", &student, None).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"][0]["label"], "Kelas X IPA 1 (2024/2025)");
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}
