use crate::core::time::primitive_now_utc;
use crate::db::types::SubmissionStatus;
use crate::repositories;
use crate::repositories::quizzes::{NewAnswer, NewQuestion};
use crate::services::ids::new_id;
use crate::test_support;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn grade_reports_for_student_and_teacher() {
    let ctx = test_support::setup_test_context().await;
    let db = ctx.state.db();
    let school = test_support::insert_school(db, "SMA 1", "2024/2025").await;
    let (teacher, profile) = test_support::insert_teacher(db, "guru01", Some(&school.id)).await;
    let (student, _, active) =
        test_support::insert_student(db, "siswa01", &school, "X IPA 1").await;
    let course = test_support::insert_course(db, &profile.id, "Algebra", &["X IPA 1"]).await;
    let chapter = test_support::insert_chapter(db, &course.id, "Practice").await;
    let worksheet = test_support::insert_template(db, &chapter, "Worksheet").await;
    let now = primitive_now_utc();

    let submission = repositories::submission_students::create(
        db,
        repositories::submission_students::CreateSubmission {
            id: &new_id(),
            material_id: &worksheet.id,
            course_id: &course.id,
            school_id: &school.id,
            teacher_id: &profile.id,
            active_student_id: &active.id,
            file_url: "https://files.example/ws.pdf",
            description: "",
            course_title: &course.title,
            class: &active.class,
            school_year: &active.school_year,
            now,
        },
    )
    .await
    .expect("create submission");
    repositories::submission_students::review(
        db,
        &submission.id,
        SubmissionStatus::Pending,
        repositories::submission_students::Review {
            status: SubmissionStatus::Approved,
            grade: Some(85),
            comment: None,
            teacher_id: &profile.id,
            now,
        },
    )
    .await
    .expect("review submission")
    .expect("reviewed");

    let questions = vec![NewQuestion {
        question: "1 + 1".to_string(),
        img_url: None,
        answers: vec![NewAnswer { answer: "2".to_string(), is_correct: true }],
    }];
    let (quiz_material, quiz) = repositories::quizzes::create(
        db,
        repositories::quizzes::CreateQuiz {
            material_id: &new_id(),
            chapter_id: &chapter.id,
            course_id: &course.id,
            title: "Warm up",
            slug: "warm-up",
            description: "",
            questions: &questions,
            now,
        },
    )
    .await
    .expect("create quiz");
    let question = repositories::quizzes::list_questions(db, &quiz.id)
        .await
        .expect("questions")
        .remove(0);
    let answer = repositories::quizzes::list_answers(db, &quiz.id)
        .await
        .expect("answers")
        .remove(0);
    repositories::quizzes::record_answer(
        db,
        repositories::quizzes::RecordAnswer {
            id: &new_id(),
            quiz_id: &quiz.id,
            quiz_question_id: &question.id,
            quiz_answer_id: &answer.id,
            active_student_id: &active.id,
            answered: 1,
            score: 1,
            grade: 100,
            now,
        },
    )
    .await
    .expect("record answer");

    let student_token = test_support::bearer_token(&student, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/grades-student",
            Some(&student_token),
            None,
        ))
        .await
        .expect("student grades");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["class"], json!(["X IPA 1"]));
    assert_eq!(body["data"]["school_year"], json!(["2024/2025"]));
    let grades = body["data"]["grades"].as_array().expect("grades");
    assert!(grades
        .iter()
        .any(|g| g["material_type"] == "SUBMISSION" && g["grade"] == 85));
    assert!(grades
        .iter()
        .any(|g| g["material_id"] == quiz_material.id.as_str() && g["grade"] == 100));

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/grades-student?class=XII%20IPS%202",
            Some(&student_token),
            None,
        ))
        .await
        .expect("filtered grades");
    let body = test_support::read_json(response).await;
    assert_eq!(body["data"]["count"], 0);

    let teacher_token = test_support::bearer_token(&teacher, ctx.state.settings());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/grades-teacher",
            Some(&teacher_token),
            None,
        ))
        .await
        .expect("teacher grades");
    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {body}");
    assert_eq!(body["data"]["students"][0]["name"], "siswa01");
    assert_eq!(body["data"]["students"][0]["average"], 85);
    assert_eq!(body["data"]["averages"][0]["material"], "Worksheet");
    assert_eq!(body["data"]["averages"][0]["average"], 85);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/grades-teacher",
            Some(&student_token),
            None,
        ))
        .await
        .expect("student on teacher grades");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
