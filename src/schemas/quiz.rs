use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{Material, Quiz, QuizAnswer, QuizAnswerStudent, QuizQuestion};
use crate::repositories::quizzes::{NewAnswer, NewQuestion};
use crate::schemas::course::NextEntry;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[validate(nested)]
    #[serde(default)]
    pub(crate) questions: Vec<QuestionRequest>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionRequest {
    #[validate(length(min = 1, message = "question must not be empty"))]
    pub(crate) question: String,
    #[serde(default, alias = "imgUrl")]
    pub(crate) img_url: Option<String>,
    #[validate(length(min = 1, message = "every question needs answers"), nested)]
    pub(crate) answers: Vec<AnswerRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerRequest {
    #[validate(length(min = 1, message = "answer must not be empty"))]
    pub(crate) answer: String,
    #[serde(default, alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

impl QuestionRequest {
    pub(crate) fn has_correct_answer(&self) -> bool {
        self.answers.iter().any(|answer| answer.is_correct)
    }

    pub(crate) fn to_new(&self) -> NewQuestion {
        NewQuestion {
            question: self.question.trim().to_string(),
            img_url: self
                .img_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            answers: self
                .answers
                .iter()
                .map(|answer| NewAnswer {
                    answer: answer.answer.trim().to_string(),
                    is_correct: answer.is_correct,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) position: i32,
    pub(crate) questions: Vec<QuestionDetail>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionDetail {
    pub(crate) id: String,
    pub(crate) question: String,
    pub(crate) img_url: Option<String>,
    pub(crate) position: i32,
    pub(crate) answers: Vec<AnswerDetail>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerDetail {
    pub(crate) id: String,
    pub(crate) answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

impl QuizResponse {
    /// Nests answers under their questions. `reveal` controls whether the
    /// correct flags are included.
    pub(crate) fn assemble(
        material: Material,
        quiz: Quiz,
        questions: Vec<QuizQuestion>,
        answers: Vec<QuizAnswer>,
        reveal: bool,
    ) -> Self {
        let mut nested: Vec<QuestionDetail> = questions
            .into_iter()
            .map(|question| QuestionDetail {
                id: question.id,
                question: question.question,
                img_url: question.img_url,
                position: question.position,
                answers: Vec::new(),
            })
            .collect();

        for answer in answers {
            if let Some(question) =
                nested.iter_mut().find(|question| question.id == answer.quiz_question_id)
            {
                question.answers.push(AnswerDetail {
                    id: answer.id,
                    answer: answer.answer,
                    is_correct: reveal.then_some(answer.is_correct),
                });
            }
        }

        Self {
            id: material.id,
            chapter_id: material.chapter_id,
            course_id: material.course_id,
            title: quiz.title,
            slug: material.slug,
            description: quiz.description,
            position: material.position,
            questions: nested,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizDetail {
    #[serde(flatten)]
    pub(crate) quiz: QuizResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) grade: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) score: Option<i32>,
    pub(crate) next: Option<NextEntry>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizAnswerRequest {
    #[validate(length(min = 1, message = "answer must not be empty"), nested)]
    pub(crate) answer: Vec<AnswerChoice>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub(crate) struct AnswerChoice {
    #[validate(length(min = 1, message = "quiz_answer_id must not be empty"))]
    #[serde(alias = "quizAnswerId")]
    pub(crate) quiz_answer_id: String,
    #[validate(length(min = 1, message = "quizes_id must not be empty"))]
    #[serde(alias = "quizesId")]
    pub(crate) quizes_id: String,
}

/// One scored answer. `answer_correct` names the correct choice of the
/// question whether or not the student picked it.
#[derive(Debug, Serialize)]
pub(crate) struct AnswerResult {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) quizes_id: String,
    pub(crate) quiz: String,
    pub(crate) answer: String,
    pub(crate) answer_correct: Option<String>,
    pub(crate) is_correct: bool,
    pub(crate) score: i32,
    pub(crate) grade: i32,
}

impl AnswerResult {
    pub(crate) fn from_db(
        row: QuizAnswerStudent,
        question: String,
        answer: String,
        answer_correct: Option<String>,
        is_correct: bool,
    ) -> Self {
        Self {
            id: row.id,
            quiz_id: row.quiz_id,
            quizes_id: row.quiz_question_id,
            quiz: question,
            answer,
            answer_correct,
            is_correct,
            score: row.score,
            grade: row.grade,
        }
    }
}
