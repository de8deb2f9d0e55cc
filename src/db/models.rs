use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{MaterialType, SubmissionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) hashed_password: String,
    pub(crate) role: UserRole,
    pub(crate) status: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

impl User {
    pub(crate) fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("ACTIVE")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct School {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) school_year: String,
    pub(crate) logo: String,
    pub(crate) address: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct AdminSchool {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) school_id: String,
    pub(crate) username: String,
    pub(crate) school_name: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Teacher {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) school_id: Option<String>,
    pub(crate) name: String,
    pub(crate) id_number: Option<String>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Student {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) school_id: String,
    pub(crate) name: String,
    pub(crate) id_number: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct ActiveStudent {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) school_year: String,
    pub(crate) class: String,
    pub(crate) class_slug: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Enrolment joined with the owning student, the shape most handlers need.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct Enrollment {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) school_id: String,
    pub(crate) school_year: String,
    pub(crate) class: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Course {
    pub(crate) id: String,
    pub(crate) teacher_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) description: String,
    pub(crate) detail: String,
    pub(crate) estimation_hour: i32,
    pub(crate) estimation_minute: i32,
    pub(crate) thumbnail_img: String,
    pub(crate) is_draft: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CourseClass {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) class: String,
    pub(crate) slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Chapter {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) is_draft: bool,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Material {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) material_type: MaterialType,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Theory {
    pub(crate) id: String,
    pub(crate) material_id: String,
    pub(crate) content: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Assignment template attached to a SUBMISSION material.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubmissionTemplate {
    pub(crate) id: String,
    pub(crate) material_id: String,
    pub(crate) content: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubmissionStudent {
    pub(crate) id: String,
    pub(crate) material_id: String,
    pub(crate) course_id: String,
    pub(crate) school_id: String,
    pub(crate) teacher_id: String,
    pub(crate) active_student_id: String,
    pub(crate) status: SubmissionStatus,
    pub(crate) file_url: String,
    pub(crate) description: String,
    pub(crate) grade: Option<i32>,
    pub(crate) comment: Option<String>,
    pub(crate) course_title: String,
    pub(crate) class: String,
    pub(crate) school_year: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Progress {
    pub(crate) id: String,
    pub(crate) active_student_id: String,
    pub(crate) course_id: String,
    pub(crate) material_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct CompleteCourse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) active_student_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizQuestion {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) question: String,
    pub(crate) img_url: Option<String>,
    pub(crate) position: i32,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAnswer {
    pub(crate) id: String,
    pub(crate) quiz_question_id: String,
    pub(crate) answer: String,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAnswerStudent {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_question_id: String,
    pub(crate) quiz_answer_id: String,
    pub(crate) active_student_id: String,
    pub(crate) answered: i32,
    pub(crate) score: i32,
    pub(crate) grade: i32,
    pub(crate) created_at: PrimitiveDateTime,
}
