use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::types::MaterialType;
use crate::repositories::quizzes::QuizGradeRow;
use crate::repositories::submission_students::SubmissionRow;
use crate::services::grade_book::{MaterialAverage, StudentGrades};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GradeQuery {
    #[serde(default)]
    pub(crate) class: Option<String>,
    #[serde(default, alias = "schoolYear")]
    pub(crate) school_year: Option<String>,
}

/// One graded piece of work on the student's report.
#[derive(Debug, Serialize)]
pub(crate) struct GradeEntry {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) course: String,
    pub(crate) material_id: String,
    pub(crate) material: String,
    pub(crate) material_type: MaterialType,
    pub(crate) grade: i32,
    pub(crate) date: String,
}

impl GradeEntry {
    pub(crate) fn from_submission(row: SubmissionRow, grade: i32) -> Self {
        Self {
            id: row.submission.id,
            course_id: row.submission.course_id,
            course: row.submission.course_title,
            material_id: row.submission.material_id,
            material: row.material_title,
            material_type: MaterialType::Submission,
            grade,
            date: format_primitive(row.submission.updated_at),
        }
    }

    pub(crate) fn from_quiz(row: QuizGradeRow) -> Self {
        Self {
            id: row.quiz_id.clone(),
            course_id: row.course_id,
            course: row.course_title,
            material_id: row.quiz_id,
            material: row.quiz_title,
            material_type: MaterialType::Quiz,
            grade: row.grade,
            date: format_primitive(row.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentGradeReport {
    pub(crate) grades: Vec<GradeEntry>,
    pub(crate) count: usize,
    pub(crate) class: Vec<String>,
    pub(crate) school_year: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherGradeReport {
    pub(crate) students: Vec<StudentGrades>,
    pub(crate) averages: Vec<MaterialAverage>,
    pub(crate) class: Vec<String>,
    pub(crate) school_year: Vec<String>,
}
