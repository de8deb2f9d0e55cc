use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::SubmissionStudent;
use crate::repositories::submission_students::SubmissionRow;
use crate::services::submission_flow::StatusCounts;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmissionStudentRequest {
    #[validate(length(min = 1, message = "material_id must not be empty"))]
    #[serde(alias = "materialId")]
    pub(crate) material_id: String,
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
    #[validate(length(min = 1, message = "file_url must not be empty"))]
    #[serde(alias = "fileUrl")]
    pub(crate) file_url: String,
    #[serde(default)]
    pub(crate) description: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionStudentResponse {
    pub(crate) id: String,
    pub(crate) material_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) material_title: Option<String>,
    pub(crate) course_id: String,
    pub(crate) course_title: String,
    pub(crate) teacher_id: String,
    pub(crate) active_student_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) student_name: Option<String>,
    /// Display status; both rejected variants read as `REJECTED`.
    pub(crate) status: &'static str,
    pub(crate) grade: Option<i32>,
    pub(crate) comment: Option<String>,
    pub(crate) file_url: String,
    pub(crate) description: String,
    pub(crate) class: String,
    pub(crate) school_year: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SubmissionStudentResponse {
    pub(crate) fn from_db(submission: SubmissionStudent) -> Self {
        Self {
            id: submission.id,
            material_id: submission.material_id,
            material_title: None,
            course_id: submission.course_id,
            course_title: submission.course_title,
            teacher_id: submission.teacher_id,
            active_student_id: submission.active_student_id,
            student_id: None,
            student_name: None,
            status: submission.status.display(),
            grade: submission.grade,
            comment: submission.comment,
            file_url: submission.file_url,
            description: submission.description,
            class: submission.class,
            school_year: submission.school_year,
            created_at: format_primitive(submission.created_at),
            updated_at: format_primitive(submission.updated_at),
        }
    }

    pub(crate) fn from_row(row: SubmissionRow) -> Self {
        Self {
            material_title: Some(row.material_title),
            student_id: Some(row.student_id),
            student_name: Some(row.student_name),
            ..Self::from_db(row.submission)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubmissionListQuery {
    #[serde(default, alias = "materialId")]
    pub(crate) material_id: Option<String>,
    #[serde(default)]
    pub(crate) class: Option<String>,
    #[serde(default, alias = "teacherId")]
    pub(crate) teacher_id: Option<String>,
    #[serde(default, alias = "courseId")]
    pub(crate) course_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionList {
    pub(crate) status: StatusCounts,
    pub(crate) submissions: Vec<SubmissionStudentResponse>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ApproveRequest {
    #[validate(length(min = 1, message = "submission_id must not be empty"))]
    #[serde(alias = "submissionId")]
    pub(crate) submission_id: String,
    #[validate(range(min = 0, max = 100, message = "grade must be within 0..100"))]
    pub(crate) grade: i32,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct RejectRequest {
    #[validate(length(min = 1, message = "submission_id must not be empty"))]
    #[serde(alias = "submissionId")]
    pub(crate) submission_id: String,
    #[validate(length(min = 1, message = "comment must not be empty"))]
    pub(crate) comment: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ResetRequest {
    #[validate(length(min = 1, message = "submitted_id must not be empty"))]
    #[serde(alias = "submittedId")]
    pub(crate) submitted_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdTitle {
    pub(crate) id: String,
    pub(crate) title: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionPlaceholder {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) materials: Vec<IdTitle>,
}
