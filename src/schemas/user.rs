use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{ActiveStudent, AdminSchool, Student, Teacher};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct StudentRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub(crate) username: String,
    /// Required on create; keeps the current password on update when empty.
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "id_number must not be empty"))]
    #[serde(alias = "idNumber")]
    pub(crate) id_number: String,
    #[validate(length(min = 1, message = "school_id must not be empty"))]
    #[serde(alias = "schoolId")]
    pub(crate) school_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) username: String,
    pub(crate) school_id: String,
    pub(crate) name: String,
    pub(crate) id_number: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student, username: String) -> Self {
        Self {
            id: student.id,
            user_id: student.user_id,
            username,
            school_id: student.school_id,
            name: student.name,
            id_number: student.id_number,
            created_at: format_primitive(student.created_at),
            updated_at: format_primitive(student.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TeacherRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[serde(default, alias = "idNumber")]
    pub(crate) id_number: Option<String>,
    #[serde(default, alias = "schoolId")]
    pub(crate) school_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) username: String,
    pub(crate) school_id: Option<String>,
    pub(crate) name: String,
    pub(crate) id_number: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TeacherResponse {
    pub(crate) fn from_db(teacher: Teacher, username: String) -> Self {
        Self {
            id: teacher.id,
            user_id: teacher.user_id,
            username,
            school_id: teacher.school_id,
            name: teacher.name,
            id_number: teacher.id_number,
            created_at: format_primitive(teacher.created_at),
            updated_at: format_primitive(teacher.updated_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ActiveStudentRequest {
    #[validate(length(min = 1, message = "student_id must not be empty"))]
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    #[validate(length(min = 1, message = "school_year must not be empty"))]
    #[serde(alias = "schoolYear")]
    pub(crate) school_year: String,
    #[validate(length(min = 1, message = "class must not be empty"))]
    pub(crate) class: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ActiveStudentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) school_year: String,
    pub(crate) class: String,
    pub(crate) class_slug: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ActiveStudentResponse {
    pub(crate) fn from_db(active: ActiveStudent) -> Self {
        Self {
            id: active.id,
            student_id: active.student_id,
            school_year: active.school_year,
            class: active.class,
            class_slug: active.class_slug,
            created_at: format_primitive(active.created_at),
            updated_at: format_primitive(active.updated_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MemberListQuery {
    #[serde(default, alias = "schoolId")]
    pub(crate) school_id: Option<String>,
    #[serde(default)]
    pub(crate) q: Option<String>,
    #[serde(default)]
    pub(crate) class: Option<String>,
    #[serde(default, alias = "schoolYear")]
    pub(crate) school_year: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AdminSchoolRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub(crate) username: String,
    #[serde(default)]
    pub(crate) password: Option<String>,
    #[validate(length(min = 1, message = "school_id must not be empty"))]
    #[serde(alias = "schoolId")]
    pub(crate) school_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AdminSchoolResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) username: String,
    pub(crate) school_id: String,
    pub(crate) school_name: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AdminSchoolResponse {
    pub(crate) fn from_db(admin: AdminSchool) -> Self {
        Self {
            id: admin.id,
            user_id: admin.user_id,
            username: admin.username,
            school_id: admin.school_id,
            school_name: admin.school_name,
            created_at: format_primitive(admin.created_at),
            updated_at: format_primitive(admin.updated_at),
        }
    }
}
