use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Chapter, Course, CourseClass, Material};
use crate::db::types::MaterialType;
use crate::services::progression::{MaterialState, NextMaterial};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: String,
    #[serde(default)]
    pub(crate) detail: String,
    #[validate(range(min = 0, message = "estimation_hour must not be negative"))]
    #[serde(default, alias = "estimationHour")]
    pub(crate) estimation_hour: i32,
    #[validate(range(min = 0, max = 59, message = "estimation_minute must be within 0..59"))]
    #[serde(default, alias = "estimationMinute")]
    pub(crate) estimation_minute: i32,
    #[serde(default, alias = "thumbnailImg")]
    pub(crate) thumbnail_img: String,
    #[serde(default, alias = "isDraft")]
    pub(crate) is_draft: bool,
    #[serde(default)]
    pub(crate) classes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CourseListQuery {
    #[serde(default)]
    pub(crate) class: Option<String>,
    #[serde(default)]
    pub(crate) major: Option<String>,
    #[serde(default)]
    pub(crate) is_complete: Option<bool>,
    #[serde(default)]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseClassResponse {
    pub(crate) id: String,
    pub(crate) class: String,
    pub(crate) slug: String,
}

impl From<CourseClass> for CourseClassResponse {
    fn from(value: CourseClass) -> Self {
        Self { id: value.id, class: value.class, slug: value.slug }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
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
    pub(crate) classes: Vec<CourseClassResponse>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course, classes: Vec<CourseClass>) -> Self {
        Self {
            id: course.id,
            teacher_id: course.teacher_id,
            title: course.title,
            slug: course.slug,
            description: course.description,
            detail: course.detail,
            estimation_hour: course.estimation_hour,
            estimation_minute: course.estimation_minute,
            thumbnail_img: course.thumbnail_img,
            is_draft: course.is_draft,
            classes: classes.into_iter().map(CourseClassResponse::from).collect(),
            created_at: format_primitive(course.created_at),
            updated_at: format_primitive(course.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseListEntry {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    pub(crate) total_chapter: i64,
    pub(crate) total_student: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_complete: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseDetail {
    #[serde(flatten)]
    pub(crate) course: CourseResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_complete: Option<bool>,
    pub(crate) chapters: Vec<ChapterDetail>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChapterDetail {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) is_draft: bool,
    pub(crate) position: i32,
    pub(crate) materials: Vec<MaterialEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct MaterialEntry {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) material_type: MaterialType,
    pub(crate) position: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_complete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_lock: Option<bool>,
}

impl MaterialEntry {
    pub(crate) fn from_db(material: &Material, state: Option<MaterialState>) -> Self {
        Self {
            id: material.id.clone(),
            chapter_id: material.chapter_id.clone(),
            title: material.title.clone(),
            slug: material.slug.clone(),
            material_type: material.material_type,
            position: material.position,
            is_complete: state.map(|s| s.is_complete),
            is_lock: state.map(|s| s.is_lock),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateChapterRequest {
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default, alias = "isDraft")]
    pub(crate) is_draft: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateChapterRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default, alias = "isDraft")]
    pub(crate) is_draft: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChapterResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) is_draft: bool,
    pub(crate) position: i32,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ChapterResponse {
    pub(crate) fn from_db(chapter: Chapter) -> Self {
        Self {
            id: chapter.id,
            course_id: chapter.course_id,
            title: chapter.title,
            slug: chapter.slug,
            is_draft: chapter.is_draft,
            position: chapter.position,
            created_at: format_primitive(chapter.created_at),
            updated_at: format_primitive(chapter.updated_at),
        }
    }
}

/// Navigation target shown under a material.
#[derive(Debug, Serialize)]
pub(crate) struct NextEntry {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) title: String,
    pub(crate) material_type: MaterialType,
    pub(crate) is_other_chapter: bool,
}

impl From<NextMaterial<'_>> for NextEntry {
    fn from(next: NextMaterial<'_>) -> Self {
        Self {
            id: next.material.id.clone(),
            chapter_id: next.material.chapter_id.clone(),
            title: next.material.title.clone(),
            material_type: next.material.material_type,
            is_other_chapter: next.is_other_chapter,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ProgressRequest {
    #[validate(length(min = 1, message = "material_id must not be empty"))]
    #[serde(alias = "materialId")]
    pub(crate) material_id: String,
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProgressResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) material_id: String,
    pub(crate) created_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CompleteCourseRequest {
    #[validate(length(min = 1, message = "course_id must not be empty"))]
    #[serde(alias = "courseId")]
    pub(crate) course_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteCourseResponse {
    pub(crate) course_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentClassEntry {
    pub(crate) id: String,
    pub(crate) class: String,
    pub(crate) school_year: String,
    pub(crate) label: String,
}
