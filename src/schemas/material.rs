use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Material;
use crate::db::types::MaterialType;
use crate::schemas::course::NextEntry;
use crate::schemas::submission::SubmissionStudentResponse;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CreateMaterialRequest {
    #[validate(length(min = 1, message = "chapter_id must not be empty"))]
    #[serde(alias = "chapterId")]
    pub(crate) chapter_id: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UpdateMaterialRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) content: String,
}

/// A THEORY or SUBMISSION material with its body text. `id` is the material id.
#[derive(Debug, Serialize)]
pub(crate) struct MaterialContent {
    pub(crate) id: String,
    pub(crate) chapter_id: String,
    pub(crate) course_id: String,
    pub(crate) title: String,
    pub(crate) slug: String,
    pub(crate) material_type: MaterialType,
    pub(crate) position: i32,
    pub(crate) content: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl MaterialContent {
    pub(crate) fn from_db(material: Material, content: String) -> Self {
        Self {
            id: material.id,
            chapter_id: material.chapter_id,
            course_id: material.course_id,
            title: material.title,
            slug: material.slug,
            material_type: material.material_type,
            position: material.position,
            content,
            created_at: format_primitive(material.created_at),
            updated_at: format_primitive(material.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TheoryDetail {
    #[serde(flatten)]
    pub(crate) material: MaterialContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_complete: Option<bool>,
    pub(crate) next: Option<NextEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionTemplateDetail {
    #[serde(flatten)]
    pub(crate) material: MaterialContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_complete: Option<bool>,
    pub(crate) next: Option<NextEntry>,
    pub(crate) submitted: Option<SubmissionStudentResponse>,
    pub(crate) history: Vec<SubmissionStudentResponse>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionReviewDetail {
    #[serde(flatten)]
    pub(crate) material: MaterialContent,
    pub(crate) submissions: Vec<SubmissionStudentResponse>,
}
