use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::School;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SchoolRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub(crate) name: String,
    #[validate(length(min = 1, message = "school_year must not be empty"))]
    #[serde(alias = "schoolYear")]
    pub(crate) school_year: String,
    #[serde(default)]
    pub(crate) logo: String,
    #[serde(default)]
    pub(crate) address: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SchoolResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) school_year: String,
    pub(crate) logo: String,
    pub(crate) address: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl SchoolResponse {
    pub(crate) fn from_db(school: School) -> Self {
        Self {
            id: school.id,
            name: school.name,
            school_year: school.school_year,
            logo: school.logo,
            address: school.address,
            created_at: format_primitive(school.created_at),
            updated_at: format_primitive(school.updated_at),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchQuery {
    #[serde(default)]
    pub(crate) q: Option<String>,
}
