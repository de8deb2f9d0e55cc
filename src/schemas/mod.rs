use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod auth;
pub(crate) mod course;
pub(crate) mod grade;
pub(crate) mod material;
pub(crate) mod quiz;
pub(crate) mod school;
pub(crate) mod submission;
pub(crate) mod user;

/// Body of every API response.
#[derive(Debug, Serialize)]
pub(crate) struct WebResponse<T> {
    pub(crate) status: &'static str,
    pub(crate) message: String,
    pub(crate) data: Option<T>,
}

impl<T> WebResponse<T> {
    pub(crate) fn success(message: impl Into<String>, data: T) -> Self {
        Self { status: "success", message: message.into(), data: Some(data) }
    }

    pub(crate) fn error(message: impl Into<String>) -> Self {
        Self { status: "error", message: message.into(), data: None }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Paginated<T> {
    pub(crate) items: Vec<T>,
    pub(crate) pagination: crate::api::pagination::Pagination,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct IdName {
    pub(crate) id: String,
    pub(crate) name: String,
}
