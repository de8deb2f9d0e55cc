pub(crate) mod auth;
pub(crate) mod chapters;
pub(crate) mod courses;
pub(crate) mod errors;
pub(crate) mod grades;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod materials;
pub(crate) mod pagination;
pub(crate) mod progress;
pub(crate) mod router;
pub(crate) mod schools;
pub(crate) mod storage;
pub(crate) mod submissions;
pub(crate) mod users;
pub(crate) mod validation;
