pub(crate) mod active_students;
pub(crate) mod admin_schools;
pub(crate) mod chapters;
pub(crate) mod complete_courses;
pub(crate) mod courses;
pub(crate) mod health;
pub(crate) mod materials;
pub(crate) mod progress;
pub(crate) mod quizzes;
pub(crate) mod schools;
pub(crate) mod students;
pub(crate) mod submission_students;
pub(crate) mod submission_templates;
pub(crate) mod teachers;
pub(crate) mod theories;
pub(crate) mod users;
