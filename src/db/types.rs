use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "userrole", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum UserRole {
    SuperAdmin,
    Admin,
    Teacher,
    Student,
}

impl UserRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "SUPER_ADMIN",
            UserRole::Admin => "ADMIN",
            UserRole::Teacher => "TEACHER",
            UserRole::Student => "STUDENT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "materialtype", rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum MaterialType {
    Theory,
    Submission,
    Quiz,
}

/// Lifecycle of one student attempt at a SUBMISSION material.
///
/// `TeacherRejected` is a rejection with a comment that still counts as the
/// current attempt. `PendingAfterReset` marks an attempt the student reset so
/// it moves to history and a fresh attempt can be uploaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "submissionstatus")]
pub(crate) enum SubmissionStatus {
    #[serde(rename = "PENDING")]
    #[sqlx(rename = "PENDING")]
    Pending,
    #[serde(rename = "APPROVED")]
    #[sqlx(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REV_REJECT")]
    #[sqlx(rename = "REV_REJECT")]
    TeacherRejected,
    #[serde(rename = "REJECTED")]
    #[sqlx(rename = "REJECTED")]
    PendingAfterReset,
}

impl SubmissionStatus {
    pub(crate) fn as_db_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::TeacherRejected => "REV_REJECT",
            SubmissionStatus::PendingAfterReset => "REJECTED",
        }
    }

    /// Status shown to clients; both rejected variants read as `REJECTED`.
    pub(crate) fn display(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::TeacherRejected | SubmissionStatus::PendingAfterReset => "REJECTED",
        }
    }

    pub(crate) fn is_current(self) -> bool {
        !matches!(self, SubmissionStatus::PendingAfterReset)
    }

    pub(crate) fn is_rejected(self) -> bool {
        matches!(self, SubmissionStatus::TeacherRejected | SubmissionStatus::PendingAfterReset)
    }
}
