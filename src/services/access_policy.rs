use thiserror::Error;

use crate::db::models::User;
use crate::db::types::UserRole;

/// Every role-guarded operation of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Capability {
    RegisterUser,
    ManageSchools,
    ViewSchools,
    ManageMembers,
    ManageSchoolAdmins,
    ViewDirectory,
    AuthorCourse,
    BrowseCourses,
    TrackProgress,
    SubmitWork,
    ReviewSubmissions,
    ViewSubmissions,
    AnswerQuiz,
    ViewOwnGrades,
    ViewClassGrades,
    UploadFile,
}

const STAFF: &[UserRole] = &[UserRole::SuperAdmin, UserRole::Admin];
const EVERYONE: &[UserRole] =
    &[UserRole::SuperAdmin, UserRole::Admin, UserRole::Teacher, UserRole::Student];

impl Capability {
    pub(crate) fn permitted_roles(self) -> &'static [UserRole] {
        match self {
            Capability::RegisterUser | Capability::ViewSchools | Capability::ManageMembers => STAFF,
            Capability::ManageSchools | Capability::ManageSchoolAdmins => &[UserRole::SuperAdmin],
            Capability::ViewDirectory | Capability::UploadFile => EVERYONE,
            Capability::AuthorCourse
            | Capability::ReviewSubmissions
            | Capability::ViewClassGrades => &[UserRole::Teacher],
            Capability::BrowseCourses | Capability::ViewSubmissions => {
                &[UserRole::Teacher, UserRole::Student]
            }
            Capability::TrackProgress
            | Capability::SubmitWork
            | Capability::AnswerQuiz
            | Capability::ViewOwnGrades => &[UserRole::Student],
        }
    }

    pub(crate) fn allows(self, role: UserRole) -> bool {
        self.permitted_roles().contains(&role)
    }
}

#[derive(Debug, Error)]
#[error("You are not authorized to perform this action")]
pub(crate) struct NotAuthorized;

pub(crate) fn authorize(user: &User, capability: Capability) -> Result<(), NotAuthorized> {
    if capability.allows(user.role) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %user.id,
            role = user.role.as_str(),
            capability = ?capability,
            "Capability denied"
        );
        Err(NotAuthorized)
    }
}
