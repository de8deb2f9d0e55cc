use serde::Serialize;
use thiserror::Error;

use crate::db::models::SubmissionStudent;
use crate::db::types::SubmissionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transition {
    Approve,
    Reject,
    Reset,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum TransitionError {
    #[error("Submission has already been reviewed")]
    AlreadyReviewed,
    #[error("Only rejected submissions can be reset")]
    NotRejected,
}

/// Next status for a review or reset, or why the move is not allowed.
pub(crate) fn advance(
    from: SubmissionStatus,
    transition: Transition,
) -> Result<SubmissionStatus, TransitionError> {
    match (from, transition) {
        (SubmissionStatus::Pending, Transition::Approve) => Ok(SubmissionStatus::Approved),
        (SubmissionStatus::Pending, Transition::Reject) => Ok(SubmissionStatus::TeacherRejected),
        (_, Transition::Approve | Transition::Reject) => Err(TransitionError::AlreadyReviewed),
        (SubmissionStatus::TeacherRejected, Transition::Reset) => {
            Ok(SubmissionStatus::PendingAfterReset)
        }
        (_, Transition::Reset) => Err(TransitionError::NotRejected),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub(crate) struct StatusCounts {
    pub(crate) pending: i64,
    pub(crate) rejected: i64,
    pub(crate) approved: i64,
}

impl StatusCounts {
    pub(crate) fn tally(statuses: impl IntoIterator<Item = SubmissionStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            match status {
                SubmissionStatus::Pending => counts.pending += 1,
                SubmissionStatus::Approved => counts.approved += 1,
                SubmissionStatus::TeacherRejected | SubmissionStatus::PendingAfterReset => {
                    counts.rejected += 1
                }
            }
            counts
        })
    }
}

/// Splits one student's attempts at a material, newest first, into the
/// current attempt and the rejected history.
pub(crate) fn current_and_history(
    attempts: Vec<SubmissionStudent>,
) -> (Option<SubmissionStudent>, Vec<SubmissionStudent>) {
    let current = attempts.iter().find(|attempt| attempt.status.is_current()).cloned();
    let history = attempts.into_iter().filter(|attempt| attempt.status.is_rejected()).collect();
    (current, history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::time::primitive_now_utc;

    fn attempt(id: &str, status: SubmissionStatus) -> SubmissionStudent {
        let now = primitive_now_utc();
        SubmissionStudent {
            id: id.to_string(),
            material_id: "m2".to_string(),
            course_id: "c".to_string(),
            school_id: "s".to_string(),
            teacher_id: "t".to_string(),
            active_student_id: "a".to_string(),
            status,
            file_url: "https://files/x.pdf".to_string(),
            description: String::new(),
            grade: None,
            comment: None,
            course_title: "Algebra".to_string(),
            class: "X IPA 1".to_string(),
            school_year: "2025/2026".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn review_only_from_pending() {
        assert_eq!(advance(SubmissionStatus::Pending, Transition::Approve), Ok(SubmissionStatus::Approved));
        assert_eq!(
            advance(SubmissionStatus::Pending, Transition::Reject),
            Ok(SubmissionStatus::TeacherRejected)
        );
        assert_eq!(
            advance(SubmissionStatus::Approved, Transition::Reject),
            Err(TransitionError::AlreadyReviewed)
        );
        assert_eq!(
            advance(SubmissionStatus::PendingAfterReset, Transition::Approve),
            Err(TransitionError::AlreadyReviewed)
        );
    }

    #[test]
    fn reset_only_from_teacher_rejection() {
        assert_eq!(
            advance(SubmissionStatus::TeacherRejected, Transition::Reset),
            Ok(SubmissionStatus::PendingAfterReset)
        );
        assert_eq!(advance(SubmissionStatus::Pending, Transition::Reset), Err(TransitionError::NotRejected));
        assert_eq!(advance(SubmissionStatus::Approved, Transition::Reset), Err(TransitionError::NotRejected));
    }

    #[test]
    fn counts_fold_both_rejections() {
        let counts = StatusCounts::tally([
            SubmissionStatus::Pending,
            SubmissionStatus::TeacherRejected,
            SubmissionStatus::PendingAfterReset,
            SubmissionStatus::Approved,
            SubmissionStatus::Pending,
        ]);
        assert_eq!(counts, StatusCounts { pending: 2, rejected: 2, approved: 1 });
    }

    #[test]
    fn rejected_attempt_is_current_until_reset() {
        let (current, history) =
            current_and_history(vec![attempt("a1", SubmissionStatus::TeacherRejected)]);
        assert_eq!(current.map(|c| c.id), Some("a1".to_string()));
        assert_eq!(history.len(), 1);

        let (current, history) = current_and_history(vec![
            attempt("a2", SubmissionStatus::Pending),
            attempt("a1", SubmissionStatus::PendingAfterReset),
        ]);
        assert_eq!(current.map(|c| c.id), Some("a2".to_string()));
        assert_eq!(history.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["a1"]);
    }
}
