pub(crate) mod access_policy;
pub(crate) mod enrollment;
pub(crate) mod grade_book;
pub(crate) mod ids;
pub(crate) mod progression;
pub(crate) mod quiz_scoring;
pub(crate) mod slug;
pub(crate) mod storage;
pub(crate) mod submission_flow;
