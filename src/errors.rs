use thiserror::Error;

pub type Result<T> = std::result::Result<T, GradeError>;

/// Every way a grading request can fail.
///
/// All of these are ordinary values handed back inside a [`Verdict`]; none of
/// them is allowed to escape the dispatcher as a panic.
///
/// [`Verdict`]: crate::Verdict
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GradeError {
    #[error("forbidden global referenced: {0}")]
    ForbiddenGlobal(String),

    #[error("runtime error during evaluation: {0}")]
    Runtime(String),

    #[error("evaluation exceeded the time budget")]
    Timeout,

    #[error("output does not match the expected value")]
    Mismatch,

    #[error("submission matched none of the accepted patterns")]
    PatternMismatch,

    #[error("problem definition is invalid: {0}")]
    InvalidProblem(String),
}
