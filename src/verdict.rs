use crate::errors::GradeError;
use serde::{Deserialize, Serialize};

/// Which failure a verdict reports. Mirrors [`GradeError`] without carrying
/// its payloads, so callers can branch on kind and render the message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ForbiddenGlobal,
    Runtime,
    Timeout,
    Mismatch,
    PatternMismatch,
    InvalidProblem,
}

impl From<&GradeError> for ErrorKind {
    fn from(err: &GradeError) -> Self {
        match err {
            GradeError::ForbiddenGlobal(_) => ErrorKind::ForbiddenGlobal,
            GradeError::Runtime(_) => ErrorKind::Runtime,
            GradeError::Timeout => ErrorKind::Timeout,
            GradeError::Mismatch => ErrorKind::Mismatch,
            GradeError::PatternMismatch => ErrorKind::PatternMismatch,
            GradeError::InvalidProblem(_) => ErrorKind::InvalidProblem,
        }
    }
}

/// The normalized outcome of grading one submission.
///
/// Ephemeral and self-contained: it holds no handles into the sandbox, no
/// timers, nothing to clean up. `error_kind`/`error_message` are present
/// exactly when `success` is false.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// The captured evaluated value, present when execution occurred
    /// (including on mismatch, so callers can show "got X, wanted Y").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<serde_json::Value>,

    /// Which pattern alternative matched, when the pattern path succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_pattern_index: Option<usize>,
}

impl Verdict {
    /// Success on the execute-and-compare path.
    pub fn pass(actual_output: serde_json::Value) -> Self {
        Self {
            success: true,
            error_kind: None,
            error_message: None,
            actual_output: Some(actual_output),
            matched_pattern_index: None,
        }
    }

    /// Success on the pattern path.
    pub fn pass_pattern(index: usize) -> Self {
        Self {
            success: true,
            error_kind: None,
            error_message: None,
            actual_output: None,
            matched_pattern_index: None,
        }
        .with_pattern_index(index)
    }

    /// Failure of any kind.
    pub fn fail(err: GradeError) -> Self {
        Self {
            success: false,
            error_kind: Some(ErrorKind::from(&err)),
            error_message: Some(err.to_string()),
            actual_output: None,
            matched_pattern_index: None,
        }
    }

    pub fn with_actual_output(mut self, actual: serde_json::Value) -> Self {
        self.actual_output = Some(actual);
        self
    }

    fn with_pattern_index(mut self, index: usize) -> Self {
        self.matched_pattern_index = Some(index);
        self
    }
}
