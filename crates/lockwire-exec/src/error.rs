use std::fmt;

use lockwire_model::{Coded, ErrorCode, TaskId};
use thiserror::Error;

/// Failure of a single task handler.
///
/// Any error implementing [`Coded`] converts into it with `?`, keeping its code.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error("{reason}")]
    Failed { code: ErrorCode, reason: String },
    #[error("task canceled")]
    Canceled,
}

impl TaskError {
    pub fn new(code: ErrorCode, reason: impl Into<String>) -> Self {
        TaskError::Failed {
            code,
            reason: reason.into(),
        }
    }

    /// Stable code; `Canceled` maps to [`ErrorCode::Cancelled`].
    pub fn code(&self) -> ErrorCode {
        match self {
            TaskError::Failed { code, .. } => *code,
            TaskError::Canceled => ErrorCode::Cancelled,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

impl<E> From<E> for TaskError
where
    E: Coded + fmt::Display,
{
    fn from(e: E) -> Self {
        TaskError::Failed {
            code: e.code(),
            reason: e.to_string(),
        }
    }
}

/// Runner-level scheduling errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunnerError {
    /// Bad task list, or a result lookup that cannot be satisfied.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// A non-failable task failed and the caller asked for the error.
    #[error("task '{task}' failed: {error}")]
    TaskFailed { task: TaskId, error: TaskError },
    #[error("runner '{0}' was already started")]
    AlreadyStarted(String),
}

impl Coded for RunnerError {
    fn code(&self) -> ErrorCode {
        match self {
            RunnerError::InvalidArguments(_) => ErrorCode::InvalidArguments,
            RunnerError::TaskFailed { error, .. } => error.code(),
            RunnerError::AlreadyStarted(_) => ErrorCode::InvalidState,
        }
    }
}
