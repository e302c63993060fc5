use serde::{Deserialize, Serialize};

/// Execution state of a single task inside a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Declared, not started yet.
    Ready,
    /// Handler is executing.
    Started,
    /// Handler finished with a result.
    Succeeded,
    /// Handler raised an error or marked itself failed.
    Failed,
    /// Handler decided there was nothing to do.
    Skipped,
}

impl TaskStatus {
    /// Returns `true` once the task has finished (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            TaskStatus::Ready => "ready",
            TaskStatus::Started => "started",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }
}
