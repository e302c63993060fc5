use serde::{Deserialize, Serialize};

/// Lifecycle of a task runner.
///
/// `Ready -> Running -> {Succeeded | Failed | Cancelled}`; the terminal states
/// are mutually exclusive and reached exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RunnerState {
    Ready,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunnerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunnerState::Succeeded | RunnerState::Failed | RunnerState::Cancelled
        )
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            RunnerState::Ready => "ready",
            RunnerState::Running => "running",
            RunnerState::Succeeded => "succeeded",
            RunnerState::Failed => "failed",
            RunnerState::Cancelled => "cancelled",
        }
    }
}
