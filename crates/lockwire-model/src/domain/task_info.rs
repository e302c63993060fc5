use serde::{Deserialize, Serialize};

use crate::{ErrorCode, TaskId, TaskStatus};

/// Point-in-time view of a task, rendered by progress UIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    /// Task identifier.
    pub id: TaskId,
    /// Current label (handlers may rewrite it while running).
    pub label: String,
    /// Failure of this task does not stop the runner.
    pub failable: bool,
    /// Current execution state.
    pub status: TaskStatus,
    /// Progress in `0.0..=1.0`, if the task reports any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f32>,
    /// Last error message (if status is Failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stable code of the last error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_info_serde_roundtrip() {
        let info = TaskInfo {
            id: TaskId::from("push-config"),
            label: "Pushing configuration".to_string(),
            failable: false,
            status: TaskStatus::Failed,
            progress: Some(0.5),
            error: Some("timed out".to_string()),
            code: Some(ErrorCode::Timeout),
        };

        let json = serde_json::to_string(&info).unwrap();
        let back: TaskInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }

    #[test]
    fn task_info_optional_fields() {
        let info = TaskInfo {
            id: TaskId::from("read-info"),
            label: "Reading".to_string(),
            failable: true,
            status: TaskStatus::Ready,
            progress: None,
            error: None,
            code: None,
        };

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("error"));
        assert!(!json.contains("progress"));
    }
}
