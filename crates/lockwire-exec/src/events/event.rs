use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use lockwire_model::{ErrorCode, TaskId};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `execute` began.
    RunnerStarted,
    /// Every task completed without an unrecoverable failure.
    RunnerSucceeded,
    /// A non-failable task failed. Sets `task`, `reason`, `code`.
    RunnerFailed,
    /// The runner stopped at a task boundary after `cancel()`.
    RunnerCancelled,
    /// `cancel()` was accepted. Sets `task` if one was running.
    CancelRequested,
    /// Sets `task`, `label`.
    TaskStarted,
    /// Sets `task`.
    TaskSucceeded,
    /// Sets `task`, `reason`, `code`; `failable` when the runner continues.
    TaskFailed,
    /// Sets `task`.
    TaskSkipped,
    /// Sets `task`, `progress`.
    TaskProgress,
    /// The handler renamed its task. Sets `task`, `label`.
    TaskLabel,
}

impl EventKind {
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::RunnerStarted => "runner_started",
            EventKind::RunnerSucceeded => "runner_succeeded",
            EventKind::RunnerFailed => "runner_failed",
            EventKind::RunnerCancelled => "runner_cancelled",
            EventKind::CancelRequested => "cancel_requested",
            EventKind::TaskStarted => "task_started",
            EventKind::TaskSucceeded => "task_succeeded",
            EventKind::TaskFailed => "task_failed",
            EventKind::TaskSkipped => "task_skipped",
            EventKind::TaskProgress => "task_progress",
            EventKind::TaskLabel => "task_label",
        }
    }

    /// Last event a runner publishes.
    pub fn is_runner_terminal(&self) -> bool {
        matches!(
            self,
            EventKind::RunnerSucceeded | EventKind::RunnerFailed | EventKind::RunnerCancelled
        )
    }
}

/// Runner event with optional task metadata.
#[derive(Debug, Clone)]
pub struct Event {
    /// Process-wide, strictly increasing sequence number.
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,
    pub runner: Arc<str>,
    pub task: Option<TaskId>,
    pub label: Option<String>,
    pub progress: Option<f32>,
    pub reason: Option<String>,
    pub code: Option<ErrorCode>,
    /// The failed task was marked failable; the runner moves on.
    pub failable: bool,
}

impl Event {
    pub fn new(kind: EventKind, runner: impl Into<Arc<str>>) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            runner: runner.into(),
            task: None,
            label: None,
            progress: None,
            reason: None,
            code: None,
            failable: false,
        }
    }

    #[inline]
    pub fn with_task(mut self, task: &TaskId) -> Self {
        self.task = Some(task.clone());
        self
    }

    #[inline]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[inline]
    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = Some(progress);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    #[inline]
    pub fn with_failable(mut self) -> Self {
        self.failable = true;
        self
    }
}
