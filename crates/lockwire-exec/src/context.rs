use lockwire_model::TaskId;
use tokio_util::sync::CancellationToken;

use crate::{RunnerError, TaskRunner};

/// Handle passed to a running task handler.
///
/// Gives access to results of earlier tasks, progress reporting and the runner's
/// cancellation state.
#[derive(Clone)]
pub struct TaskContext {
    runner: TaskRunner,
    index: usize,
}

impl TaskContext {
    pub(crate) fn new(runner: TaskRunner, index: usize) -> Self {
        Self { runner, index }
    }

    pub fn task_id(&self) -> &TaskId {
        self.runner.task_at(self.index).id()
    }

    pub fn runner(&self) -> &TaskRunner {
        &self.runner
    }

    /// Result stored by an earlier task; see [`TaskRunner::get_result`].
    pub fn result<T: Clone + 'static>(&self, id: &str) -> Result<T, RunnerError> {
        self.runner.get_result(id)
    }

    /// Reports progress in `0.0..=1.0` (clamped).
    pub fn set_progress(&self, progress: f32) {
        self.runner.set_progress(self.index, progress);
    }

    pub fn set_label(&self, label: impl Into<String>) {
        self.runner.set_label(self.index, label.into());
    }

    pub fn is_cancelled(&self) -> bool {
        self.runner.cancellation().is_cancelled()
    }

    /// Resolves once the runner is cancelled.
    pub async fn cancelled(&self) {
        self.runner.cancellation().cancelled().await
    }

    /// Token cancelled together with the runner, for passing into nested operations.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.runner.cancellation().child_token()
    }
}
