use std::{any::type_name, collections::HashSet, sync::Arc};

use lockwire_model::{ErrorCode, RunnerState, TaskId, TaskInfo, TaskStatus};
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    RunnerError, Task, TaskContext, TaskError,
    events::{Bus, Event, EventKind},
    task::AnyValue,
};

struct Record {
    label: String,
    status: TaskStatus,
    progress: Option<f32>,
    error: Option<TaskError>,
    result: Option<AnyValue>,
}

struct Control {
    state: RunnerState,
    current: Option<usize>,
}

struct Inner {
    name: Arc<str>,
    tasks: Vec<Task>,
    records: Vec<Mutex<Record>>,
    control: Mutex<Control>,
    cancel: CancellationToken,
    bus: Bus,
}

/// Executes a fixed list of tasks strictly in order.
///
/// State machine: `ready → running → succeeded | failed | cancelled`; the terminal
/// state is set exactly once. Cheap to clone; clones drive the same runner, so a
/// UI can hold one to call [`cancel`](Self::cancel) while another awaits
/// [`execute`](Self::execute).
#[derive(Clone)]
pub struct TaskRunner {
    inner: Arc<Inner>,
}

impl TaskRunner {
    /// Creates a runner publishing on its own bus.
    pub fn new(name: impl Into<Arc<str>>, tasks: Vec<Task>) -> Result<Self, RunnerError> {
        Self::with_bus(name, tasks, Bus::default())
    }

    /// Creates a runner publishing on a shared bus.
    ///
    /// Fails with `InvalidArguments` when two tasks share an id.
    pub fn with_bus(
        name: impl Into<Arc<str>>,
        tasks: Vec<Task>,
        bus: Bus,
    ) -> Result<Self, RunnerError> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if !seen.insert(task.id().clone()) {
                let reason = format!("duplicate task id '{}'", task.id());
                return Err(RunnerError::InvalidArguments(reason));
            }
        }

        let records = tasks
            .iter()
            .map(|t| {
                Mutex::new(Record {
                    label: t.label().to_string(),
                    status: TaskStatus::Ready,
                    progress: None,
                    error: None,
                    result: None,
                })
            })
            .collect();

        Ok(Self {
            inner: Arc::new(Inner {
                name: name.into(),
                tasks,
                records,
                control: Mutex::new(Control {
                    state: RunnerState::Ready,
                    current: None,
                }),
                cancel: CancellationToken::new(),
                bus,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn state(&self) -> RunnerState {
        self.inner.control.lock().state
    }

    pub fn is_successful(&self) -> bool {
        self.state() == RunnerState::Succeeded
    }

    pub fn bus(&self) -> &Bus {
        &self.inner.bus
    }

    /// Receiver for this runner's events (and those of other runners sharing the bus).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.bus.subscribe()
    }

    /// Runs every task in declaration order.
    ///
    /// Returns the terminal state. A non-failable task failure ends the runner
    /// `failed`; with `throw_on_fail` it is returned as [`RunnerError::TaskFailed`]
    /// instead. Cancellation is never reported as an error.
    #[instrument(level = "debug", skip(self), fields(runner = %self.inner.name))]
    pub async fn execute(&self, throw_on_fail: bool) -> Result<RunnerState, RunnerError> {
        {
            let mut control = self.inner.control.lock();
            if control.state != RunnerState::Ready {
                return Err(RunnerError::AlreadyStarted(self.inner.name.to_string()));
            }
            control.state = RunnerState::Running;
        }
        self.publish(Event::new(EventKind::RunnerStarted, self.inner.name.clone()));
        info!(tasks = self.inner.tasks.len(), "runner started");

        for (index, task) in self.inner.tasks.iter().enumerate() {
            if self.inner.cancel.is_cancelled() {
                return Ok(self.finish(RunnerState::Cancelled, None));
            }

            self.inner.control.lock().current = Some(index);
            let label = {
                let mut record = self.inner.records[index].lock();
                record.status = TaskStatus::Started;
                record.label.clone()
            };
            self.publish(self.event(EventKind::TaskStarted, task.id()).with_label(label));
            debug!(task = %task.id(), "task started");

            let result = task.call(TaskContext::new(self.clone(), index)).await;
            self.inner.control.lock().current = None;

            let Some(error) = self.complete(index, task, result) else {
                continue;
            };

            if task.is_failable() {
                warn!(
                    task = %task.id(),
                    code = %error.code(),
                    error = %error,
                    "failable task failed; continuing"
                );
                continue;
            }
            if self.inner.cancel.is_cancelled() {
                debug!(task = %task.id(), error = %error, "task failed after cancellation");
                return Ok(self.finish(RunnerState::Cancelled, None));
            }

            error!(
                task = %task.id(),
                code = %error.code(),
                error = %error,
                "task failed; runner stopped"
            );
            let state = self.finish(RunnerState::Failed, Some((task.id(), &error)));
            if throw_on_fail {
                return Err(RunnerError::TaskFailed {
                    task: task.id().clone(),
                    error,
                });
            }
            return Ok(state);
        }

        Ok(self.finish(RunnerState::Succeeded, None))
    }

    /// Requests cancellation.
    ///
    /// Accepted once, while the runner has not finished: the flag stops the next task
    /// from starting and the running task's cancel hook is invoked. Returns `false`
    /// (and changes nothing) for finished runners or repeated calls.
    pub fn cancel(&self) -> bool {
        let (hook, task) = {
            let control = self.inner.control.lock();
            if control.state.is_terminal() || self.inner.cancel.is_cancelled() {
                return false;
            }
            self.inner.cancel.cancel();
            let current = control.current.and_then(|i| self.inner.tasks.get(i));
            (
                current.and_then(Task::cancel_hook),
                current.map(|t| t.id().clone()),
            )
        };

        let mut ev = Event::new(EventKind::CancelRequested, self.inner.name.clone());
        if let Some(task) = &task {
            ev = ev.with_task(task);
        }
        self.publish(ev);
        info!(
            runner = %self.inner.name,
            task = ?task.as_ref().map(TaskId::as_str),
            "cancellation requested"
        );

        if let Some(hook) = hook {
            hook();
        }
        true
    }

    /// Typed result stored by task `id`.
    ///
    /// Fails with `InvalidArguments` when the task is unknown, has not produced a
    /// result, or produced a value of another type.
    pub fn get_result<T: Clone + 'static>(&self, id: &str) -> Result<T, RunnerError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| RunnerError::InvalidArguments(format!("unknown task '{id}'")))?;
        let record = self.inner.records[index].lock();
        let value = record
            .result
            .as_ref()
            .ok_or_else(|| RunnerError::InvalidArguments(format!("task '{id}' has no result")))?;
        value.downcast_ref::<T>().cloned().ok_or_else(|| {
            let reason = format!("result of task '{id}' is not a {}", type_name::<T>());
            RunnerError::InvalidArguments(reason)
        })
    }

    /// Point-in-time view of every task, in declaration order.
    pub fn snapshot(&self) -> Vec<TaskInfo> {
        self.inner
            .tasks
            .iter()
            .zip(&self.inner.records)
            .map(|(task, record)| {
                let record = record.lock();
                TaskInfo {
                    id: task.id().clone(),
                    label: record.label.clone(),
                    failable: task.is_failable(),
                    status: record.status,
                    progress: record.progress,
                    error: record.error.as_ref().map(ToString::to_string),
                    code: record.error.as_ref().map(TaskError::code),
                }
            })
            .collect()
    }

    pub(crate) fn task_at(&self, index: usize) -> &Task {
        &self.inner.tasks[index]
    }

    pub(crate) fn cancellation(&self) -> &CancellationToken {
        &self.inner.cancel
    }

    pub(crate) fn set_progress(&self, index: usize, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);
        self.inner.records[index].lock().progress = Some(progress);
        self.publish(
            self.event(EventKind::TaskProgress, self.task_at(index).id())
                .with_progress(progress),
        );
    }

    pub(crate) fn set_label(&self, index: usize, label: String) {
        self.inner.records[index].lock().label = label.clone();
        self.publish(self.event(EventKind::TaskLabel, self.task_at(index).id()).with_label(label));
    }

    /// Stores the handler outcome; returns the error if the task ended failed.
    fn complete(
        &self,
        index: usize,
        task: &Task,
        result: Result<(Option<AnyValue>, TaskStatus), TaskError>,
    ) -> Option<TaskError> {
        let error = match result {
            Ok((value, status)) => {
                let mut record = self.inner.records[index].lock();
                record.result = value;
                match status {
                    TaskStatus::Skipped => {
                        record.status = TaskStatus::Skipped;
                        drop(record);
                        self.publish(self.event(EventKind::TaskSkipped, task.id()));
                        debug!(task = %task.id(), "task skipped");
                        return None;
                    }
                    TaskStatus::Failed => {
                        TaskError::new(ErrorCode::TaskFailed, "task reported failure")
                    }
                    _ => {
                        record.status = TaskStatus::Succeeded;
                        drop(record);
                        self.publish(self.event(EventKind::TaskSucceeded, task.id()));
                        debug!(task = %task.id(), "task succeeded");
                        return None;
                    }
                }
            }
            Err(e) => e,
        };

        {
            let mut record = self.inner.records[index].lock();
            record.status = TaskStatus::Failed;
            record.error = Some(error.clone());
        }
        let mut ev = self
            .event(EventKind::TaskFailed, task.id())
            .with_reason(error.to_string())
            .with_code(error.code());
        if task.is_failable() {
            ev = ev.with_failable();
        }
        self.publish(ev);
        Some(error)
    }

    fn finish(&self, state: RunnerState, failure: Option<(&TaskId, &TaskError)>) -> RunnerState {
        let state = {
            let mut control = self.inner.control.lock();
            control.current = None;
            control.state = if state == RunnerState::Succeeded && self.inner.cancel.is_cancelled() {
                RunnerState::Cancelled
            } else {
                state
            };
            control.state
        };

        let kind = match state {
            RunnerState::Failed => EventKind::RunnerFailed,
            RunnerState::Cancelled => EventKind::RunnerCancelled,
            _ => EventKind::RunnerSucceeded,
        };
        let mut ev = Event::new(kind, self.inner.name.clone());
        if let Some((task, error)) = failure {
            ev = ev
                .with_task(task)
                .with_reason(error.to_string())
                .with_code(error.code());
        }
        self.publish(ev);
        info!(state = state.as_label(), "runner finished");
        state
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        self.inner.tasks.iter().position(|t| t.id() == id)
    }

    fn event(&self, kind: EventKind, task: &TaskId) -> Event {
        Event::new(kind, self.inner.name.clone()).with_task(task)
    }

    fn publish(&self, ev: Event) {
        self.inner.bus.publish(ev);
    }
}
