use std::{any::Any, fmt, future::Future, sync::Arc};

use futures::future::{BoxFuture, FutureExt};
use lockwire_model::{TaskId, TaskStatus};

use crate::{TaskContext, TaskError};

/// Value and explicit status returned by a task handler.
///
/// `Outcome::done(v)` (or `v.into()`) is the common case. A handler can also mark
/// itself skipped ("nothing to do") or failed without returning an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: Option<T>,
    pub status: TaskStatus,
}

impl<T> Outcome<T> {
    pub fn done(value: T) -> Self {
        Self {
            value: Some(value),
            status: TaskStatus::Succeeded,
        }
    }

    pub fn skipped() -> Self {
        Self {
            value: None,
            status: TaskStatus::Skipped,
        }
    }

    /// Marks the task failed while still publishing a result for later tasks.
    pub fn failed(value: T) -> Self {
        Self {
            value: Some(value),
            status: TaskStatus::Failed,
        }
    }

    pub fn with_status(value: T, status: TaskStatus) -> Self {
        Self {
            value: Some(value),
            status,
        }
    }
}

impl<T> From<T> for Outcome<T> {
    fn from(value: T) -> Self {
        Outcome::done(value)
    }
}

pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;
pub(crate) type Erased = (Option<AnyValue>, TaskStatus);
type Handler =
    Arc<dyn Fn(TaskContext) -> BoxFuture<'static, Result<Erased, TaskError>> + Send + Sync>;

/// Aborts the in-flight operation of a running task; called from the cancelling context.
pub type CancelHook = Arc<dyn Fn() + Send + Sync>;

/// One step of a pipeline.
#[derive(Clone)]
pub struct Task {
    id: TaskId,
    label: String,
    failable: bool,
    handler: Handler,
    cancel_hook: Option<CancelHook>,
}

impl Task {
    /// Creates a task from an async handler producing `Outcome<T>`.
    pub fn new<T, F, Fut>(id: impl Into<TaskId>, label: impl Into<String>, handler: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Outcome<T>, TaskError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(move |ctx: TaskContext| {
            handler(ctx)
                .map(|res| {
                    res.map(|outcome| {
                        let value = outcome.value.map(|v| Arc::new(v) as AnyValue);
                        (value, outcome.status)
                    })
                })
                .boxed()
        });

        Self {
            id: id.into(),
            label: label.into(),
            failable: false,
            handler,
            cancel_hook: None,
        }
    }

    /// A failure of this task is recorded but does not stop the runner.
    pub fn failable(mut self) -> Self {
        self.failable = true;
        self
    }

    pub fn with_cancel_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.cancel_hook = Some(Arc::new(hook));
        self
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_failable(&self) -> bool {
        self.failable
    }

    pub(crate) fn cancel_hook(&self) -> Option<CancelHook> {
        self.cancel_hook.clone()
    }

    pub(crate) fn call(&self, ctx: TaskContext) -> BoxFuture<'static, Result<Erased, TaskError>> {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("failable", &self.failable)
            .field("cancel_hook", &self.cancel_hook.is_some())
            .finish()
    }
}
