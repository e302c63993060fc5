//! Sequential task pipelines for device workflows.
//!
//! A [`TaskRunner`] executes a fixed list of [`Task`]s strictly in order. Later tasks
//! read typed results of earlier ones through their [`TaskContext`]. Tasks marked
//! failable record their error and let the pipeline continue; any other failure stops
//! it. Cancellation is cooperative and checked at task boundaries.
//!
//! Every state change is published as an [`Event`] on the runner's [`Bus`]; a
//! [`SubscriberSet`] fans events out to [`Subscribe`] implementations (logging, metrics).

mod error;
pub use error::{RunnerError, TaskError};

mod task;
pub use task::{CancelHook, Outcome, Task};

mod context;
pub use context::TaskContext;

mod runner;
pub use runner::TaskRunner;

pub mod events;
pub use events::{Bus, Event, EventKind};

pub mod subscribers;
pub use subscribers::{Subscribe, SubscriberSet};

pub mod prelude {
    pub use crate::error::{RunnerError, TaskError};
    pub use crate::{Outcome, Task, TaskContext, TaskRunner};
    pub use lockwire_model::{RunnerState, TaskId, TaskStatus};
}
