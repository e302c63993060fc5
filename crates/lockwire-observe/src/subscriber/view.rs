use std::borrow::Borrow;

use lockwire_exec::{Event, EventKind};
use tracing::{debug, error, info, trace, warn};

pub trait View {
    fn as_runner(&self) -> &str;
    fn as_task(&self) -> &str;
    fn as_reason(&self) -> &str;
    fn as_code(&self) -> &'static str;
    fn progress(&self) -> f32;
    fn kind(&self) -> EventKind;
    fn is_failable(&self) -> bool;
}

impl<T> View for T
where
    T: Borrow<Event>,
{
    #[inline]
    fn as_runner(&self) -> &str {
        &self.borrow().runner
    }
    #[inline]
    fn as_task(&self) -> &str {
        self.borrow().task.as_ref().map(|t| t.as_str()).unwrap_or("none")
    }
    #[inline]
    fn as_reason(&self) -> &str {
        self.borrow().reason.as_deref().unwrap_or("unknown")
    }
    #[inline]
    fn as_code(&self) -> &'static str {
        self.borrow().code.map(|c| c.as_label()).unwrap_or("none")
    }
    #[inline]
    fn progress(&self) -> f32 {
        self.borrow().progress.unwrap_or(0.0)
    }
    #[inline]
    fn kind(&self) -> EventKind {
        self.borrow().kind
    }
    #[inline]
    fn is_failable(&self) -> bool {
        let ev: &Event = self.borrow();
        ev.kind == EventKind::TaskFailed && ev.failable
    }
}

#[inline]
pub fn message_for(kind: EventKind) -> &'static str {
    match kind {
        // runner
        EventKind::RunnerStarted => "runner started",
        EventKind::RunnerSucceeded => "runner succeeded",
        EventKind::RunnerFailed => "runner stopped by a failed task",
        EventKind::RunnerCancelled => "runner cancelled",
        EventKind::CancelRequested => "cancellation requested",

        // task
        EventKind::TaskStarted => "task started",
        EventKind::TaskSucceeded => "task succeeded",
        EventKind::TaskFailed => "task failed",
        EventKind::TaskSkipped => "task skipped (nothing to do)",
        EventKind::TaskProgress => "task progress",
        EventKind::TaskLabel => "task label changed",
    }
}

#[inline]
pub fn log_event<E: View>(e: E) {
    let msg = message_for(e.kind());

    match e.kind() {
        // runner
        EventKind::RunnerStarted => debug!(runner = e.as_runner(), "{msg}"),
        EventKind::RunnerSucceeded => info!(runner = e.as_runner(), "{msg}"),
        EventKind::RunnerCancelled => info!(runner = e.as_runner(), "{msg}"),
        EventKind::CancelRequested => info!(runner = e.as_runner(), task = e.as_task(), "{msg}"),
        EventKind::RunnerFailed => error!(
            runner = e.as_runner(),
            task = e.as_task(),
            code = e.as_code(),
            reason = e.as_reason(),
            "{msg}"
        ),

        // task
        EventKind::TaskStarted => debug!(runner = e.as_runner(), task = e.as_task(), "{msg}"),
        EventKind::TaskSucceeded => debug!(runner = e.as_runner(), task = e.as_task(), "{msg}"),
        EventKind::TaskSkipped => debug!(runner = e.as_runner(), task = e.as_task(), "{msg}"),
        EventKind::TaskLabel => trace!(runner = e.as_runner(), task = e.as_task(), "{msg}"),
        EventKind::TaskProgress => {
            trace!(runner = e.as_runner(), task = e.as_task(), progress = e.progress(), "{msg}")
        }
        EventKind::TaskFailed => {
            if e.is_failable() {
                warn!(
                    runner = e.as_runner(),
                    task = e.as_task(),
                    code = e.as_code(),
                    reason = e.as_reason(),
                    "failable task failed; runner continues"
                );
            } else {
                error!(
                    runner = e.as_runner(),
                    task = e.as_task(),
                    code = e.as_code(),
                    reason = e.as_reason(),
                    "{msg}"
                );
            }
        }
    }
}
