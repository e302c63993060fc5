use std::time::Duration;

use async_trait::async_trait;
use lockwire_core::SessionMetrics;
use lockwire_exec::{Event, EventKind, Subscribe};
use lockwire_model::{Action, ErrorCode, RunnerState, TaskStatus};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
    proto::MetricFamily,
};

const SESSION_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    sessions: IntCounterVec,
    session_duration: HistogramVec,
    tasks: IntCounterVec,
    runners: IntCounterVec,
}

impl PrometheusMetrics {
    /// Creates the metrics on a fresh registry.
    pub fn new() -> prometheus::Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Registers the metrics on `registry`; fails on duplicate names.
    pub fn with_registry(registry: Registry) -> prometheus::Result<Self> {
        let sessions = IntCounterVec::new(
            Opts::new("lockwire_sessions_total", "Terminal exchanges by action and outcome"),
            &["action", "outcome"],
        )?;
        registry.register(Box::new(sessions.clone()))?;

        let session_duration = HistogramVec::new(
            HistogramOpts::new(
                "lockwire_session_duration_seconds",
                "Duration of terminal exchanges",
            )
            .buckets(SESSION_BUCKETS.to_vec()),
            &["action"],
        )?;
        registry.register(Box::new(session_duration.clone()))?;

        let tasks = IntCounterVec::new(
            Opts::new("lockwire_tasks_total", "Finished tasks by status"),
            &["status"],
        )?;
        registry.register(Box::new(tasks.clone()))?;

        let runners = IntCounterVec::new(
            Opts::new("lockwire_runners_total", "Finished runners by terminal state"),
            &["state"],
        )?;
        registry.register(Box::new(runners.clone()))?;

        Ok(Self {
            registry,
            sessions,
            session_duration,
            tasks,
            runners,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition format, as served on `/metrics`.
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn task_finished(&self, status: TaskStatus) {
        self.tasks.with_label_values(&[status.as_label()]).inc();
    }

    fn runner_finished(&self, state: RunnerState) {
        self.runners.with_label_values(&[state.as_label()]).inc();
    }
}

impl SessionMetrics for PrometheusMetrics {
    fn record_session(&self, action: Action, code: Option<ErrorCode>, elapsed: Duration) {
        let outcome = code.map(|c| c.as_label()).unwrap_or("ok");
        self.sessions
            .with_label_values(&[action.as_str(), outcome])
            .inc();
        self.session_duration
            .with_label_values(&[action.as_str()])
            .observe(elapsed.as_secs_f64());
    }
}

#[async_trait]
impl Subscribe for PrometheusMetrics {
    async fn on_event(&self, event: &Event) {
        match event.kind {
            EventKind::TaskSucceeded => self.task_finished(TaskStatus::Succeeded),
            EventKind::TaskFailed => self.task_finished(TaskStatus::Failed),
            EventKind::TaskSkipped => self.task_finished(TaskStatus::Skipped),
            EventKind::RunnerSucceeded => self.runner_finished(RunnerState::Succeeded),
            EventKind::RunnerFailed => self.runner_finished(RunnerState::Failed),
            EventKind::RunnerCancelled => self.runner_finished(RunnerState::Cancelled),
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "prometheus"
    }
}
