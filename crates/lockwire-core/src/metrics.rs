use std::time::Duration;

use lockwire_model::{Action, ErrorCode};

/// Sink for per-exchange metrics.
///
/// Called once per [`TerminalSession::run`](crate::TerminalSession::run);
/// `code` is `None` when the exchange succeeded.
pub trait SessionMetrics: Send + Sync + 'static {
    fn record_session(&self, action: Action, code: Option<ErrorCode>, elapsed: Duration);
}
