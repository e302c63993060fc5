use std::sync::Arc;

use lockwire_core::TerminalSession;
use lockwire_exec::Bus;

use crate::{CredentialSync, FlowConfig, RemoteApi};

mod bulk;
pub use bulk::{BulkReport, SyncTarget};

mod firmware;
mod sync;

/// Task ids used by the workflows; pass them to `TaskRunner::get_result`.
pub mod tasks {
    pub const REFRESH_TOKENS: &str = "refresh-tokens";
    pub const FETCH_CONFIG: &str = "fetch-config";
    pub const PUSH_CONFIG: &str = "push-config";
    pub const SET_TIME: &str = "set-time";
    pub const READ_EVENTS: &str = "read-events";
    pub const UPLOAD_EVENTS: &str = "upload-events";

    pub const READ_INFO: &str = "read-info";
    pub const CHECK_UPDATE: &str = "check-update";
    pub const TRANSFER: &str = "transfer";
    pub const COMMIT: &str = "commit";
}

/// Builds workflow runners on top of a terminal session and a backend.
///
/// All runners built from one context publish on the same event bus.
#[derive(Clone)]
pub struct FlowContext {
    session: TerminalSession,
    remote: Arc<dyn RemoteApi>,
    credentials: CredentialSync,
    config: FlowConfig,
    bus: Bus,
}

impl FlowContext {
    pub fn new(session: TerminalSession, remote: Arc<dyn RemoteApi>) -> Self {
        let credentials = CredentialSync::new(remote.clone(), session.context().tokens().clone());
        Self {
            session,
            remote,
            credentials,
            config: FlowConfig::default(),
            bus: Bus::default(),
        }
    }

    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    pub fn session(&self) -> &TerminalSession {
        &self.session
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn credentials(&self) -> &CredentialSync {
        &self.credentials
    }
}
