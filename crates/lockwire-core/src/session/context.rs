use std::{sync::Arc, time::Instant};

use lockwire_model::{Action, DeviceId};
use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::SessionConfig;
use crate::{
    codec::NativeCodec,
    directory::DeviceDirectory,
    error::SessionError,
    metrics::SessionMetrics,
    signal::SignalBus,
    store::TokenStore,
    token::{DemoIdentity, TokenCache, TokenSelector},
    transport::Transport,
};

/// The exchange currently owning the session slot.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub id: Uuid,
    pub device: DeviceId,
    pub action: Action,
    pub started_at: Instant,
}

/// Shared collaborators of every [`TerminalSession`](crate::TerminalSession).
///
/// Holds the single "active session" slot: at most one exchange runs at a time
/// per context, across all devices.
pub struct SessionContext {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) directory: Arc<dyn DeviceDirectory>,
    pub(crate) codec: Arc<dyn NativeCodec>,
    pub(crate) selector: TokenSelector,
    pub(crate) bus: SignalBus,
    pub(crate) metrics: Option<Arc<dyn SessionMetrics>>,
    pub(crate) config: SessionConfig,
    active: Mutex<Option<ActiveSession>>,
}

impl SessionContext {
    /// Starts building a context.
    ///
    /// `bus` must be the same bus `transport` posts its callbacks into.
    pub fn builder(
        bus: SignalBus,
        transport: Arc<dyn Transport>,
        directory: Arc<dyn DeviceDirectory>,
        store: Arc<dyn TokenStore>,
        codec: Arc<dyn NativeCodec>,
    ) -> SessionContextBuilder {
        SessionContextBuilder {
            bus,
            transport,
            directory,
            store,
            codec,
            demo: Vec::new(),
            metrics: None,
            config: SessionConfig::default(),
        }
    }

    pub fn bus(&self) -> &SignalBus {
        &self.bus
    }

    pub fn selector(&self) -> &TokenSelector {
        &self.selector
    }

    /// Token cache backing the selector; credential sync writes here.
    pub fn tokens(&self) -> &TokenCache {
        self.selector.cache()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot of the exchange holding the slot, if any.
    pub fn active(&self) -> Option<ActiveSession> {
        self.active.lock().clone()
    }

    pub fn is_busy(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Claims the slot; released when the guard drops.
    pub(crate) fn claim(
        self: &Arc<Self>,
        device: &DeviceId,
        action: Action,
    ) -> Result<ActiveGuard, SessionError> {
        let mut slot = self.active.lock();
        if let Some(current) = slot.as_ref() {
            debug!(busy_with = %current.device, "session slot taken");
            return Err(SessionError::Unavailable);
        }

        let id = Uuid::new_v4();
        *slot = Some(ActiveSession {
            id,
            device: device.clone(),
            action,
            started_at: Instant::now(),
        });
        Ok(ActiveGuard {
            ctx: Arc::clone(self),
            id,
        })
    }
}

/// Releases the session slot on every exit path, including cancellation.
pub(crate) struct ActiveGuard {
    ctx: Arc<SessionContext>,
    id: Uuid,
}

impl ActiveGuard {
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    pub(crate) fn context(&self) -> &Arc<SessionContext> {
        &self.ctx
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut slot = self.ctx.active.lock();
        if slot.as_ref().is_some_and(|s| s.id == self.id) {
            *slot = None;
        }
    }
}

pub struct SessionContextBuilder {
    bus: SignalBus,
    transport: Arc<dyn Transport>,
    directory: Arc<dyn DeviceDirectory>,
    store: Arc<dyn TokenStore>,
    codec: Arc<dyn NativeCodec>,
    demo: Vec<DemoIdentity>,
    metrics: Option<Arc<dyn SessionMetrics>>,
    config: SessionConfig,
}

impl SessionContextBuilder {
    /// Registers a demo terminal whose tokens are signed locally.
    pub fn with_demo(mut self, identity: DemoIdentity) -> Self {
        self.demo.push(identity);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn SessionMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<SessionContext> {
        let selector = self
            .demo
            .into_iter()
            .fold(TokenSelector::new(TokenCache::new(self.store), self.codec.clone()), |s, d| {
                s.with_demo(d)
            });

        Arc::new(SessionContext {
            transport: self.transport,
            directory: self.directory,
            codec: self.codec,
            selector,
            bus: self.bus,
            metrics: self.metrics,
            config: self.config,
            active: Mutex::new(None),
        })
    }
}
