use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use lockwire_model::{Action, Coded, Device, DeviceId, TerminalRequest};
use tokio::runtime::Handle;
use tracing::{debug, info, instrument, warn};

use super::{SessionContext, context::ActiveGuard};
use crate::{
    error::{ProtocolError, SessionError},
    signal::{DID_UPDATE_VALUE, DID_WRITE_VALUE},
};

/// One guarded request/response exchange with a terminal.
///
/// Per run: claim the session slot, connect if needed, select and encode the token,
/// write the request frame by frame, wait for the reply, then disconnect if this run
/// opened the link. The whole exchange is bounded by the caller's timeout.
#[derive(Clone)]
pub struct TerminalSession {
    ctx: Arc<SessionContext>,
}

impl TerminalSession {
    pub fn new(ctx: Arc<SessionContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.ctx
    }

    /// Runs `action` against `device` and returns the terminal's response payload.
    ///
    /// Fails with [`SessionError::Unavailable`] without touching the transport when
    /// another exchange is in progress. A non-OK application status is reported as
    /// [`SessionError::ApplicationStatus`]; an empty successful reply yields an empty
    /// payload.
    #[instrument(level = "debug", skip_all, fields(device = %device, action = %action))]
    pub async fn run(
        &self,
        device: &DeviceId,
        action: Action,
        payload: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<Vec<u8>, SessionError> {
        let started = Instant::now();
        let result = self
            .run_guarded(device, action, payload.unwrap_or_default(), timeout)
            .await;

        match &result {
            Ok(response) => info!(
                bytes = response.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "exchange completed"
            ),
            Err(e) => warn!(code = %e.code(), error = %e, "exchange failed"),
        }
        if let Some(metrics) = &self.ctx.metrics {
            let code = result.as_ref().err().map(Coded::code);
            metrics.record_session(action, code, started.elapsed());
        }
        result
    }

    /// Same as [`run`](Self::run) with the configured default timeout.
    pub async fn run_default(
        &self,
        device: &DeviceId,
        action: Action,
        payload: Option<&[u8]>,
    ) -> Result<Vec<u8>, SessionError> {
        self.run(device, action, payload, self.ctx.config.default_timeout()).await
    }

    async fn run_guarded(
        &self,
        device_id: &DeviceId,
        action: Action,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<Vec<u8>, SessionError> {
        let ctx = &self.ctx;
        if ctx.is_busy() {
            return Err(SessionError::Unavailable);
        }
        let device = ctx
            .directory
            .lookup(device_id)
            .ok_or_else(|| SessionError::DeviceNotFound(device_id.clone()))?;
        let slot = ctx.claim(&device.id, action)?;
        debug!(session = %slot.id(), "session slot claimed");

        let mut cleanup = Cleanup::new(slot, device.clone());
        let outcome = tokio::time::timeout(
            timeout,
            self.exchange(&device, action, payload, &mut cleanup.initiated),
        )
        .await;
        let result = match outcome {
            Ok(result) => result,
            Err(_) => {
                let aborted = ctx.bus.abort_group(device.signal_group());
                debug!(aborted, "exchange timed out; pending signals aborted");
                Err(SessionError::Timeout(timeout))
            }
        };

        cleanup.finish().await;
        result
    }

    async fn exchange(
        &self,
        device: &Device,
        action: Action,
        payload: &[u8],
        initiated: &mut bool,
    ) -> Result<Vec<u8>, SessionError> {
        let ctx = &self.ctx;
        let group = device.signal_group();

        if !ctx.transport.state(device).is_connected() {
            *initiated = true;
            let limit = ctx.config.connect_timeout();
            tokio::time::timeout(limit, ctx.transport.connect(device))
                .await
                .map_err(|_| SessionError::Timeout(limit))??;
            debug!("link established");
        }

        let token = ctx.selector.resolve(device, action, payload)?;
        let request = TerminalRequest {
            signed_token: ctx.codec.encode_token(&token)?,
            application_payload: if action.carries_request() {
                Vec::new()
            } else {
                payload.to_vec()
            },
        };
        let bytes = ctx.codec.encode_request(&request)?;

        let max_frame = ctx.transport.max_frame_size(device);
        if max_frame == 0 {
            let reason = "transport reports a zero frame size".into();
            return Err(ProtocolError::InvalidArguments(reason).into());
        }

        // Outcomes left over from an earlier exchange must not satisfy this one.
        ctx.bus.remove(group, DID_WRITE_VALUE);
        ctx.bus.remove(group, DID_UPDATE_VALUE);
        ctx.bus.add(group, DID_UPDATE_VALUE)?;

        let frames = bytes.len().div_ceil(max_frame);
        for (n, frame) in bytes.chunks(max_frame).enumerate() {
            ctx.bus.add(group, DID_WRITE_VALUE)?;
            ctx.transport.transmit(device, frame).await?;
            ctx.bus.wait(group, DID_WRITE_VALUE, true).await?;
            debug!(frame = n + 1, frames, "frame acknowledged");
        }

        let raw = ctx
            .bus
            .wait(group, DID_UPDATE_VALUE, true)
            .await?
            .ok_or_else(|| ProtocolError::Decode("reply carried no bytes".into()))?;
        let reply = ctx.codec.decode_reply(&raw)?;
        if !reply.application_status.is_ok() {
            return Err(SessionError::ApplicationStatus(reply.application_status));
        }
        Ok(reply.response_payload.unwrap_or_default())
    }

}

/// Post-exchange duties: clear the device's signals, close the link if this run
/// opened it, then release the session slot.
///
/// `finish` performs them in order. If the run is dropped before that, `Drop`
/// clears the signals and hands the disconnect to the runtime; the slot stays
/// claimed until the link is closed.
struct Cleanup {
    slot: Option<ActiveGuard>,
    device: Device,
    initiated: bool,
}

impl Cleanup {
    fn new(slot: ActiveGuard, device: Device) -> Self {
        Self {
            slot: Some(slot),
            device,
            initiated: false,
        }
    }

    async fn finish(mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let ctx = slot.context();
        clear_signals(ctx, &self.device);
        if self.initiated {
            close_link(ctx, &self.device).await;
        }
    }
}

impl Drop for Cleanup {
    fn drop(&mut self) {
        let Some(slot) = self.slot.take() else {
            return;
        };
        let ctx = Arc::clone(slot.context());
        ctx.bus.abort_group(self.device.signal_group());
        clear_signals(&ctx, &self.device);
        if !self.initiated {
            return;
        }

        match Handle::try_current() {
            Ok(handle) => {
                warn!(device = %self.device.id, "exchange dropped; closing link in background");
                let device = self.device.clone();
                handle.spawn(async move {
                    close_link(&ctx, &device).await;
                    drop(slot);
                });
            }
            Err(_) => warn!(
                device = %self.device.id,
                "exchange dropped outside a runtime; link left open"
            ),
        }
    }
}

fn clear_signals(ctx: &SessionContext, device: &Device) {
    let group = device.signal_group();
    ctx.bus.remove(group, DID_WRITE_VALUE);
    ctx.bus.remove(group, DID_UPDATE_VALUE);
}

async fn close_link(ctx: &SessionContext, device: &Device) {
    let limit = ctx.config.connect_timeout();
    match tokio::time::timeout(limit, ctx.transport.disconnect(device)).await {
        Ok(Ok(())) => debug!("link closed"),
        Ok(Err(e)) => warn!(error = %e, "disconnect failed"),
        Err(_) => warn!(timeout_ms = limit.as_millis() as u64, "disconnect timed out"),
    }
}
