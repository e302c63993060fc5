use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use lockwire_model::{
    ConnectionState, Device, DeviceId, SignedToken, TerminalReply, TerminalRequest,
};
use parking_lot::Mutex;
use tracing::trace;

use super::FakeCodec;
use crate::{
    codec::NativeCodec,
    error::TransportError,
    signal::{DID_UPDATE_VALUE, DID_WRITE_VALUE, SignalBus},
    transport::Transport,
};

/// What the fake terminal does with a complete request.
#[derive(Clone, Debug)]
pub enum Scripted {
    /// Answer with this reply.
    Reply(TerminalReply),
    /// Never answer.
    Silence,
    /// Report a receive-side failure.
    Fail(TransportError),
    /// Drop the link while the request is in flight.
    Drop,
}

/// A request received by the fake terminal.
#[derive(Clone, Debug)]
pub struct FakeRequest {
    pub device: DeviceId,
    pub token: SignedToken,
    pub request: TerminalRequest,
}

type Responder = Arc<dyn Fn(&FakeRequest) -> Scripted + Send + Sync>;

struct State {
    links: HashMap<DeviceId, ConnectionState>,
    partial: HashMap<DeviceId, Vec<u8>>,
    requests: Vec<FakeRequest>,
    connect_error: Option<TransportError>,
    connects: usize,
    disconnects: usize,
    frames: usize,
}

/// Scripted in-memory terminal.
pub struct FakeTransport {
    bus: SignalBus,
    codec: FakeCodec,
    max_frame: usize,
    delay: Duration,
    responder: Mutex<Responder>,
    state: Mutex<State>,
}

impl FakeTransport {
    /// Creates a fake whose terminals accept every request with an empty payload.
    pub fn new(bus: SignalBus) -> Self {
        let accept_all: Responder =
            Arc::new(|_: &FakeRequest| Scripted::Reply(TerminalReply::ok(Vec::new())));
        Self {
            bus,
            codec: FakeCodec,
            max_frame: 64,
            delay: Duration::ZERO,
            responder: Mutex::new(accept_all),
            state: Mutex::new(State {
                links: HashMap::new(),
                partial: HashMap::new(),
                requests: Vec::new(),
                connect_error: None,
                connects: 0,
                disconnects: 0,
                frames: 0,
            }),
        }
    }

    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame;
        self
    }

    /// Delay between receiving a complete request and posting the reply.
    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Installs the terminal behaviour.
    pub fn respond_with<F>(&self, f: F)
    where
        F: Fn(&FakeRequest) -> Scripted + Send + Sync + 'static,
    {
        *self.responder.lock() = Arc::new(f);
    }

    /// Marks `device` as already connected (connected by someone else).
    pub fn set_connected(&self, device: &DeviceId) {
        self.state
            .lock()
            .links
            .insert(device.clone(), ConnectionState::Connected);
    }

    /// Makes every following `connect` fail with `error`.
    pub fn fail_connect(&self, error: TransportError) {
        self.state.lock().connect_error = Some(error);
    }

    pub fn requests(&self) -> Vec<FakeRequest> {
        self.state.lock().requests.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub fn disconnects(&self) -> usize {
        self.state.lock().disconnects
    }

    pub fn frames(&self) -> usize {
        self.state.lock().frames
    }

    fn link(&self, device: &DeviceId) -> ConnectionState {
        self.state
            .lock()
            .links
            .get(device)
            .copied()
            .unwrap_or(ConnectionState::Disconnected)
    }

    fn complete_request(&self, device: &Device, bytes: &[u8]) -> Option<FakeRequest> {
        let request = self.codec.decode_request(bytes).ok()?;
        let token = self.codec.decode_token(&request.signed_token).ok()?;
        Some(FakeRequest {
            device: device.id.clone(),
            token,
            request,
        })
    }

    fn answer(&self, device: &Device, scripted: Scripted) {
        let group = device.signal_group().to_string();
        if let Scripted::Drop = scripted {
            self.state
                .lock()
                .links
                .insert(device.id.clone(), ConnectionState::Disconnected);
        }
        let reply = match &scripted {
            Scripted::Reply(reply) => match self.codec.encode_reply(reply) {
                Ok(bytes) => Some(bytes),
                Err(_) => return,
            },
            _ => None,
        };

        let bus = self.bus.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match scripted {
                Scripted::Reply(_) => bus.success(&group, DID_UPDATE_VALUE, reply),
                Scripted::Fail(e) => bus.failure(&group, DID_UPDATE_VALUE, e),
                Scripted::Drop => {
                    bus.abort_group(&group);
                }
                Scripted::Silence => {}
            }
        });
    }
}

#[async_trait]
impl Transport for FakeTransport {
    fn state(&self, device: &Device) -> ConnectionState {
        self.link(&device.id)
    }

    async fn connect(&self, device: &Device) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.connects += 1;
        if let Some(e) = state.connect_error.clone() {
            return Err(e);
        }
        state
            .links
            .insert(device.id.clone(), ConnectionState::Connected);
        trace!(device = %device.id, "fake link connected");
        Ok(())
    }

    async fn disconnect(&self, device: &Device) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.disconnects += 1;
        state.partial.remove(&device.id);
        state
            .links
            .insert(device.id.clone(), ConnectionState::Disconnected);
        Ok(())
    }

    fn max_frame_size(&self, _device: &Device) -> usize {
        self.max_frame
    }

    async fn transmit(&self, device: &Device, frame: &[u8]) -> Result<(), TransportError> {
        if !self.link(&device.id).is_connected() {
            return Err(TransportError::NotConnected);
        }
        if frame.len() > self.max_frame {
            return Err(TransportError::MalformedFrame(format!(
                "frame of {} bytes exceeds {}",
                frame.len(),
                self.max_frame
            )));
        }

        let complete = {
            let mut state = self.state.lock();
            state.frames += 1;
            let buf = state.partial.entry(device.id.clone()).or_default();
            buf.extend_from_slice(frame);
            let assembled = buf.clone();
            let complete = self.complete_request(device, &assembled);
            if let Some(req) = &complete {
                state.partial.remove(&device.id);
                state.requests.push(req.clone());
            }
            complete
        };

        let group = device.signal_group().to_string();
        let bus = self.bus.clone();
        tokio::spawn(async move { bus.success(&group, DID_WRITE_VALUE, None) });

        if let Some(request) = complete {
            let responder = Arc::clone(&*self.responder.lock());
            let scripted = responder(&request);
            self.answer(device, scripted);
        }
        Ok(())
    }
}
