//! In-memory backend for tests and demos.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use lockwire_model::{Action, CredentialId, DeviceId};
use parking_lot::Mutex;

use crate::{FirmwareImage, IssuedToken, RemoteApi, RemoteError};

#[derive(Default)]
struct State {
    tokens: HashMap<(CredentialId, DeviceId), Vec<IssuedToken>>,
    refused: HashSet<CredentialId>,
    configs: HashMap<DeviceId, Vec<u8>>,
    firmware: HashMap<DeviceId, FirmwareImage>,
    reported: Vec<(DeviceId, Vec<u8>)>,
    offline: bool,
}

/// Scriptable [`RemoteApi`].
#[derive(Default)]
pub struct MemoryRemote {
    state: Mutex<State>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(
        &self,
        credential: impl Into<CredentialId>,
        device: impl Into<DeviceId>,
        action: Action,
        token: Vec<u8>,
    ) {
        self.state
            .lock()
            .tokens
            .entry((credential.into(), device.into()))
            .or_default()
            .push(IssuedToken { action, token });
    }

    /// Makes every token request for `credential` fail with `Unauthorized`.
    pub fn refuse(&self, credential: impl Into<CredentialId>) {
        self.state.lock().refused.insert(credential.into());
    }

    pub fn set_config(&self, device: impl Into<DeviceId>, config: Vec<u8>) {
        self.state.lock().configs.insert(device.into(), config);
    }

    pub fn publish_firmware(&self, device: impl Into<DeviceId>, image: FirmwareImage) {
        self.state.lock().firmware.insert(device.into(), image);
    }

    /// While offline every call fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    pub fn reported(&self) -> Vec<(DeviceId, Vec<u8>)> {
        self.state.lock().reported.clone()
    }

    fn online(&self) -> Result<parking_lot::MutexGuard<'_, State>, RemoteError> {
        let state = self.state.lock();
        if state.offline {
            return Err(RemoteError::Unavailable("backend offline".into()));
        }
        Ok(state)
    }
}

#[async_trait]
impl RemoteApi for MemoryRemote {
    async fn fetch_tokens(
        &self,
        credential: &CredentialId,
        device: &DeviceId,
    ) -> Result<Vec<IssuedToken>, RemoteError> {
        let state = self.online()?;
        if state.refused.contains(credential) {
            return Err(RemoteError::Unauthorized);
        }
        Ok(state
            .tokens
            .get(&(credential.clone(), device.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_device_config(&self, device: &DeviceId) -> Result<Vec<u8>, RemoteError> {
        self.online()?
            .configs
            .get(device)
            .cloned()
            .ok_or_else(|| RemoteError::Unexpected(format!("no configuration for '{device}'")))
    }

    async fn fetch_firmware(
        &self,
        device: &DeviceId,
    ) -> Result<Option<FirmwareImage>, RemoteError> {
        Ok(self.online()?.firmware.get(device).cloned())
    }

    async fn report_events(&self, device: &DeviceId, events: &[u8]) -> Result<(), RemoteError> {
        self.online()?
            .reported
            .push((device.clone(), events.to_vec()));
        Ok(())
    }
}
