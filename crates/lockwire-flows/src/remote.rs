use async_trait::async_trait;
use lockwire_model::{Action, CredentialId, DeviceId};
use serde::{Deserialize, Serialize};

use crate::RemoteError;

/// Signed token issued by the backend for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub action: Action,
    /// Encoded token, stored as-is in the token cache.
    pub token: Vec<u8>,
}

/// Firmware image offered for a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareImage {
    pub version: String,
    pub bytes: Vec<u8>,
}

/// Backend consumed by workflows. Wire details belong to the implementation.
#[async_trait]
pub trait RemoteApi: Send + Sync + 'static {
    /// Tokens `credential` currently holds for `device`.
    async fn fetch_tokens(
        &self,
        credential: &CredentialId,
        device: &DeviceId,
    ) -> Result<Vec<IssuedToken>, RemoteError>;

    /// Configuration blob to push to the terminal.
    async fn fetch_device_config(&self, device: &DeviceId) -> Result<Vec<u8>, RemoteError>;

    /// Newest firmware published for `device`, if any.
    async fn fetch_firmware(&self, device: &DeviceId) -> Result<Option<FirmwareImage>, RemoteError>;

    /// Uploads an event log read from the terminal.
    async fn report_events(&self, device: &DeviceId, events: &[u8]) -> Result<(), RemoteError>;
}
