use async_trait::async_trait;
use lockwire_model::{ConnectionState, Device};

use crate::error::TransportError;

/// Radio link to terminals (BLE characteristics, NFC APDU exchange).
///
/// Implementations own the connection state of every device. Receive-side callbacks
/// are reported by posting into the [`SignalBus`](crate::SignalBus) the transport was
/// built with, using the device's [`signal_group`](Device::signal_group):
/// - [`DID_WRITE_VALUE`](crate::signal::DID_WRITE_VALUE) once a transmitted frame is acknowledged;
/// - [`DID_UPDATE_VALUE`](crate::signal::DID_UPDATE_VALUE) with the complete reply bytes;
/// - [`SignalBus::abort_group`](crate::SignalBus::abort_group) when the link drops.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Current connectivity of `device`.
    fn state(&self, device: &Device) -> ConnectionState;

    /// Establishes the link; resolves once the device is connected.
    async fn connect(&self, device: &Device) -> Result<(), TransportError>;

    /// Tears the link down.
    async fn disconnect(&self, device: &Device) -> Result<(), TransportError>;

    /// Largest frame `transmit` accepts for `device`.
    fn max_frame_size(&self, device: &Device) -> usize;

    /// Queues one frame for writing. Completion is signalled through the bus.
    async fn transmit(&self, device: &Device, frame: &[u8]) -> Result<(), TransportError>;
}
