use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a physical terminal.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Physical link used to reach a terminal.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Link {
    /// Bluetooth LE notify/write characteristics.
    Ble,
    /// NFC APDU exchange.
    Nfc,
}

/// Connectivity of a device as reported by its transport.
///
/// Owned by the transport; sessions only read it and ask the transport to change it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// A terminal known to the device directory.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Stable identifier.
    pub id: DeviceId,
    /// Human-readable name (advertised name, label from configuration).
    pub name: String,
    /// How the terminal is reached.
    pub link: Link,
}

impl Device {
    pub fn new(id: impl Into<DeviceId>, name: impl Into<String>, link: Link) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            link,
        }
    }

    /// SignalBus group used for every wait tied to this device.
    #[inline]
    pub fn signal_group(&self) -> &str {
        self.id.as_str()
    }
}
