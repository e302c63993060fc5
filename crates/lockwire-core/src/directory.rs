use std::{collections::HashMap, sync::Arc};

use lockwire_model::{Device, DeviceId};
use parking_lot::RwLock;
use tracing::trace;

/// Lookup of terminals found by discovery.
pub trait DeviceDirectory: Send + Sync + 'static {
    fn lookup(&self, id: &DeviceId) -> Option<Device>;
}

/// In-memory device directory, fed by a discovery collaborator.
#[derive(Clone, Default)]
pub struct MemoryDirectory {
    inner: Arc<RwLock<HashMap<DeviceId, Device>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a device (called when discovery sees it).
    pub fn upsert(&self, device: Device) {
        let mut inner = self.inner.write();
        trace!(device = %device.id, "device upserted");
        inner.insert(device.id.clone(), device);
    }

    /// Drops a device (called when discovery loses it).
    pub fn prune(&self, id: &DeviceId) -> Option<Device> {
        let mut inner = self.inner.write();
        inner.remove(id)
    }

    /// All known devices, in no particular order.
    pub fn list(&self) -> Vec<Device> {
        let inner = self.inner.read();
        inner.values().cloned().collect()
    }
}

impl DeviceDirectory for MemoryDirectory {
    fn lookup(&self, id: &DeviceId) -> Option<Device> {
        let inner = self.inner.read();
        inner.get(id).cloned()
    }
}
