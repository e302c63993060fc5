use tokio::sync::broadcast;

use super::Event;

/// Default number of events retained for slow receivers.
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast channel for runner events.
///
/// Publishing never blocks. Events sent while nobody listens are dropped; receivers
/// that fall behind observe `RecvError::Lagged(n)` and skip the `n` oldest events.
/// Cheap to clone; several runners may share one bus.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining up to `capacity` events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver observing events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
