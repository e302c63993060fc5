//! # SignalBus: callback-to-wait rendezvous
//!
//! Transport delegates push their results (`didWriteValueFor`, `didUpdateValueFor`, ...)
//! while the session logic wants to read "connect, write, wait for reply" top to bottom.
//! [`SignalBus`] sits between the two: a waiter registers a one-shot slot keyed by
//! `(group, name)` and suspends; the callback resolves the slot.
//!
//! ## Rules
//! - At most one pending signal per key; a second [`add`](SignalBus::add) fails with
//!   [`SignalError::AlreadyExists`].
//! - An outcome posted while nobody is registered is kept as history, one entry per key.
//!   A newer post overwrites an unconsumed one.
//! - [`wait`](SignalBus::wait) with `from_history = true` consumes a buffered outcome
//!   without suspending.
//! - [`abort_group`](SignalBus::abort_group) fails every pending signal of a group with
//!   [`SignalError::Aborted`], so waits do not hang when a connection drops.
//! - Waits carry no deadline of their own; callers wrap them in `tokio::time::timeout`.
//!
//! Waits must run on a different task than the one delivering callbacks, otherwise the
//! callback can never be delivered.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::trace;

use crate::error::{SignalError, TransportError};

/// Posted by the transport once a written frame is acknowledged.
pub const DID_WRITE_VALUE: &str = "didWriteValueFor";
/// Posted by the transport once a complete reply has been received.
pub const DID_UPDATE_VALUE: &str = "didUpdateValueFor";

/// Result posted for a signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(Option<Vec<u8>>),
    Failure(TransportError),
    Aborted,
}

impl Outcome {
    fn into_result(self) -> Result<Option<Vec<u8>>, SignalError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(e) => Err(SignalError::Failed(e)),
            Outcome::Aborted => Err(SignalError::Aborted),
        }
    }
}

type Key = (String, String);

fn key(group: &str, name: &str) -> Key {
    (group.to_string(), name.to_string())
}

struct Pending {
    id: u64,
    tx: Option<oneshot::Sender<Outcome>>,
    rx: Option<oneshot::Receiver<Outcome>>,
}

#[derive(Default)]
struct Inner {
    pending: HashMap<Key, Pending>,
    history: HashMap<Key, Outcome>,
    next_id: u64,
}

impl Inner {
    fn register(&mut self, key: Key) -> &mut Pending {
        let (tx, rx) = oneshot::channel();
        self.next_id += 1;
        let id = self.next_id;
        self.pending.entry(key).or_insert(Pending {
            id,
            tx: Some(tx),
            rx: Some(rx),
        })
    }
}

/// Grouped, named one-shot rendezvous points with a one-entry history per key.
///
/// Cheap to clone; clones share the same slots.
#[derive(Clone, Default)]
pub struct SignalBus {
    inner: Arc<Mutex<Inner>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pending signal for `(group, name)`.
    pub fn add(&self, group: &str, name: &str) -> Result<(), SignalError> {
        let mut inner = self.inner.lock();
        let key = key(group, name);
        if inner.pending.contains_key(&key) {
            return Err(SignalError::AlreadyExists {
                group: group.to_string(),
                name: name.to_string(),
            });
        }
        inner.register(key);
        trace!(group, name, "signal added");
        Ok(())
    }

    /// Suspends until an outcome is posted for `(group, name)`.
    ///
    /// With `from_history` a buffered outcome is consumed immediately. A key that was
    /// not added beforehand is registered on the spot. The pending slot is removed once
    /// the wait completes or the returned future is dropped.
    pub async fn wait(
        &self,
        group: &str,
        name: &str,
        from_history: bool,
    ) -> Result<Option<Vec<u8>>, SignalError> {
        let key = key(group, name);
        let (id, rx) = {
            let mut inner = self.inner.lock();
            if from_history && let Some(outcome) = inner.history.remove(&key) {
                inner.pending.remove(&key);
                trace!(group, name, "signal consumed from history");
                return outcome.into_result();
            }

            let pending = inner.register(key.clone());
            let rx = pending.rx.take().ok_or_else(|| SignalError::AlreadyExists {
                group: group.to_string(),
                name: name.to_string(),
            })?;
            (pending.id, rx)
        };

        let _guard = PendingGuard {
            bus: self,
            key: &key,
            id,
        };
        rx.await.unwrap_or(Outcome::Aborted).into_result()
    }

    /// Deregisters the pending signal and drops buffered history for the key.
    pub fn remove(&self, group: &str, name: &str) {
        let key = key(group, name);
        let mut inner = self.inner.lock();
        inner.pending.remove(&key);
        inner.history.remove(&key);
    }

    /// Resolves `(group, name)` with a value.
    pub fn success(&self, group: &str, name: &str, value: Option<Vec<u8>>) {
        self.post(group, name, Outcome::Success(value));
    }

    /// Resolves `(group, name)` with a transport failure.
    pub fn failure(&self, group: &str, name: &str, error: TransportError) {
        self.post(group, name, Outcome::Failure(error));
    }

    /// Force-fails every pending signal of `group`; returns how many were aborted.
    pub fn abort_group(&self, group: &str) -> usize {
        let mut inner = self.inner.lock();
        let mut aborted = 0;
        for ((g, _), pending) in inner.pending.iter_mut() {
            if g != group {
                continue;
            }
            if let Some(tx) = pending.tx.take() {
                let _ = tx.send(Outcome::Aborted);
                aborted += 1;
            }
        }
        trace!(group, aborted, "signal group aborted");
        aborted
    }

    /// Returns `true` if a signal is registered for the key.
    pub fn is_pending(&self, group: &str, name: &str) -> bool {
        self.inner.lock().pending.contains_key(&key(group, name))
    }

    /// Returns `true` if an unconsumed outcome is buffered for the key.
    pub fn has_history(&self, group: &str, name: &str) -> bool {
        self.inner.lock().history.contains_key(&key(group, name))
    }

    fn post(&self, group: &str, name: &str, outcome: Outcome) {
        let key = key(group, name);
        let mut inner = self.inner.lock();

        let tx = inner.pending.get_mut(&key).and_then(|p| p.tx.take());
        let unclaimed = match tx {
            Some(tx) => tx.send(outcome).err(),
            None => Some(outcome),
        };

        if let Some(outcome) = unclaimed {
            if inner.history.insert(key, outcome).is_some() {
                trace!(group, name, "unconsumed history overwritten");
            } else {
                trace!(group, name, "outcome buffered as history");
            }
        }
    }
}

/// Drops the pending slot when a wait completes or is cancelled.
struct PendingGuard<'a> {
    bus: &'a SignalBus,
    key: &'a Key,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.bus.inner.lock();
        if inner.pending.get(self.key).is_some_and(|p| p.id == self.id) {
            inner.pending.remove(self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const G: &str = "lock-1";

    #[tokio::test]
    async fn add_then_wait_resolves_with_success() {
        let bus = SignalBus::new();
        bus.add(G, DID_UPDATE_VALUE).unwrap();

        let waiter = {
            let bus = bus.clone();
            tokio::spawn(async move { bus.wait(G, DID_UPDATE_VALUE, false).await })
        };
        bus.success(G, DID_UPDATE_VALUE, Some(vec![1, 2, 3]));

        assert_eq!(waiter.await.unwrap(), Ok(Some(vec![1, 2, 3])));
        assert!(!bus.is_pending(G, DID_UPDATE_VALUE));
    }

    #[tokio::test]
    async fn outcome_posted_after_add_but_before_wait_is_not_lost() {
        let bus = SignalBus::new();
        bus.add(G, DID_WRITE_VALUE).unwrap();
        bus.success(G, DID_WRITE_VALUE, None);

        assert_eq!(bus.wait(G, DID_WRITE_VALUE, false).await, Ok(None));
        assert!(!bus.has_history(G, DID_WRITE_VALUE));
    }

    #[tokio::test]
    async fn failure_is_raised_to_waiter() {
        let bus = SignalBus::new();
        bus.add(G, DID_WRITE_VALUE).unwrap();
        bus.failure(
            G,
            DID_WRITE_VALUE,
            TransportError::CharacteristicMissing("rx".into()),
        );

        let err = bus.wait(G, DID_WRITE_VALUE, false).await.unwrap_err();
        assert_eq!(
            err,
            SignalError::Failed(TransportError::CharacteristicMissing("rx".into()))
        );
    }

    #[test]
    fn duplicate_add_is_rejected() {
        let bus = SignalBus::new();
        bus.add(G, DID_WRITE_VALUE).unwrap();
        assert!(matches!(
            bus.add(G, DID_WRITE_VALUE),
            Err(SignalError::AlreadyExists { .. })
        ));
        bus.add("lock-2", DID_WRITE_VALUE).unwrap();
    }

    #[test]
    fn remove_is_idempotent_and_clears_history() {
        let bus = SignalBus::new();
        bus.add(G, DID_WRITE_VALUE).unwrap();
        bus.success(G, DID_UPDATE_VALUE, Some(vec![7]));

        bus.remove(G, DID_WRITE_VALUE);
        bus.remove(G, DID_WRITE_VALUE);
        bus.remove(G, DID_UPDATE_VALUE);

        assert!(!bus.is_pending(G, DID_WRITE_VALUE));
        assert!(!bus.has_history(G, DID_UPDATE_VALUE));
        bus.add(G, DID_WRITE_VALUE).unwrap();
    }

    #[tokio::test]
    async fn history_is_consumed_once_and_overwritten_by_newer_post() {
        let bus = SignalBus::new();
        bus.success(G, DID_UPDATE_VALUE, Some(vec![1]));
        bus.success(G, DID_UPDATE_VALUE, Some(vec![2]));
        assert!(bus.has_history(G, DID_UPDATE_VALUE));

        assert_eq!(bus.wait(G, DID_UPDATE_VALUE, true).await, Ok(Some(vec![2])));
        assert!(!bus.has_history(G, DID_UPDATE_VALUE));
        assert!(!bus.is_pending(G, DID_UPDATE_VALUE));
    }

    #[tokio::test(start_paused = true)]
    async fn wait_without_history_flag_ignores_buffer() {
        let bus = SignalBus::new();
        bus.success(G, DID_UPDATE_VALUE, Some(vec![1]));

        let res = tokio::time::timeout(
            Duration::from_secs(1),
            bus.wait(G, DID_UPDATE_VALUE, false),
        )
        .await;
        assert!(res.is_err());
        assert!(bus.has_history(G, DID_UPDATE_VALUE));
        assert!(!bus.is_pending(G, DID_UPDATE_VALUE));
    }

    #[tokio::test]
    async fn abort_group_fails_only_that_group() {
        let bus = SignalBus::new();
        bus.add(G, DID_WRITE_VALUE).unwrap();
        bus.add(G, DID_UPDATE_VALUE).unwrap();
        bus.add("lock-2", DID_UPDATE_VALUE).unwrap();

        assert_eq!(bus.abort_group(G), 2);
        assert_eq!(
            bus.wait(G, DID_WRITE_VALUE, false).await,
            Err(SignalError::Aborted)
        );
        assert_eq!(
            bus.wait(G, DID_UPDATE_VALUE, true).await,
            Err(SignalError::Aborted)
        );
        assert!(bus.is_pending("lock-2", DID_UPDATE_VALUE));
    }

    #[tokio::test(start_paused = true)]
    async fn removing_a_pending_signal_aborts_its_waiter() {
        let bus = SignalBus::new();
        bus.add(G, DID_UPDATE_VALUE).unwrap();

        let remover = {
            let bus = bus.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                bus.remove(G, DID_UPDATE_VALUE);
            }
        };
        let (res, ()) = tokio::join!(bus.wait(G, DID_UPDATE_VALUE, false), remover);

        assert_eq!(res, Err(SignalError::Aborted));
    }
}
