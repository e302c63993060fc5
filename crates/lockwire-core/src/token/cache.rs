use std::sync::Arc;

use lockwire_model::{Action, CredentialId, DeviceId};
use tracing::debug;

use crate::{error::ProtocolError, store::TokenStore};

const PREFIX: &str = "tokens/";

/// Signed tokens cached per `(device, action, credential)` on top of a [`TokenStore`].
///
/// Keys look like `tokens/{device}/{action}/{credential}`. Several credentials may
/// hold a token for the same `(device, action)`.
#[derive(Clone)]
pub struct TokenCache {
    store: Arc<dyn TokenStore>,
}

impl TokenCache {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Stores (or replaces) the token a credential holds for `(device, action)`.
    pub fn put(
        &self,
        device: &DeviceId,
        action: Action,
        credential: &CredentialId,
        token: &[u8],
    ) -> Result<(), ProtocolError> {
        self.store.put(&entry_key(device, action, credential), token)
    }

    /// Cached tokens for `(device, action)`, ordered by credential id.
    pub fn candidates(
        &self,
        device: &DeviceId,
        action: Action,
    ) -> Result<Vec<(CredentialId, Vec<u8>)>, ProtocolError> {
        let prefix = format!("{PREFIX}{device}/{action}/");
        let mut out = Vec::new();
        for key in self.store.list_keys(Some(&prefix))? {
            let Some(credential) = key.strip_prefix(&prefix) else {
                continue;
            };
            // A key may vanish between listing and reading.
            if let Some(bytes) = self.store.get(&key)? {
                out.push((CredentialId::from(credential), bytes));
            }
        }
        Ok(out)
    }

    /// Deletes every token held by `credential`; returns how many were removed.
    pub fn purge_credential(&self, credential: &CredentialId) -> Result<usize, ProtocolError> {
        let suffix = format!("/{credential}");
        let keys: Vec<String> = self
            .store
            .list_keys(Some(PREFIX))?
            .into_iter()
            .filter(|k| k.ends_with(&suffix))
            .collect();
        for key in &keys {
            self.store.delete(key)?;
        }
        debug!(credential = %credential, removed = keys.len(), "credential tokens purged");
        Ok(keys.len())
    }

    /// Deletes every token cached for `device`; returns how many were removed.
    pub fn purge_device(&self, device: &DeviceId) -> Result<usize, ProtocolError> {
        let keys = self.store.list_keys(Some(&format!("{PREFIX}{device}/")))?;
        for key in &keys {
            self.store.delete(key)?;
        }
        debug!(device = %device, removed = keys.len(), "device tokens purged");
        Ok(keys.len())
    }
}

fn entry_key(device: &DeviceId, action: Action, credential: &CredentialId) -> String {
    format!("{PREFIX}{device}/{action}/{credential}")
}
