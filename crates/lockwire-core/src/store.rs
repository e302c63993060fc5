use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::error::ProtocolError;

/// Persisted key/value store (platform keychain) holding cached tokens.
///
/// Writes must be atomic per key; the session layer does no extra coordination.
pub trait TokenStore: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProtocolError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), ProtocolError>;
    fn delete(&self, key: &str) -> Result<(), ProtocolError>;
    /// Keys starting with `prefix` (all keys for `None`), in ascending order.
    fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, ProtocolError>;
}

/// Ordered in-memory [`TokenStore`].
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    inner: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ProtocolError> {
        let inner = self.inner.read();
        Ok(inner.get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), ProtocolError> {
        let mut inner = self.inner.write();
        inner.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ProtocolError> {
        let mut inner = self.inner.write();
        inner.remove(key);
        Ok(())
    }

    fn list_keys(&self, prefix: Option<&str>) -> Result<Vec<String>, ProtocolError> {
        let inner = self.inner.read();
        let prefix = prefix.unwrap_or("");
        Ok(inner
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}
