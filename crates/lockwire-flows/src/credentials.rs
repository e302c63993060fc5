use std::{sync::Arc, time::SystemTime};

use lockwire_core::TokenCache;
use lockwire_model::{CredentialId, DeviceId, ValidityWindow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{FlowError, RemoteApi, RemoteError};

/// A mobile credential and the period it may be used in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub validity: ValidityWindow,
}

impl Credential {
    pub fn new(id: impl Into<CredentialId>, validity: ValidityWindow) -> Self {
        Self {
            id: id.into(),
            validity,
        }
    }
}

/// Result of a token refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRefresh {
    /// Fresh tokens were cached.
    Refreshed(usize),
    /// The backend refused the credential; previously cached tokens stay in use.
    Cached,
}

/// Refreshes the tokens of a credential into the token cache.
#[derive(Clone)]
pub struct CredentialSync {
    remote: Arc<dyn RemoteApi>,
    tokens: TokenCache,
}

impl CredentialSync {
    pub fn new(remote: Arc<dyn RemoteApi>, tokens: TokenCache) -> Self {
        Self { remote, tokens }
    }

    pub async fn refresh(
        &self,
        credential: &Credential,
        device: &DeviceId,
    ) -> Result<TokenRefresh, FlowError> {
        self.refresh_at(credential, device, SystemTime::now()).await
    }

    /// Fetches and caches the tokens `credential` holds for `device`.
    ///
    /// An `Unauthorized` answer keeps the cached tokens, unless the credential's
    /// validity has ended as of `now`: then every token of the credential is purged
    /// and [`FlowError::CredentialExpired`] is returned.
    pub async fn refresh_at(
        &self,
        credential: &Credential,
        device: &DeviceId,
        now: SystemTime,
    ) -> Result<TokenRefresh, FlowError> {
        match self.remote.fetch_tokens(&credential.id, device).await {
            Ok(issued) => {
                for token in &issued {
                    self.tokens.put(device, token.action, &credential.id, &token.token)?;
                }
                info!(
                    credential = %credential.id,
                    %device,
                    count = issued.len(),
                    "tokens refreshed"
                );
                Ok(TokenRefresh::Refreshed(issued.len()))
            }
            Err(RemoteError::Unauthorized) if credential.validity.has_expired(now) => {
                let purged = self.tokens.purge_credential(&credential.id)?;
                warn!(
                    credential = %credential.id,
                    purged,
                    "credential expired; cached tokens purged"
                );
                Err(FlowError::CredentialExpired(credential.id.clone()))
            }
            Err(RemoteError::Unauthorized) => {
                debug!(
                    credential = %credential.id,
                    %device,
                    "credential refused; keeping cached tokens"
                );
                Ok(TokenRefresh::Cached)
            }
            Err(e) => Err(e.into()),
        }
    }
}
