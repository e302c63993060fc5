use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};

use lockwire_model::{Action, CredentialId, Device, DeviceId, SignedToken, ValidityWindow};
use tracing::{debug, warn};

use super::TokenCache;
use crate::{codec::NativeCodec, error::AuthError};

/// Built-in identity used to sign tokens locally for an offline demo terminal.
#[derive(Clone, Debug)]
pub struct DemoIdentity {
    pub device: DeviceId,
    pub credential: CredentialId,
    pub private_key: Vec<u8>,
    pub lifetime: Duration,
}

impl DemoIdentity {
    pub fn new(
        device: impl Into<DeviceId>,
        credential: impl Into<CredentialId>,
        private_key: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            device: device.into(),
            credential: credential.into(),
            private_key: private_key.into(),
            lifetime: Duration::from_secs(3600),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }
}

/// Picks the signed token sent with a request.
///
/// Priority, first match wins:
/// 1. a cached token for exactly `(device, action)`;
/// 2. a cached maintenance token for the device, repurposed for `action`;
/// 3. a locally signed token when the device is a known demo terminal.
///
/// Among several credentials holding a token for the same key, the first one whose
/// validity has started is used, else the first one at all. Tokens issued before
/// validity windows existed carry windows in the future and must still work.
pub struct TokenSelector {
    cache: TokenCache,
    codec: Arc<dyn NativeCodec>,
    demo: Vec<DemoIdentity>,
}

impl TokenSelector {
    pub fn new(cache: TokenCache, codec: Arc<dyn NativeCodec>) -> Self {
        Self {
            cache,
            codec,
            demo: Vec::new(),
        }
    }

    pub fn with_demo(mut self, identity: DemoIdentity) -> Self {
        self.demo.push(identity);
        self
    }

    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Resolves the token for `action` against the current clock.
    pub fn resolve(
        &self,
        device: &Device,
        action: Action,
        payload: &[u8],
    ) -> Result<SignedToken, AuthError> {
        self.resolve_at(device, action, payload, SystemTime::now())
    }

    /// Resolves the token for `action` as of `now`.
    ///
    /// For request-carrying actions the token payload is replaced by `payload`.
    pub fn resolve_at(
        &self,
        device: &Device,
        action: Action,
        payload: &[u8],
        now: SystemTime,
    ) -> Result<SignedToken, AuthError> {
        let token = if let Some(token) = self.pick(&device.id, action, now)? {
            debug!(
                device = %device.id,
                %action,
                credential = %token.credential_id,
                "exact token selected"
            );
            token
        } else if let Some(token) = self.pick(&device.id, Action::Maintenance, now)? {
            debug!(
                device = %device.id,
                %action,
                credential = %token.credential_id,
                "maintenance token repurposed"
            );
            token.repurpose(action)
        } else if let Some(demo) = self.demo.iter().find(|d| d.device == device.id) {
            debug!(device = %device.id, %action, "demo token synthesized");
            self.synthesize(demo, action, payload, now)?
        } else {
            return Err(AuthError::TokenNotFound {
                device: device.id.clone(),
                action,
            });
        };

        if action.carries_request() {
            Ok(token.with_payload(payload))
        } else {
            Ok(token)
        }
    }

    fn pick(
        &self,
        device: &DeviceId,
        action: Action,
        now: SystemTime,
    ) -> Result<Option<SignedToken>, AuthError> {
        let candidates = self
            .cache
            .candidates(device, action)
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let mut first = None;
        for (credential, bytes) in candidates {
            match self.codec.decode_token(&bytes) {
                Ok(token) if token.validity.has_started(now) => return Ok(Some(token)),
                Ok(token) => {
                    if first.is_none() {
                        first = Some(token);
                    }
                }
                Err(e) => {
                    warn!(
                        %device,
                        %action,
                        %credential,
                        error = %e,
                        "cached token does not decode; skipped"
                    );
                }
            }
        }

        if let Some(token) = &first {
            debug!(
                %device,
                %action,
                credential = %token.credential_id,
                "no started token; using first cached"
            );
        }
        Ok(first)
    }

    fn synthesize(
        &self,
        demo: &DemoIdentity,
        action: Action,
        payload: &[u8],
        now: SystemTime,
    ) -> Result<SignedToken, AuthError> {
        let mut token = SignedToken {
            credential_id: demo.credential.clone(),
            device_id: demo.device.clone(),
            command: action,
            validity: ValidityWindow::starting_at(now, demo.lifetime),
            payload: if action.carries_request() {
                payload.to_vec()
            } else {
                Vec::new()
            },
            signature: Vec::new(),
        };

        let unsigned = self
            .codec
            .encode_token(&token)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        token.signature = self
            .codec
            .sign(&unsigned, &demo.private_key)
            .map_err(|e| AuthError::Signing(e.to_string()))?;
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mock::FakeCodec, store::MemoryTokenStore};
    use lockwire_model::Link;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn device() -> Device {
        Device::new("lock-1", "Front door", Link::Ble)
    }

    fn token(credential: &str, command: Action, from: u64) -> SignedToken {
        SignedToken {
            credential_id: credential.into(),
            device_id: "lock-1".into(),
            command,
            validity: ValidityWindow::new(at(from), at(from + 1_000)),
            payload: b"issued".to_vec(),
            signature: b"sig".to_vec(),
        }
    }

    fn selector() -> TokenSelector {
        let cache = TokenCache::new(Arc::new(MemoryTokenStore::new()));
        TokenSelector::new(cache, Arc::new(FakeCodec))
    }

    fn cache_token(sel: &TokenSelector, action: Action, t: &SignedToken) {
        let bytes = FakeCodec.encode_token(t).unwrap();
        sel.cache()
            .put(&t.device_id, action, &t.credential_id, &bytes)
            .unwrap();
    }

    #[test]
    fn exact_token_beats_maintenance_and_demo() {
        let sel = selector().with_demo(DemoIdentity::new("lock-1", "demo", b"k".to_vec()));
        cache_token(&sel, Action::Access, &token("cred-a", Action::Access, 0));
        cache_token(&sel, Action::Maintenance, &token("cred-m", Action::Maintenance, 0));

        let got = sel.resolve_at(&device(), Action::Access, b"req", at(10)).unwrap();
        assert_eq!(got.credential_id, CredentialId::from("cred-a"));
        assert_eq!(got.command, Action::Access);
        assert_eq!(got.payload, b"req".to_vec());
    }

    #[test]
    fn maintenance_token_is_repurposed_before_demo() {
        let sel = selector().with_demo(DemoIdentity::new("lock-1", "demo", b"k".to_vec()));
        cache_token(&sel, Action::Maintenance, &token("cred-m", Action::Maintenance, 0));

        let got = sel.resolve_at(&device(), Action::SetTime, b"t", at(10)).unwrap();
        assert_eq!(got.credential_id, CredentialId::from("cred-m"));
        assert_eq!(got.command, Action::SetTime);
        assert_eq!(got.payload, b"t".to_vec());
    }

    #[test]
    fn demo_token_is_signed_locally() {
        let sel = selector().with_demo(DemoIdentity::new("lock-1", "demo", b"k".to_vec()));

        let got = sel.resolve_at(&device(), Action::GetInfo, b"", at(10)).unwrap();
        assert_eq!(got.credential_id, CredentialId::from("demo"));
        assert_eq!(got.command, Action::GetInfo);
        assert!(got.validity.contains(at(10)));
        assert!(!got.signature.is_empty());
    }

    #[test]
    fn unknown_device_without_tokens_fails() {
        let sel = selector().with_demo(DemoIdentity::new("lock-9", "demo", b"k".to_vec()));

        let err = sel.resolve_at(&device(), Action::Access, b"", at(10)).unwrap_err();
        assert_eq!(
            err,
            AuthError::TokenNotFound {
                device: "lock-1".into(),
                action: Action::Access
            }
        );
    }

    #[test]
    fn started_token_is_preferred_over_earlier_credential() {
        let sel = selector();
        cache_token(&sel, Action::Access, &token("cred-a", Action::Access, 500));
        cache_token(&sel, Action::Access, &token("cred-b", Action::Access, 5));

        let got = sel.resolve_at(&device(), Action::Access, b"", at(10)).unwrap();
        assert_eq!(got.credential_id, CredentialId::from("cred-b"));
    }

    #[test]
    fn falls_back_to_first_token_when_none_started() {
        let sel = selector();
        cache_token(&sel, Action::Access, &token("cred-b", Action::Access, 900));
        cache_token(&sel, Action::Access, &token("cred-a", Action::Access, 500));

        let got = sel.resolve_at(&device(), Action::Access, b"", at(10)).unwrap();
        assert_eq!(got.credential_id, CredentialId::from("cred-a"));
    }

    #[test]
    fn oss_mobile_actions_keep_issued_payload() {
        let sel = selector();
        cache_token(
            &sel,
            Action::OssMobileRead,
            &token("cred-a", Action::OssMobileRead, 0),
        );

        let got = sel
            .resolve_at(&device(), Action::OssMobileRead, b"ignored", at(10))
            .unwrap();
        assert_eq!(got.payload, b"issued".to_vec());
    }

    #[test]
    fn undecodable_cache_entries_are_skipped() {
        let sel = selector();
        sel.cache()
            .put(&"lock-1".into(), Action::Access, &"cred-a".into(), b"garbage")
            .unwrap();
        cache_token(&sel, Action::Access, &token("cred-b", Action::Access, 0));

        let got = sel.resolve_at(&device(), Action::Access, b"", at(10)).unwrap();
        assert_eq!(got.credential_id, CredentialId::from("cred-b"));
    }
}
