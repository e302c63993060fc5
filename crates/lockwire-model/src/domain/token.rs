use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::{Action, CredentialId, DeviceId};

/// Time span during which a token (or credential) is usable.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityWindow {
    #[serde(with = "super::time_serde")]
    pub not_before: SystemTime,
    #[serde(with = "super::time_serde")]
    pub not_after: SystemTime,
}

impl ValidityWindow {
    pub fn new(not_before: SystemTime, not_after: SystemTime) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// Window that starts at `from` and lasts `lifetime`.
    pub fn starting_at(from: SystemTime, lifetime: Duration) -> Self {
        Self::new(from, from + lifetime)
    }

    /// Returns `true` once `now` has reached the start of the window.
    #[inline]
    pub fn has_started(&self, now: SystemTime) -> bool {
        self.not_before <= now
    }

    /// Returns `true` once `now` is past the end of the window.
    #[inline]
    pub fn has_expired(&self, now: SystemTime) -> bool {
        self.not_after < now
    }

    #[inline]
    pub fn contains(&self, now: SystemTime) -> bool {
        self.has_started(now) && !self.has_expired(now)
    }
}

/// Signed capability authorizing one action against one terminal.
///
/// Produced and verified by the native crypto library; the session layer only
/// reads [`command`](SignedToken::command) and rewrites the command or payload
/// before re-encoding.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedToken {
    /// Credential that requested the token.
    pub credential_id: CredentialId,
    /// Terminal the token is bound to.
    pub device_id: DeviceId,
    /// Authorized command.
    pub command: Action,
    /// Validity window.
    pub validity: ValidityWindow,
    /// Request payload carried inside the token.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payload: Vec<u8>,
    /// Opaque signature bytes.
    #[serde(default)]
    pub signature: Vec<u8>,
}

impl SignedToken {
    /// Overwrites the command, turning a maintenance token into a token for `action`.
    pub fn repurpose(mut self, action: Action) -> Self {
        self.command = action;
        self
    }

    /// Replaces the carried payload with the caller's request bytes.
    pub fn with_payload(mut self, payload: &[u8]) -> Self {
        self.payload.clear();
        self.payload.extend_from_slice(payload);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn at(secs: u64) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn window_bounds() {
        let w = ValidityWindow::new(at(100), at(200));
        assert!(!w.has_started(at(99)));
        assert!(w.has_started(at(100)));
        assert!(w.contains(at(150)));
        assert!(!w.has_expired(at(200)));
        assert!(w.has_expired(at(201)));
    }

    #[test]
    fn repurpose_and_payload_replacement() {
        let token = SignedToken {
            credential_id: "cred-1".into(),
            device_id: "lock-1".into(),
            command: Action::Maintenance,
            validity: ValidityWindow::new(at(0), at(10)),
            payload: vec![9, 9, 9],
            signature: vec![1],
        };

        let token = token.repurpose(Action::SetTime).with_payload(&[1, 2]);
        assert_eq!(token.command, Action::SetTime);
        assert_eq!(token.payload, vec![1, 2]);
        assert_eq!(token.signature, vec![1]);
    }
}
