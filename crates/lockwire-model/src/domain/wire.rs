use std::fmt;

use serde::{Deserialize, Serialize};

/// Application status code returned by the terminal next to its reply payload.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppStatus(pub u16);

impl AppStatus {
    /// The only success value.
    pub const OK: AppStatus = AppStatus(0);

    #[inline]
    pub fn is_ok(&self) -> bool {
        *self == Self::OK
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// Request envelope sent to a terminal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalRequest {
    /// Encoded signed token.
    pub signed_token: Vec<u8>,
    /// Application payload sent next to the token.
    #[serde(default)]
    pub application_payload: Vec<u8>,
}

/// Reply envelope received from a terminal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalReply {
    pub application_status: AppStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_payload: Option<Vec<u8>>,
}

impl TerminalReply {
    pub fn ok(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            application_status: AppStatus::OK,
            response_payload: Some(payload.into()),
        }
    }

    pub fn rejected(status: AppStatus) -> Self {
        Self {
            application_status: status,
            response_payload: None,
        }
    }
}
