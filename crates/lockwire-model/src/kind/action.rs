use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command a signed token authorizes against a terminal.
///
/// The set is closed: every request a workflow can send is a variant here,
/// so dispatch is checked at compile time instead of by command name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Open / grant access.
    Access,
    /// Read the OSS mobile credential area.
    OssMobileRead,
    /// Write the OSS mobile credential area.
    OssMobileWrite,
    /// Broad-scoped token; may be repurposed for any other action.
    Maintenance,
    /// Push device configuration.
    SetConfig,
    /// Read back device configuration.
    GetConfig,
    /// Set the terminal clock.
    SetTime,
    /// Drain the terminal's event log.
    ReadEvents,
    /// Query firmware/hardware information.
    GetInfo,
    /// Announce a firmware image (payload: total length).
    FirmwareBegin,
    /// One firmware block (payload: offset + data).
    FirmwareChunk,
    /// Verify and activate the transferred image.
    FirmwareCommit,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::Access,
        Action::OssMobileRead,
        Action::OssMobileWrite,
        Action::Maintenance,
        Action::SetConfig,
        Action::GetConfig,
        Action::SetTime,
        Action::ReadEvents,
        Action::GetInfo,
        Action::FirmwareBegin,
        Action::FirmwareChunk,
        Action::FirmwareCommit,
    ];

    /// Returns the stable wire/storage name of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Access => "access",
            Action::OssMobileRead => "oss-mobile-read",
            Action::OssMobileWrite => "oss-mobile-write",
            Action::Maintenance => "maintenance",
            Action::SetConfig => "set-config",
            Action::GetConfig => "get-config",
            Action::SetTime => "set-time",
            Action::ReadEvents => "read-events",
            Action::GetInfo => "get-info",
            Action::FirmwareBegin => "firmware-begin",
            Action::FirmwareChunk => "firmware-chunk",
            Action::FirmwareCommit => "firmware-commit",
        }
    }

    /// Whether the caller's payload travels inside the signed token.
    ///
    /// The two OSS mobile actions keep the token payload as issued and send the
    /// caller payload next to it in the request envelope instead.
    pub fn carries_request(&self) -> bool {
        !matches!(self, Action::OssMobileRead | Action::OssMobileWrite)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown action: {0}")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_ascii_lowercase();
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == norm)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}
