use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable, enumerable error code attached to every user-visible failure.
///
/// UI layers map these to messages; they never match on error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Another terminal session is in flight.
    Unavailable,
    /// The device directory has no such device.
    DeviceNotFound,
    /// A wait or exchange exceeded its deadline.
    Timeout,
    /// A pending wait was force-failed (connection dropped, session aborted).
    Aborted,
    /// Connect/disconnect/transmit failure.
    TransportFailure,
    /// Operation requires a connected device.
    NotConnected,
    /// Service or characteristic missing on the device.
    CharacteristicMissing,
    /// Frame could not be reassembled.
    MalformedFrame,
    /// Message could not be decoded or encoded.
    DecodeFailure,
    /// Internal state does not allow the operation.
    InvalidState,
    /// Bad arguments to an API.
    InvalidArguments,
    /// Persistent store failure.
    StorageFailure,
    /// The terminal rejected the action.
    ApplicationStatus,
    /// No usable signed token for the action.
    TokenNotFound,
    /// Signing a token failed.
    SigningFailure,
    /// Credential validity window has expired.
    CredentialExpired,
    /// Remote API refused the credential.
    Unauthorized,
    /// Remote API call failed.
    RemoteFailure,
    /// A non-failable task stopped the runner.
    TaskFailed,
    /// The operation was cancelled.
    Cancelled,
}

impl ErrorCode {
    /// Returns a short stable label (snake_case) for logs, metrics and UI lookup.
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorCode::Unavailable => "unavailable",
            ErrorCode::DeviceNotFound => "device_not_found",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Aborted => "aborted",
            ErrorCode::TransportFailure => "transport_failure",
            ErrorCode::NotConnected => "not_connected",
            ErrorCode::CharacteristicMissing => "characteristic_missing",
            ErrorCode::MalformedFrame => "malformed_frame",
            ErrorCode::DecodeFailure => "decode_failure",
            ErrorCode::InvalidState => "invalid_state",
            ErrorCode::InvalidArguments => "invalid_arguments",
            ErrorCode::StorageFailure => "storage_failure",
            ErrorCode::ApplicationStatus => "application_status",
            ErrorCode::TokenNotFound => "token_not_found",
            ErrorCode::SigningFailure => "signing_failure",
            ErrorCode::CredentialExpired => "credential_expired",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::RemoteFailure => "remote_failure",
            ErrorCode::TaskFailed => "task_failed",
            ErrorCode::Cancelled => "cancelled",
        }
    }

    /// Returns `true` for codes produced by the transport/protocol layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ErrorCode::Timeout
                | ErrorCode::Aborted
                | ErrorCode::TransportFailure
                | ErrorCode::NotConnected
                | ErrorCode::CharacteristicMissing
                | ErrorCode::MalformedFrame
                | ErrorCode::DecodeFailure
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Errors that can report their stable [`ErrorCode`].
pub trait Coded {
    fn code(&self) -> ErrorCode;
}
