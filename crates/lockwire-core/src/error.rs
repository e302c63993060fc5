//! Error taxonomy of the session layer.
//!
//! Transport and protocol failures are kept apart from [`SessionError::ApplicationStatus`]:
//! the former mean the exchange did not happen, the latter means the terminal
//! answered and refused the action.

use std::time::Duration;

use lockwire_model::{Action, AppStatus, Coded, DeviceId, ErrorCode};
use thiserror::Error;

/// Radio/link level failures reported by a [`Transport`](crate::Transport).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("disconnect failed: {0}")]
    Disconnect(String),
    #[error("device is not connected")]
    NotConnected,
    #[error("characteristic not found: {0}")]
    CharacteristicMissing(String),
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("transmit failed: {0}")]
    Transmit(String),
}

impl Coded for TransportError {
    fn code(&self) -> ErrorCode {
        match self {
            TransportError::Connect(_)
            | TransportError::Disconnect(_)
            | TransportError::Transmit(_) => ErrorCode::TransportFailure,
            TransportError::NotConnected => ErrorCode::NotConnected,
            TransportError::CharacteristicMissing(_) => ErrorCode::CharacteristicMissing,
            TransportError::MalformedFrame(_) => ErrorCode::MalformedFrame,
        }
    }
}

/// Encoding, decoding and API-usage failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("token store: {0}")]
    Storage(String),
}

impl Coded for ProtocolError {
    fn code(&self) -> ErrorCode {
        match self {
            ProtocolError::Decode(_) | ProtocolError::Encode(_) => ErrorCode::DecodeFailure,
            ProtocolError::InvalidState(_) => ErrorCode::InvalidState,
            ProtocolError::InvalidArguments(_) => ErrorCode::InvalidArguments,
            ProtocolError::Storage(_) => ErrorCode::StorageFailure,
        }
    }
}

/// No usable signed token could be produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("no token for {action} on device {device}")]
    TokenNotFound { device: DeviceId, action: Action },
    #[error("signing demo token failed: {0}")]
    Signing(String),
    #[error("token store: {0}")]
    Store(String),
}

impl Coded for AuthError {
    fn code(&self) -> ErrorCode {
        match self {
            AuthError::TokenNotFound { .. } => ErrorCode::TokenNotFound,
            AuthError::Signing(_) => ErrorCode::SigningFailure,
            AuthError::Store(_) => ErrorCode::StorageFailure,
        }
    }
}

/// Outcome of a failed [`SignalBus`](crate::SignalBus) operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("signal {group}/{name} is already pending")]
    AlreadyExists { group: String, name: String },
    #[error("signal aborted")]
    Aborted,
    #[error(transparent)]
    Failed(#[from] TransportError),
}

impl Coded for SignalError {
    fn code(&self) -> ErrorCode {
        match self {
            SignalError::AlreadyExists { .. } => ErrorCode::InvalidState,
            SignalError::Aborted => ErrorCode::Aborted,
            SignalError::Failed(e) => e.code(),
        }
    }
}

/// Errors returned by [`TerminalSession::run`](crate::TerminalSession::run).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("another terminal session is active")]
    Unavailable,
    #[error("device not found: {0}")]
    DeviceNotFound(DeviceId),
    #[error("terminal did not answer within {0:?}")]
    Timeout(Duration),
    #[error("exchange aborted")]
    Aborted,
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("terminal rejected the action with status {0}")]
    ApplicationStatus(AppStatus),
}

impl SessionError {
    /// Returns `true` when the terminal answered and refused the action.
    pub fn is_application(&self) -> bool {
        matches!(self, SessionError::ApplicationStatus(_))
    }

    /// Status code reported by the terminal, if this is an application rejection.
    pub fn app_status(&self) -> Option<AppStatus> {
        match self {
            SessionError::ApplicationStatus(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<SignalError> for SessionError {
    fn from(e: SignalError) -> Self {
        match e {
            SignalError::AlreadyExists { group, name } => SessionError::Protocol(
                ProtocolError::InvalidState(format!("signal {group}/{name} is already pending")),
            ),
            SignalError::Aborted => SessionError::Aborted,
            SignalError::Failed(e) => SessionError::Transport(e),
        }
    }
}

impl Coded for SessionError {
    fn code(&self) -> ErrorCode {
        match self {
            SessionError::Unavailable => ErrorCode::Unavailable,
            SessionError::DeviceNotFound(_) => ErrorCode::DeviceNotFound,
            SessionError::Timeout(_) => ErrorCode::Timeout,
            SessionError::Aborted => ErrorCode::Aborted,
            SessionError::Transport(e) => e.code(),
            SessionError::Protocol(e) => e.code(),
            SessionError::Auth(e) => e.code(),
            SessionError::ApplicationStatus(_) => ErrorCode::ApplicationStatus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_errors_map_into_session_layer() {
        let e: SessionError = SignalError::Aborted.into();
        assert_eq!(e, SessionError::Aborted);

        let e: SessionError = SignalError::Failed(TransportError::NotConnected).into();
        assert_eq!(e.code(), ErrorCode::NotConnected);

        let e: SessionError = SignalError::AlreadyExists {
            group: "lock-1".into(),
            name: "didUpdateValueFor".into(),
        }
        .into();
        assert_eq!(e.code(), ErrorCode::InvalidState);
    }

    #[test]
    fn application_status_is_distinguishable() {
        let e = SessionError::ApplicationStatus(AppStatus(0x10));
        assert!(e.is_application());
        assert_eq!(e.app_status(), Some(AppStatus(0x10)));
        assert!(!e.code().is_transport());

        let e = SessionError::Timeout(Duration::from_secs(3));
        assert!(!e.is_application());
        assert!(e.code().is_transport());
    }
}
