use lockwire_core::{ProtocolError, SessionError};
use lockwire_model::{Coded, CredentialId, ErrorCode};
use thiserror::Error;

/// Failures reported by the remote API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The credential was refused.
    #[error("unauthorized")]
    Unauthorized,
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected remote answer: {0}")]
    Unexpected(String),
}

impl Coded for RemoteError {
    fn code(&self) -> ErrorCode {
        match self {
            RemoteError::Unauthorized => ErrorCode::Unauthorized,
            RemoteError::Unavailable(_) | RemoteError::Unexpected(_) => ErrorCode::RemoteFailure,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    #[error("remote: {0}")]
    Remote(#[from] RemoteError),
    /// The credential's validity has ended; its cached tokens were purged.
    #[error("credential '{0}' has expired")]
    CredentialExpired(CredentialId),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid: {0}")]
    Invalid(String),
}

impl Coded for FlowError {
    fn code(&self) -> ErrorCode {
        match self {
            FlowError::Remote(e) => e.code(),
            FlowError::CredentialExpired(_) => ErrorCode::CredentialExpired,
            FlowError::Session(e) => e.code(),
            FlowError::Invalid(_) => ErrorCode::InvalidArguments,
        }
    }
}

impl From<ProtocolError> for FlowError {
    fn from(e: ProtocolError) -> Self {
        FlowError::Session(SessionError::Protocol(e))
    }
}
