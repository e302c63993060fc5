//! Terminal session layer.
//!
//! - [`SignalBus`]: turns push-style transport callbacks into sequential waits.
//! - [`TokenSelector`]: picks the signed token used for an action.
//! - [`TerminalSession`]: one guarded request/response exchange with a terminal.
//!
//! Platform pieces (radio transport, device discovery, secure storage, native
//! crypto) are consumed through the traits in [`transport`], [`directory`],
//! [`store`] and [`codec`].

pub mod codec;
pub mod directory;
pub mod error;
pub mod metrics;
pub mod session;
pub mod signal;
pub mod store;
pub mod token;
pub mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use codec::NativeCodec;
pub use directory::{DeviceDirectory, MemoryDirectory};
pub use error::{AuthError, ProtocolError, SessionError, SignalError, TransportError};
pub use metrics::SessionMetrics;
pub use session::{
    ActiveSession, SessionConfig, SessionContext, SessionContextBuilder, TerminalSession,
};
pub use signal::{Outcome, SignalBus};
pub use store::{MemoryTokenStore, TokenStore};
pub use token::{DemoIdentity, TokenCache, TokenSelector};
pub use transport::Transport;
