//! Device workflows built from [`TaskRunner`](lockwire_exec::TaskRunner) pipelines.
//!
//! - [`FlowContext::synchronize_device`]: refresh tokens, push configuration, set the
//!   clock, collect and upload the event log.
//! - [`FlowContext::update_firmware`]: compare versions, transfer the image in chunks,
//!   commit.
//! - [`FlowContext::bulk_sync`]: several synchronizations at once; they contend for the
//!   single terminal session.

mod config;
pub use config::FlowConfig;

mod error;
pub use error::{FlowError, RemoteError};

mod remote;
pub use remote::{FirmwareImage, IssuedToken, RemoteApi};

mod credentials;
pub use credentials::{Credential, CredentialSync, TokenRefresh};

mod flows;
pub use flows::{BulkReport, FlowContext, SyncTarget, tasks};

#[cfg(any(test, feature = "mock"))]
pub mod mock;
