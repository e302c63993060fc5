//! Domain types shared by every lockwire crate.
//!
//! Nothing here performs I/O: devices, actions, signed tokens, terminal
//! envelopes, task/runner status and the stable error codes surfaced to UI layers.

mod domain;
pub use domain::*;

mod kind;
pub use kind::*;
