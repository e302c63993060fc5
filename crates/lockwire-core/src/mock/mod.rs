//! In-memory fakes for tests and demos.
//!
//! [`FakeCodec`] stands in for the native library with JSON envelopes and a
//! non-cryptographic signature. [`FakeTransport`] plays a terminal: it reassembles
//! frames, hands each decoded request to a scripted responder, and posts the
//! acknowledgements and replies into the [`SignalBus`](crate::SignalBus) from a
//! separate task, the way a radio delegate would.

mod codec;
pub use codec::FakeCodec;

mod transport;
pub use transport::{FakeRequest, FakeTransport, Scripted};
