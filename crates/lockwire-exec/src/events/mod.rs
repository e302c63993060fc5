//! # Runner events
//!
//! [`Event`]s describe every state change of a [`TaskRunner`](crate::TaskRunner) and are
//! broadcast on a [`Bus`]. Each event carries a process-wide `seq` so consumers can
//! restore ordering across runners.

mod bus;
pub use bus::Bus;

mod event;
pub use event::{Event, EventKind};
