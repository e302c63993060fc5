//! # Event subscribers
//!
//! [`Subscribe`] is the extension point for reacting to runner events (logging,
//! metrics, UI progress). A [`SubscriberSet`] drives each subscriber from its own
//! worker and queue, so a slow subscriber never blocks a runner.

mod subscribe;
pub use subscribe::Subscribe;

mod set;
pub use set::SubscriberSet;
