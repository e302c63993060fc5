mod cache;
pub use cache::TokenCache;

mod selector;
pub use selector::{DemoIdentity, TokenSelector};
