mod config;
pub use config::SessionConfig;

mod context;
pub use context::{ActiveSession, SessionContext, SessionContextBuilder};

mod terminal;
pub use terminal::TerminalSession;
