mod config;
mod events;
mod join_guard;
mod session;

pub use config::{SessionConfig, DEFAULT_JOIN_TIMEOUT};
pub use events::SessionEvent;
pub use join_guard::JoinTimeoutGuard;
pub use session::Session;
