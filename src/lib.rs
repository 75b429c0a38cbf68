// Domain layer (core)
pub mod domain;

// Application layer (use cases)
pub mod application;

// Infrastructure layer (ports)
pub mod infrastructure;

pub mod error;

// Re-exports for convenience
pub use application::{Session, SessionConfig, SessionEvent, DEFAULT_JOIN_TIMEOUT};
pub use domain::{
    elect, Connection, ConnectionRegistry, ConnectionState, MembershipSource, MembershipTracker,
    PeerId, Role, RoleState, RoomCode,
};
pub use error::{Result, SessionError};
pub use infrastructure::{
    Envelope, PayloadKind, SignalingClient, SignalingError, SignalingErrorKind, SignalingEvent,
};
