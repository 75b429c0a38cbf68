use crate::domain::{Role, RoleState};
use crate::infrastructure::{PayloadKind, SignalingError};

/// Session-level errors.
///
/// Signaling failures and join timeouts are recoverable by retrying
/// create/join; election exhaustion is terminal for the session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("{0}")]
    Signaling(#[from] SignalingError),

    #[error("Connection timed out - room may not exist")]
    JoinTimeout,

    #[error("No migration candidate remains")]
    ElectionExhausted,

    #[error("Room code already in use: {0}")]
    DuplicateRoomCode(String),

    #[error("Invalid room code: {0}")]
    InvalidRoomCode(String),

    #[error("Operation requires the {required} role (session is {actual})")]
    RoleViolation { required: Role, actual: RoleState },

    #[error("Session is already {0}; create/join requires an unbound session")]
    AlreadyBound(RoleState),

    #[error("{kind} payloads cannot be sent by a {role}")]
    WrongPayloadKind { kind: PayloadKind, role: Role },

    #[error("No open connection to the host")]
    NotConnected,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
