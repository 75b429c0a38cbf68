use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the star a session is acting as.
///
/// The host originates authoritative state and relays it to all clients;
/// a client talks to the host only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Client => write!(f, "client"),
        }
    }
}

/// Lifecycle state of a session.
///
/// `Unbound` before create/join, `Host`/`Client` while active, `Terminated`
/// after leave or a fatal error. Migration moves `Client` to `Host` in
/// place; it never goes through `Unbound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleState {
    Unbound,
    Host,
    Client,
    Terminated,
}

impl RoleState {
    /// The active role, if any.
    pub fn role(&self) -> Option<Role> {
        match self {
            RoleState::Host => Some(Role::Host),
            RoleState::Client => Some(Role::Client),
            RoleState::Unbound | RoleState::Terminated => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.role().is_some()
    }
}

impl fmt::Display for RoleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleState::Unbound => write!(f, "unbound"),
            RoleState::Host => write!(f, "host"),
            RoleState::Client => write!(f, "client"),
            RoleState::Terminated => write!(f, "terminated"),
        }
    }
}
