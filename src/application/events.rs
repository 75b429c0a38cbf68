use crate::domain::{PeerId, Role, RoomCode};

/// Boundary signals surfaced to the embedding application, drained via
/// [`crate::application::Session::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The rendezvous service acknowledged the host registration.
    RoomCreated(PeerId),

    /// A peer link opened. On the host side `peer_id` names the client;
    /// on the client side `room_code` names the room that was joined.
    PeerConnected {
        role: Role,
        peer_id: Option<PeerId>,
        room_code: Option<RoomCode>,
    },

    /// A peer link closed.
    PeerDisconnected(PeerId),

    /// A recoverable failure, already mapped to a user-facing message.
    ConnectionError(String),

    /// Game state received from the host (client side).
    StateReceived { from: PeerId, data: String },

    /// Player input received from a client (host side).
    InputReceived { from: PeerId, data: String },

    /// This peer won the election and is now the host. Surviving peers
    /// are expected to reach the same conclusion and dial us.
    BecomeHost { self_id: PeerId, peers: Vec<PeerId> },

    /// Another peer won the election; we are reconnecting to it.
    NewHost { new_host_id: PeerId },

    /// No migration candidate remains; the session is over.
    ConnectionLost,
}
