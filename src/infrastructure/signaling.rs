use crate::domain::PeerId;
use std::fmt;

/// Rendezvous-service failure categories, as reported by the signaling
/// implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalingErrorKind {
    /// The target peer is not registered (the room does not exist).
    RoomNotFound,
    /// The requested peer id is already registered.
    IdTaken,
    /// Network-level failure reaching the rendezvous service.
    Network,
    /// The platform cannot provide the underlying transport.
    TransportUnsupported,
    /// The rendezvous session dropped.
    Disconnected,
    /// The peer id has an invalid format.
    InvalidId,
    /// The service requires a secure transport.
    SslRequired,
    /// The rendezvous service reported an internal error.
    ServerError,
    /// Low-level socket failure.
    SocketError,
    /// The socket closed unexpectedly.
    SocketClosed,
    /// Peer link negotiation failed.
    NegotiationFailed,
    /// Anything the implementation could not classify.
    Other,
}

/// Error emitted by a [`SignalingClient`], either as a `Result` or inside
/// [`SignalingEvent::Error`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingError {
    pub kind: SignalingErrorKind,
    pub detail: Option<String>,
}

impl SignalingError {
    pub fn new(kind: SignalingErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: SignalingErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }

    /// User-facing message for this failure.
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            SignalingErrorKind::RoomNotFound => "Room not found",
            SignalingErrorKind::IdTaken => "Room code already in use",
            SignalingErrorKind::Network => "Connection failed - check your internet",
            SignalingErrorKind::TransportUnsupported => "Transport not supported",
            SignalingErrorKind::Disconnected => "Lost connection to server",
            SignalingErrorKind::InvalidId => "Invalid room code format",
            SignalingErrorKind::SslRequired => "Secure connection required",
            SignalingErrorKind::ServerError => "Server error - try again later",
            SignalingErrorKind::SocketError => "Connection error - try again",
            SignalingErrorKind::SocketClosed => "Connection closed unexpectedly",
            SignalingErrorKind::NegotiationFailed => "Peer connection failed",
            SignalingErrorKind::Other => "Connection failed",
        }
    }
}

impl fmt::Display for SignalingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} ({})", self.user_message(), detail),
            None => write!(f, "{}", self.user_message()),
        }
    }
}

impl std::error::Error for SignalingError {}

/// Events emitted by the signaling transport, observed in the order the
/// transport delivered them per connection. There is no ordering guarantee
/// across different connections.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalingEvent {
    /// Registration with the rendezvous service succeeded; the service
    /// assigned this peer id.
    Opened(PeerId),
    /// A remote peer dialed us (host side).
    IncomingConnection(PeerId),
    /// A link reached the open state.
    ConnectionOpened(PeerId),
    /// Payload received on an open link.
    Data { from: PeerId, payload: Vec<u8> },
    /// A link closed.
    ConnectionClosed(PeerId),
    /// A failure, scoped to one link when `peer` is set, otherwise to the
    /// rendezvous session itself.
    Error {
        peer: Option<PeerId>,
        error: SignalingError,
    },
}

/// Port to the injected signaling transport.
///
/// Implementations own NAT traversal, ICE negotiation, and the
/// rendezvous-service wire protocol; this core only drives the lifecycle
/// and consumes the event stream via [`SignalingClient::poll_events`].
/// All calls are non-blocking; results that depend on the network arrive
/// as events.
pub trait SignalingClient {
    /// Register with the rendezvous service, requesting `desired_id` when
    /// given (hosts request their room code). Completion arrives as
    /// [`SignalingEvent::Opened`].
    fn open(&mut self, desired_id: Option<&str>) -> Result<(), SignalingError>;

    /// Start accepting inbound links. Hosts call this when created and
    /// when a client is promoted during migration.
    fn listen(&mut self) -> Result<(), SignalingError>;

    /// Dial a remote peer. Completion arrives as
    /// [`SignalingEvent::ConnectionOpened`] or an error/close event.
    fn connect(&mut self, target: &PeerId) -> Result<(), SignalingError>;

    /// Send a payload over the open link to `peer`.
    fn send_to(&mut self, peer: &PeerId, payload: &[u8]) -> Result<(), SignalingError>;

    /// Close the link to `peer`. Tolerates absent links.
    fn close(&mut self, peer: &PeerId);

    /// Drop the rendezvous registration and all links. Idempotent.
    fn close_session(&mut self);

    /// Drain pending transport events.
    fn poll_events(&mut self) -> Vec<SignalingEvent>;
}
