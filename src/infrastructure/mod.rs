pub mod message;
pub mod signaling;

pub use message::{Envelope, PayloadKind};
pub use signaling::{SignalingClient, SignalingError, SignalingErrorKind, SignalingEvent};
