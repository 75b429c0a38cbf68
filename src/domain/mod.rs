mod connection;
mod election;
mod membership;
mod peer;
mod role;
mod room;

pub use connection::{Connection, ConnectionRegistry, ConnectionState};
pub use election::elect;
pub use membership::{MembershipSource, MembershipTracker};
pub use peer::PeerId;
pub use role::{Role, RoleState};
pub use room::{RoomCode, ROOM_CODE_LEN};
