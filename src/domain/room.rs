use crate::domain::PeerId;
use crate::error::{Result, SessionError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of characters in a room code.
pub const ROOM_CODE_LEN: usize = 4;

const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Domain entity: Human-shareable room identifier.
///
/// Invariant: exactly four characters, each `A`-`Z`. Generated locally
/// before registering as host; the host requests it as its peer id, so
/// clients can address the host by room code alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomCode(String);

impl RoomCode {
    /// Generate a random room code.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate a random room code from the given RNG.
    pub fn generate_with(rng: &mut impl Rng) -> Self {
        let code: String = (0..ROOM_CODE_LEN)
            .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parse a room code from a string, validating the invariant.
    pub fn parse(s: &str) -> Result<Self> {
        if s.len() != ROOM_CODE_LEN || !s.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(SessionError::InvalidRoomCode(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The peer id a host registers under: the room code itself.
    pub fn as_peer_id(&self) -> PeerId {
        PeerId::new(self.0.clone())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomCode {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_satisfies_invariant() {
        for _ in 0..100 {
            let code = RoomCode::generate();
            assert_eq!(code.as_str().len(), ROOM_CODE_LEN);
            assert!(code.as_str().bytes().all(|b| b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_parse_valid() {
        let code = RoomCode::parse("ABCD").unwrap();
        assert_eq!(code.as_str(), "ABCD");
        assert_eq!(code.as_peer_id(), PeerId::new("ABCD"));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert!(RoomCode::parse("ABC").is_err());
        assert!(RoomCode::parse("ABCDE").is_err());
        assert!(RoomCode::parse("").is_err());
    }

    #[test]
    fn test_parse_rejects_non_uppercase() {
        assert!(RoomCode::parse("abcd").is_err());
        assert!(RoomCode::parse("AB1D").is_err());
        assert!(RoomCode::parse("AB D").is_err());
    }

    #[test]
    fn test_from_str() {
        let code: RoomCode = "WXYZ".parse().unwrap();
        assert_eq!(code.to_string(), "WXYZ");
    }
}
