use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two payload kinds carried over peer links. State flows host to
/// clients; input flows client to host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    State,
    Input,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayloadKind::State => write!(f, "state"),
            PayloadKind::Input => write!(f, "input"),
        }
    }
}

/// Wire envelope for every payload: `{"kind":"state"|"input","data":"..."}`.
///
/// The data field is opaque to this layer; the game interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub kind: PayloadKind,
    pub data: String,
}

impl Envelope {
    pub fn new(kind: PayloadKind, data: impl Into<String>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    pub fn state(data: impl Into<String>) -> Self {
        Self::new(PayloadKind::State, data)
    }

    pub fn input(data: impl Into<String>) -> Self {
        Self::new(PayloadKind::Input, data)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
