use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub type ConnectionId = uuid::Uuid;

/// Room joined when the addressable path is empty.
pub const LOBBY: &str = "lobby";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomIdError {
    #[error("room id must not be empty")]
    Empty,
    #[error("path must start with '/': {0:?}")]
    RelativePath(String),
}

/// Case-sensitive, non-empty room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    pub fn lobby() -> Self {
        Self(LOBBY.to_owned())
    }

    /// Derives the room from a pathname: `/abc` is room `abc`, `/` is the lobby.
    pub fn from_path(path: &str) -> Result<Self, RoomIdError> {
        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| RoomIdError::RelativePath(path.to_owned()))?;
        if rest.is_empty() {
            Ok(Self::lobby())
        } else {
            Ok(Self(rest.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.is_empty() {
            Err(RoomIdError::Empty)
        } else {
            Ok(Self(value))
        }
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl From<RoomId> for String {
    fn from(room_id: RoomId) -> Self {
        room_id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
