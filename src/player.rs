//! Player identity.
//!
//! Every player gets a random token when joining. The token is the credential
//! for all engine calls on that player's behalf; the name is for display only.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability credential identifying one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerToken(Uuid);

impl PlayerToken {
    /// Generates a fresh random token.
    pub fn generate() -> Self {
        PlayerToken(Uuid::new_v4())
    }
}

impl fmt::Display for PlayerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for PlayerToken {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(PlayerToken)
    }
}

/// A joined player as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub token: PlayerToken,
    /// Base address of the player's callback agent.
    pub callback_address: String,
    /// Armies still waiting to be deployed.
    pub remaining_armies: u32,
}

impl Player {
    pub fn new(name: impl Into<String>, callback_address: impl Into<String>, armies: u32) -> Self {
        Player {
            name: name.into(),
            token: PlayerToken::generate(),
            callback_address: callback_address.into(),
            remaining_armies: armies,
        }
    }
}
