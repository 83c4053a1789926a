//! A single cell of the board and its occupant.

use super::location::Location;
use crate::player::PlayerToken;

/// One territory: its location, the owning player (if any), and the armies stationed there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Territory {
    pub location: Location,
    pub owner: Option<PlayerToken>,
    pub armies: u32,
}

impl Territory {
    /// Creates an unowned territory with no armies.
    pub const fn empty(location: Location) -> Self {
        Self {
            location,
            owner: None,
            armies: 0,
        }
    }

    /// Returns true if `token` owns this territory.
    pub fn is_owned_by(&self, token: PlayerToken) -> bool {
        self.owner == Some(token)
    }

    /// Returns true if the territory can launch an attack (needs one army to stay behind).
    pub fn can_launch_attack(&self) -> bool {
        self.owner.is_some() && self.armies >= super::MIN_ATTACKING_ARMIES
    }

    /// Hands the territory to `owner` with exactly `armies` stationed there.
    pub fn transfer(&mut self, owner: PlayerToken, armies: u32) {
        self.owner = Some(owner);
        self.armies = armies;
    }

    /// Resets the territory to unowned with zero armies.
    pub fn clear(&mut self) {
        self.owner = None;
        self.armies = 0;
    }
}
