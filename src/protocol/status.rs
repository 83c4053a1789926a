//! Point-in-time game status.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::messages::BoardTerritory;
use crate::engine::GamePhase;

/// Per-player totals included in the status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub num_territories: usize,
    pub num_armies: u32,
}

/// A detached copy of the game: later mutations of the game never show up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    /// Active player names in turn order.
    pub players: Vec<String>,
    pub game_state: GamePhase,
    pub board: Vec<BoardTerritory>,
    /// Keyed by player name.
    pub player_info: BTreeMap<String, PlayerInfo>,
}

impl GameStatus {
    /// Status of a server that has no game yet.
    pub fn empty(phase: GamePhase) -> Self {
        GameStatus {
            players: Vec::new(),
            game_state: phase,
            board: Vec::new(),
            player_info: BTreeMap::new(),
        }
    }
}
