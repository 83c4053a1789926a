//! Wire messages exchanged with player agents and front-controller callers.
//!
//! All bodies are JSON with camelCase field names. Agents receive a board
//! snapshot with every decision request, so they never have to track state
//! between calls.

use serde::{Deserialize, Serialize};

use crate::board::Location;

/// One territory as agents and status readers see it: owner by display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTerritory {
    pub location: Location,
    pub owner: Option<String>,
    pub armies: u32,
}

/// Why a deploy request is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    YourTurn,
    PreviousAttemptFailed,
}

/// Why a begin-attack request is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeginAttackStatus {
    YourTurn,
    PreviousAttackRequestFailed,
}

/// `POST /deployArmy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployArmyRequest {
    pub board: Vec<BoardTerritory>,
    pub status: DeploymentStatus,
    pub armies_remaining: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployArmyResponse {
    pub desired_location: Location,
}

/// `POST /beginAttack`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginAttackRequest {
    pub board: Vec<BoardTerritory>,
    pub status: BeginAttackStatus,
}

/// An agent's attack decision. `from` and `to` may be omitted when declining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginAttackResponse {
    pub will_attack: bool,
    #[serde(default)]
    pub from: Option<Location>,
    #[serde(default)]
    pub to: Option<Location>,
}

impl BeginAttackResponse {
    pub fn attack(from: Location, to: Location) -> Self {
        BeginAttackResponse {
            will_attack: true,
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn hold() -> Self {
        BeginAttackResponse {
            will_attack: false,
            from: None,
            to: None,
        }
    }
}

/// `POST /continueAttacking`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueAttackRequest {
    pub board: Vec<BoardTerritory>,
    pub attacking_territory: BoardTerritory,
    pub defending_territory: BoardTerritory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinueAttackResponse {
    pub continue_attacking: bool,
}

/// `POST /gameOver`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameOverRequest {
    pub final_board: Vec<BoardTerritory>,
    pub game_duration: String,
    pub winner_name: String,
    /// Entries of the form `name (score)`, lowest score first.
    pub final_scores: Vec<String>,
}

/// `POST /join` on the front controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub name: String,
    pub callback_base_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub token: String,
}

/// `POST /startgame` on the front controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    pub secret_code: String,
}
