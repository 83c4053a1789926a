//! Game state management.
//!
//! `Game` is the single source of truth for one match: it owns the board,
//! the active and removed rosters, and the phase. Every mutation goes through
//! one of its methods, and each method either applies completely or leaves
//! the state untouched. Rule violations are reported as values, never panics.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Adjacency, Board, BoardError, Location, Territory, MIN_ATTACKING_ARMIES};
use crate::player::{Player, PlayerToken};
use crate::protocol::{BoardTerritory, GameStatus, PlayerInfo};
use crate::resolve::{resolve_battle, Battle};

/// Lifecycle of a match. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GamePhase {
    /// Created, not yet accepting players.
    Initializing,
    Joining,
    /// Deployment and combat both happen in this phase.
    Attacking,
    GameOver,
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GamePhase::Initializing => "Initializing",
            GamePhase::Joining => "Joining",
            GamePhase::Attacking => "Attacking",
            GamePhase::GameOver => "GameOver",
        };
        f.write_str(name)
    }
}

/// Per-game settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    pub height: u32,
    pub width: u32,
    /// Armies each player deploys before combat.
    pub starting_armies: u32,
    pub adjacency: Adjacency,
    /// Dice seed (0 = use entropy).
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            height: 10,
            width: 10,
            starting_armies: 5,
            adjacency: Adjacency::Orthogonal,
            seed: 0,
        }
    }
}

/// Errors for calls made in the wrong phase or with bad identities.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("operation requires phase {expected}, but the game is in {actual}")]
    InvalidState { expected: GamePhase, actual: GamePhase },

    #[error("a player named '{0}' has already joined")]
    DuplicateName(String),

    #[error("player names must not be empty")]
    EmptyName,

    #[error("invalid board: {0}")]
    InvalidBoard(#[from] BoardError),
}

/// Why an attack was refused. The board is unchanged whenever one of these is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidAttack {
    #[error("attacks are only allowed while the game is in Attacking, not {0}")]
    WrongPhase(GamePhase),

    #[error("unknown player token")]
    UnknownPlayer,

    #[error("no territory at {0}")]
    UnknownTerritory(Location),

    #[error("attacking territory {0} is not yours")]
    NotOwner(Location),

    #[error("cannot attack your own territory {0}")]
    OwnTerritory(Location),

    #[error("territory {0} has no defender to attack")]
    NoDefender(Location),

    #[error("{from} does not border {to}")]
    NotAdjacent { from: Location, to: Location },

    #[error("{location} needs at least 2 armies to attack, has {armies}")]
    NotEnoughArmies { location: Location, armies: u32 },
}

/// Result of a valid attack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackReport {
    pub from: Location,
    pub to: Location,
    pub battle: Battle,
    /// The defending territory changed hands.
    pub conquered: bool,
    /// The attacker may attack again between the same two territories.
    pub can_continue: bool,
    /// Armies left on each side after the battle (and any move across).
    pub attacker_armies: u32,
    pub defender_armies: u32,
}

impl fmt::Display for AttackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: attacker lost {}, defender lost {}",
            self.from, self.to, self.battle.attacker_losses, self.battle.defender_losses
        )?;
        if self.conquered {
            write!(f, ", territory conquered with {} armies", self.defender_armies)?;
        }
        Ok(())
    }
}

/// One match: board, rosters, phase, and the dice.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    board: Board,
    phase: GamePhase,
    players: Vec<Player>,
    removed_players: Vec<Player>,
    rng: SmallRng,
    started_at: Option<Instant>,
    ended_at: Option<Instant>,
}

impl Game {
    /// Creates a game with an empty board in the `Initializing` phase.
    ///
    /// Fails if the configured board dimensions are unusable.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let board = Board::new(config.height, config.width, config.adjacency)?;
        let rng = if config.seed != 0 {
            SmallRng::seed_from_u64(config.seed)
        } else {
            SmallRng::from_entropy()
        };
        Ok(Game {
            board,
            config,
            phase: GamePhase::Initializing,
            players: Vec::new(),
            removed_players: Vec::new(),
            rng,
            started_at: None,
            ended_at: None,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Active players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Players booted from the game, kept for the record.
    pub fn removed_players(&self) -> &[Player] {
        &self.removed_players
    }

    fn expect_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(GameError::InvalidState {
                expected,
                actual: self.phase,
            })
        }
    }

    /// Opens the game for joining. Only valid once, before any player exists.
    pub fn start_joining(&mut self) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Initializing)?;
        self.phase = GamePhase::Joining;
        Ok(())
    }

    /// Registers a player and returns a copy of it, including its fresh token.
    pub fn add_player(&mut self, name: &str, callback_address: &str) -> Result<Player, GameError> {
        self.expect_phase(GamePhase::Joining)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::EmptyName);
        }
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::DuplicateName(name.to_string()));
        }
        let player = Player::new(name, callback_address, self.config.starting_armies);
        self.players.push(player.clone());
        Ok(player)
    }

    /// Closes joining. Deployment and combat follow in the `Attacking` phase.
    pub fn start_game(&mut self) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Joining)?;
        self.phase = GamePhase::Attacking;
        Ok(())
    }

    /// Records the moment combat begins.
    pub fn mark_combat_started(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Moves to the terminal phase and records the end time.
    pub fn set_game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.ended_at = Some(Instant::now());
    }

    /// Time between the start of combat and the end of the game.
    pub fn duration(&self) -> Duration {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => end.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        }
    }

    pub fn get_player(&self, token: PlayerToken) -> Option<&Player> {
        self.players.iter().find(|p| p.token == token)
    }

    fn player_mut(&mut self, token: PlayerToken) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.token == token)
    }

    /// Returns true if `token` belongs to a player still in the active roster.
    pub fn is_active(&self, token: PlayerToken) -> bool {
        self.get_player(token).is_some()
    }

    /// Armies the player still has to deploy. Unknown players have none.
    pub fn get_player_remaining_armies(&self, token: PlayerToken) -> u32 {
        self.get_player(token).map_or(0, |p| p.remaining_armies)
    }

    pub fn get_num_territories(&self, token: PlayerToken) -> usize {
        self.board.territories_owned_by(token).count()
    }

    /// Armies currently stationed on the player's territories.
    pub fn get_num_placed_armies(&self, token: PlayerToken) -> u32 {
        self.board.armies_owned_by(token)
    }

    /// Armies the deployment phase must place before combat can begin.
    pub fn deployment_target(&self) -> u32 {
        self.config.starting_armies * self.players.len() as u32
    }

    /// True once every active player has deployed all of its armies.
    pub fn is_all_armies_placed(&self) -> bool {
        self.players.iter().all(|p| p.remaining_armies == 0)
    }

    /// Deploys one army for `token` at `location`.
    ///
    /// Returns false, without changing anything, when the game is not in
    /// `Attacking`, the player is unknown or has nothing left to place, or the
    /// board rejects the placement.
    pub fn try_place_army(&mut self, token: PlayerToken, location: Location) -> bool {
        if self.phase != GamePhase::Attacking || self.get_player_remaining_armies(token) == 0 {
            return false;
        }
        if self.board.place_army(token, location, 1).is_err() {
            return false;
        }
        if let Some(player) = self.player_mut(token) {
            player.remaining_armies -= 1;
        }
        true
    }

    /// Checks an attack against the rules without rolling any dice.
    fn validate_attack(
        &self,
        token: PlayerToken,
        from: Location,
        to: Location,
    ) -> Result<(), InvalidAttack> {
        if self.phase != GamePhase::Attacking {
            return Err(InvalidAttack::WrongPhase(self.phase));
        }
        if !self.is_active(token) {
            return Err(InvalidAttack::UnknownPlayer);
        }
        let attacker = self
            .board
            .get_territory(from)
            .map_err(|_| InvalidAttack::UnknownTerritory(from))?;
        let defender = self
            .board
            .get_territory(to)
            .map_err(|_| InvalidAttack::UnknownTerritory(to))?;
        if !attacker.is_owned_by(token) {
            return Err(InvalidAttack::NotOwner(from));
        }
        if defender.is_owned_by(token) {
            return Err(InvalidAttack::OwnTerritory(to));
        }
        if defender.owner.is_none() || defender.armies == 0 {
            return Err(InvalidAttack::NoDefender(to));
        }
        if !self.board.is_adjacent(from, to) {
            return Err(InvalidAttack::NotAdjacent { from, to });
        }
        if attacker.armies < MIN_ATTACKING_ARMIES {
            return Err(InvalidAttack::NotEnoughArmies {
                location: from,
                armies: attacker.armies,
            });
        }
        Ok(())
    }

    /// Attacks `to` from `from` on behalf of `token` and resolves one battle.
    ///
    /// When the defender runs out of armies the attacker moves in with as many
    /// armies as it rolled dice, always leaving at least one behind.
    pub fn try_attack(
        &mut self,
        token: PlayerToken,
        from: Location,
        to: Location,
    ) -> Result<AttackReport, InvalidAttack> {
        self.validate_attack(token, from, to)?;
        let (attacker, defender) = self
            .board
            .territory_pair_mut(from, to)
            .map_err(|err| match err {
                BoardError::SameTerritory(_) => InvalidAttack::OwnTerritory(to),
                BoardError::NotFound(loc) => InvalidAttack::UnknownTerritory(loc),
                _ => InvalidAttack::UnknownTerritory(to),
            })?;
        let battle = resolve_battle(attacker.armies, defender.armies, &mut self.rng)
            .ok_or(InvalidAttack::NoDefender(to))?;

        attacker.armies -= battle.attacker_losses;
        defender.armies -= battle.defender_losses;
        let conquered = defender.armies == 0;
        if conquered {
            // A conquering attacker lost no armies and kept more than it rolled.
            let moved = battle.attacker_dice().min(attacker.armies - 1);
            attacker.armies -= moved;
            defender.transfer(token, moved);
        }

        Ok(AttackReport {
            from,
            to,
            battle,
            conquered,
            can_continue: !conquered && attacker.armies >= MIN_ATTACKING_ARMIES,
            attacker_armies: attacker.armies,
            defender_armies: defender.armies,
        })
    }

    /// True if the player owns a territory that could legally attack a bordering enemy.
    pub fn player_can_attack(&self, token: PlayerToken) -> bool {
        if self.phase != GamePhase::Attacking || !self.is_active(token) {
            return false;
        }
        self.board
            .territories_owned_by(token)
            .filter(|t| t.can_launch_attack())
            .any(|t| {
                self.board
                    .neighbours(t.location)
                    .any(|n| n.owner.is_some_and(|owner| owner != token) && n.armies > 0)
            })
    }

    /// True if any active player could attack.
    pub fn any_player_can_attack(&self) -> bool {
        self.players.iter().any(|p| self.player_can_attack(p.token))
    }

    /// Removes a player: its territories become unowned with no armies, and it
    /// moves to the removed roster. Returns the removed player.
    pub fn boot_player(&mut self, token: PlayerToken) -> Option<Player> {
        let index = self.players.iter().position(|p| p.token == token)?;
        self.board.clear_owner(token);
        let player = self.players.remove(index);
        self.removed_players.push(player.clone());
        Some(player)
    }

    fn owner_names(&self) -> HashMap<PlayerToken, &str> {
        self.players
            .iter()
            .chain(self.removed_players.iter())
            .map(|p| (p.token, p.name.as_str()))
            .collect()
    }

    fn project(names: &HashMap<PlayerToken, &str>, t: &Territory) -> BoardTerritory {
        BoardTerritory {
            location: t.location,
            owner: t.owner.and_then(|o| names.get(&o).map(|n| n.to_string())),
            armies: t.armies,
        }
    }

    /// Copy of the board with owners by name, as sent to agents.
    pub fn board_snapshot(&self) -> Vec<BoardTerritory> {
        let names = self.owner_names();
        self.board
            .territories()
            .iter()
            .map(|t| Self::project(&names, t))
            .collect()
    }

    /// A single territory with its owner by name.
    pub fn board_territory(&self, location: Location) -> Option<BoardTerritory> {
        let names = self.owner_names();
        self.board
            .get_territory(location)
            .ok()
            .map(|t| Self::project(&names, t))
    }

    /// A detached, point-in-time copy of the whole game.
    pub fn get_game_status(&self) -> GameStatus {
        let player_info = self
            .players
            .iter()
            .map(|p| {
                let info = PlayerInfo {
                    num_territories: self.get_num_territories(p.token),
                    num_armies: self.get_num_placed_armies(p.token),
                };
                (p.name.clone(), info)
            })
            .collect();
        GameStatus {
            players: self.players.iter().map(|p| p.name.clone()).collect(),
            game_state: self.phase,
            board: self.board_snapshot(),
            player_info,
        }
    }
}
