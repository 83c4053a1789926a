//! Turn orchestration.
//!
//! Drives one started `Game` through deployment and combat by asking each
//! active player's agent for decisions in a fixed round-robin order, then
//! scores the survivors and sends everyone the final report. Agents that
//! keep breaking the rules or stop answering are booted and the match goes on
//! without them.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::engine::{AttackReport, Game, GameError, GamePhase};
use crate::player::PlayerToken;
use crate::protocol::client::DEFAULT_REQUEST_TIMEOUT;
use crate::protocol::{
    BeginAttackRequest, BeginAttackStatus, ClientError, ContinueAttackRequest, DeployArmyRequest,
    DeploymentStatus, GameOverRequest, GameStatus, PlayerClient,
};

/// Retry, timeout, and termination policy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Rule-violating answers tolerated within one decision before the player is booted.
    pub max_failed_tries: u32,
    /// Failed or timed-out requests tolerated within one decision before the player is booted.
    pub max_unresponsive_tries: u32,
    /// Time an agent has to answer any single request.
    pub request_timeout: Duration,
    /// Consecutive combat passes without a valid attack before combat ends.
    pub stalemate_passes: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            max_failed_tries: 5,
            max_unresponsive_tries: 3,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            stalemate_passes: 3,
        }
    }
}

/// Final standing of one surviving player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerScore {
    pub name: String,
    pub token: PlayerToken,
    /// `2 * territories + armies`.
    pub score: u32,
    pub territories: usize,
    pub armies: u32,
}

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSummary {
    /// Highest-ranked survivor, if anyone survived.
    pub winner: Option<String>,
    /// Survivors ranked lowest first; the winner is last.
    pub scores: Vec<PlayerScore>,
    /// Time from the start of combat to game over.
    pub duration: Duration,
    /// Names of players booted during the run, in boot order.
    pub booted: Vec<String>,
}

/// The two kinds of failed decision, each with its own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Invalid,
    Unresponsive,
}

/// Failures counted within one decision.
#[derive(Debug, Default)]
struct Strikes {
    invalid: u32,
    unresponsive: u32,
}

impl Strikes {
    /// Counts a failure and returns true once either budget is spent.
    fn record(&mut self, failure: Failure, config: &RunnerConfig) -> bool {
        match failure {
            Failure::Invalid => {
                self.invalid += 1;
                self.invalid >= config.max_failed_tries
            }
            Failure::Unresponsive => {
                self.unresponsive += 1;
                self.unresponsive >= config.max_unresponsive_tries
            }
        }
    }
}

/// Score used to rank survivors.
pub fn score(territories: usize, armies: u32) -> u32 {
    2 * territories as u32 + armies
}

/// Scores every active player, ranked lowest first.
///
/// Ties on score go to the player holding more territories, then to the
/// player who joined earlier; the winner is always the last entry.
pub fn rank_players(game: &Game) -> Vec<PlayerScore> {
    let mut ranked: Vec<(usize, PlayerScore)> = game
        .players()
        .iter()
        .enumerate()
        .map(|(join_order, p)| {
            let territories = game.get_num_territories(p.token);
            let armies = game.get_num_placed_armies(p.token);
            let entry = PlayerScore {
                name: p.name.clone(),
                token: p.token,
                score: score(territories, armies),
                territories,
                armies,
            };
            (join_order, entry)
        })
        .collect();
    ranked.sort_by(|(ja, a), (jb, b)| {
        a.score
            .cmp(&b.score)
            .then(a.territories.cmp(&b.territories))
            .then(jb.cmp(ja))
    });
    ranked.into_iter().map(|(_, entry)| entry).collect()
}

/// Formats a duration as `HH:MM:SS.mmm`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        duration.subsec_millis()
    )
}

/// Runs one match from deployment to the final report.
pub struct GameRunner {
    game: Game,
    clients: HashMap<PlayerToken, Arc<dyn PlayerClient>>,
    config: RunnerConfig,
    status: Option<watch::Sender<GameStatus>>,
    booted: Vec<String>,
}

impl GameRunner {
    /// Creates a runner for a game already moved to `Attacking`.
    pub fn new(
        game: Game,
        clients: HashMap<PlayerToken, Arc<dyn PlayerClient>>,
        config: RunnerConfig,
    ) -> Self {
        GameRunner {
            game,
            clients,
            config,
            status: None,
            booted: Vec::new(),
        }
    }

    /// Publishes a fresh status snapshot on `tx` after every change.
    pub fn with_status_channel(mut self, tx: watch::Sender<GameStatus>) -> Self {
        self.status = Some(tx);
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn into_game(self) -> Game {
        self.game
    }

    /// Plays the whole match: deployment, combat, then scoring and reporting.
    pub async fn run(&mut self) -> Result<GameSummary, GameError> {
        if self.game.phase() != GamePhase::Attacking {
            return Err(GameError::InvalidState {
                expected: GamePhase::Attacking,
                actual: self.game.phase(),
            });
        }
        self.boot_unreachable();
        info!(players = self.game.players().len(), "deploying armies");
        self.deploy_armies().await;
        info!("deployment complete, starting combat");
        self.do_battle().await;
        Ok(self.report_winner().await)
    }

    /// Snapshot of the active roster; each pass iterates this, not the live list.
    fn roster(&self) -> Vec<PlayerToken> {
        self.game.players().iter().map(|p| p.token).collect()
    }

    fn name(&self, token: PlayerToken) -> String {
        self.game
            .get_player(token)
            .map_or_else(|| token.to_string(), |p| p.name.clone())
    }

    fn publish(&self) {
        if let Some(tx) = &self.status {
            tx.send_replace(self.game.get_game_status());
        }
    }

    fn boot(&mut self, token: PlayerToken, reason: &str) {
        if let Some(player) = self.game.boot_player(token) {
            warn!(player = %player.name, reason, "booting player from game");
            self.clients.remove(&token);
            self.booted.push(player.name);
            self.publish();
        }
    }

    fn boot_unreachable(&mut self) {
        let missing: Vec<PlayerToken> = self
            .roster()
            .into_iter()
            .filter(|t| !self.clients.contains_key(t))
            .collect();
        for token in missing {
            self.boot(token, "no agent connection");
        }
    }

    /// Awaits one agent request, giving up after the configured timeout.
    async fn ask<T>(
        &self,
        token: PlayerToken,
        request: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        match tokio::time::timeout(self.config.request_timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(self.name(token))),
        }
    }

    async fn deploy_armies(&mut self) {
        while self.game.board().total_armies() < self.game.deployment_target()
            && !self.game.is_all_armies_placed()
        {
            for token in self.roster() {
                if !self.game.is_active(token) || self.game.get_player_remaining_armies(token) == 0 {
                    continue;
                }
                self.deploy_one(token).await;
            }
        }
    }

    /// Places one army for `token`, retrying with a failure status until the player runs out of tries.
    async fn deploy_one(&mut self, token: PlayerToken) {
        let Some(client) = self.clients.get(&token).cloned() else {
            return;
        };
        let name = self.name(token);
        let mut status = DeploymentStatus::YourTurn;
        let mut strikes = Strikes::default();
        loop {
            let request = DeployArmyRequest {
                board: self.game.board_snapshot(),
                status,
                armies_remaining: self.game.get_player_remaining_armies(token),
            };
            let failure = match self.ask(token, client.deploy_army(&request)).await {
                Ok(response) => {
                    let location = response.desired_location;
                    debug!(player = %name, %location, "player wants to deploy");
                    if self.game.try_place_army(token, location) {
                        self.publish();
                        return;
                    }
                    warn!(player = %name, %location, "invalid deployment");
                    Failure::Invalid
                }
                Err(err) => {
                    warn!(player = %name, error = %err, "deploy request failed");
                    Failure::Unresponsive
                }
            };
            if strikes.record(failure, &self.config) {
                self.boot(token, "too many failed deployments");
                return;
            }
            status = DeploymentStatus::PreviousAttemptFailed;
        }
    }

    fn combat_continues(&self) -> bool {
        self.game.players().len() > 1
            && self.game.phase() == GamePhase::Attacking
            && self.game.any_player_can_attack()
    }

    async fn do_battle(&mut self) {
        self.game.mark_combat_started();
        self.publish();
        let mut idle_passes = 0;
        while self.combat_continues() {
            let mut attacked = false;
            for token in self.roster() {
                if self.game.players().len() <= 1 {
                    break;
                }
                if !self.game.is_active(token) {
                    continue;
                }
                if !self.game.player_can_attack(token) {
                    debug!(player = %self.name(token), "cannot attack");
                    continue;
                }
                attacked |= self.take_turn(token).await;
            }
            if attacked {
                idle_passes = 0;
            } else {
                idle_passes += 1;
                if idle_passes >= self.config.stalemate_passes {
                    info!(passes = idle_passes, "no attacks made, ending combat");
                    break;
                }
            }
        }
        info!("game over");
        self.game.set_game_over();
        self.publish();
    }

    /// One player's combat turn. Returns true if at least one attack was carried out.
    async fn take_turn(&mut self, token: PlayerToken) -> bool {
        let Some(client) = self.clients.get(&token).cloned() else {
            return false;
        };
        let name = self.name(token);
        let mut status = BeginAttackStatus::YourTurn;
        let mut strikes = Strikes::default();
        info!(player = %name, "asking where to attack");
        let mut report: AttackReport = loop {
            let request = BeginAttackRequest {
                board: self.game.board_snapshot(),
                status,
            };
            let failure = match self.ask(token, client.begin_attack(&request)).await {
                Ok(decision) if !decision.will_attack => {
                    info!(player = %name, "holding ground");
                    return false;
                }
                Ok(decision) => match (decision.from, decision.to) {
                    (Some(from), Some(to)) => {
                        info!(player = %name, %from, %to, "player wants to attack");
                        match self.game.try_attack(token, from, to) {
                            Ok(report) => break report,
                            Err(reason) => {
                                warn!(player = %name, %from, %to, %reason, "invalid attack");
                                Failure::Invalid
                            }
                        }
                    }
                    _ => {
                        warn!(player = %name, "attack request is missing a territory");
                        Failure::Invalid
                    }
                },
                Err(err) => {
                    warn!(player = %name, error = %err, "attack request failed");
                    Failure::Unresponsive
                }
            };
            if strikes.record(failure, &self.config) {
                self.boot(token, "too many failed attacks");
                return false;
            }
            status = BeginAttackStatus::PreviousAttackRequestFailed;
        };
        info!(player = %name, result = %report, "attack resolved");
        self.publish();

        while report.can_continue {
            let (Some(attacking), Some(defending)) = (
                self.game.board_territory(report.from),
                self.game.board_territory(report.to),
            ) else {
                break;
            };
            let request = ContinueAttackRequest {
                board: self.game.board_snapshot(),
                attacking_territory: attacking,
                defending_territory: defending,
            };
            match self.ask(token, client.continue_attacking(&request)).await {
                Ok(answer) if answer.continue_attacking => {
                    match self.game.try_attack(token, report.from, report.to) {
                        Ok(next) => {
                            info!(player = %name, result = %next, "kept attacking");
                            report = next;
                            self.publish();
                        }
                        Err(reason) => {
                            warn!(player = %name, %reason, "cannot continue attack");
                            break;
                        }
                    }
                }
                Ok(_) => {
                    info!(player = %name, "retreating");
                    break;
                }
                Err(err) => {
                    warn!(player = %name, error = %err, "continue request failed, ending turn");
                    break;
                }
            }
        }
        true
    }

    async fn report_winner(&mut self) -> GameSummary {
        let duration = self.game.duration();
        let scores = rank_players(&self.game);
        let winner = scores.last().map(|s| s.name.clone());
        info!(
            winner = winner.as_deref().unwrap_or("nobody"),
            duration = %format_duration(duration),
            "reporting results"
        );

        let request = GameOverRequest {
            final_board: self.game.board_snapshot(),
            game_duration: format_duration(duration),
            winner_name: winner.clone().unwrap_or_default(),
            final_scores: scores
                .iter()
                .map(|s| format!("{} ({})", s.name, s.score))
                .collect(),
        };
        for token in self.roster() {
            let Some(client) = self.clients.get(&token).cloned() else {
                continue;
            };
            if let Err(err) = self.ask(token, client.game_over(&request)).await {
                warn!(player = %self.name(token), error = %err, "game over report not delivered");
            }
        }

        GameSummary {
            winner,
            scores,
            duration,
            booted: self.booted.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Adjacency, Location};
    use crate::engine::GameConfig;

    #[test]
    fn strikes_track_budgets_separately() {
        let config = RunnerConfig::default();
        let mut strikes = Strikes::default();
        for _ in 0..4 {
            assert!(!strikes.record(Failure::Invalid, &config));
        }
        assert!(!strikes.record(Failure::Unresponsive, &config));
        assert!(!strikes.record(Failure::Unresponsive, &config));
        assert!(strikes.record(Failure::Unresponsive, &config));
        assert!(strikes.record(Failure::Invalid, &config));
    }

    #[test]
    fn duration_format() {
        assert_eq!(format_duration(Duration::from_millis(0)), "00:00:00.000");
        assert_eq!(format_duration(Duration::from_millis(3_723_045)), "01:02:03.045");
    }

    #[test]
    fn score_formula() {
        assert_eq!(score(0, 0), 0);
        assert_eq!(score(3, 7), 13);
    }

    #[test]
    fn ranking_breaks_ties_explicitly() {
        let mut game = Game::new(GameConfig {
            height: 2,
            width: 3,
            starting_armies: 4,
            adjacency: Adjacency::Orthogonal,
            seed: 1,
        })
        .unwrap();
        game.start_joining().unwrap();
        let first = game.add_player("first", "").unwrap().token;
        let second = game.add_player("second", "").unwrap().token;
        let third = game.add_player("third", "").unwrap().token;
        game.start_game().unwrap();
        // first: one territory, 4 armies -> 6
        for _ in 0..4 {
            game.try_place_army(first, Location::new(0, 0));
        }
        // second: two territories, 2 armies -> 6, wins the tie on territories
        game.try_place_army(second, Location::new(1, 0));
        game.try_place_army(second, Location::new(1, 1));
        // third: one territory, 4 armies -> 6, loses to first on join order
        for _ in 0..4 {
            game.try_place_army(third, Location::new(0, 2));
        }

        let ranked = rank_players(&game);
        let names: Vec<&str> = ranked.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["third", "first", "second"]);
        assert!(ranked.iter().all(|s| s.score == 6));
    }

    #[tokio::test]
    async fn run_requires_started_game() {
        let mut game = Game::new(GameConfig::default()).unwrap();
        game.start_joining().unwrap();
        let mut runner = GameRunner::new(game, HashMap::new(), RunnerConfig::default());
        assert!(matches!(
            runner.run().await,
            Err(GameError::InvalidState { .. })
        ));
    }
}
