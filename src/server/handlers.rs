use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::{error, info, warn};

use super::AppState;
use crate::engine::{GameError, GamePhase};
use crate::protocol::{ClientError, GameStatus, JoinRequest, JoinResponse, StartGameRequest};
use crate::runner::GameRunner;

/// Reasons a join is refused. All map to `400 Bad Request`.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error("Unable to join game: game is in {0}, not Joining")]
    NotJoining(GamePhase),

    #[error("Unable to join game: agent at {0} did not answer yes")]
    NotThere(String),

    #[error("Unable to join game: {0}")]
    Unreachable(#[from] ClientError),

    #[error("Unable to join game: {0}")]
    Rejected(#[from] GameError),
}

/// Reasons a start is refused. All map to `400 Bad Request`.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("Game not in Joining state")]
    NotJoining,

    #[error("Secret code doesn't match, unable to start game.")]
    SecretMismatch,

    #[error("Unable to start game: {0}")]
    Rejected(#[from] GameError),

    #[error("Game run aborted: {0}")]
    Aborted(String),
}

impl IntoResponse for JoinError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

impl IntoResponse for StartError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, self.to_string()).into_response()
    }
}

/// `GET /status`
pub async fn status(State(state): State<AppState>) -> Json<GameStatus> {
    let inner = &state.inner;
    Json(inner.cache.get_or_refresh(|| inner.status_rx.borrow().clone()))
}

/// `POST /join`
///
/// The liveness check runs before the lobby is locked, so a slow agent does
/// not hold up other joins.
pub async fn join(
    State(state): State<AppState>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, JoinError> {
    let phase = state.current_status().game_state;
    if phase != GamePhase::Joining {
        return Err(JoinError::NotJoining(phase));
    }

    let address = request.callback_base_address.trim();
    let client = state.inner.connector.connect(address)?;
    let there = tokio::time::timeout(
        state.inner.config.runner.request_timeout,
        client.are_you_there(),
    )
    .await
    .map_err(|_| ClientError::Timeout(address.to_string()))??;
    if !there {
        warn!(name = %request.name, %address, "liveness check failed");
        return Err(JoinError::NotThere(address.to_string()));
    }

    let mut lobby = state.inner.lobby.lock().await;
    let game = lobby.game.as_mut().ok_or(JoinError::NotJoining(GamePhase::Attacking))?;
    let player = game.add_player(&request.name, address)?;
    let status = game.get_game_status();
    lobby.clients.insert(player.token, client);
    drop(lobby);

    info!(name = %player.name, %address, "player joined");
    state.publish(status);
    Ok(Json(JoinResponse {
        token: player.token.to_string(),
    }))
}

/// `POST /startgame`
///
/// Runs the entire match before answering. The match runs on its own task,
/// so it still finishes and hands the game back to the lobby if the caller
/// goes away.
pub async fn start_game(
    State(state): State<AppState>,
    Json(request): Json<StartGameRequest>,
) -> Result<StatusCode, StartError> {
    let (game, clients) = {
        let mut lobby = state.inner.lobby.lock().await;
        let joining = lobby
            .game
            .as_ref()
            .is_some_and(|g| g.phase() == GamePhase::Joining);
        if !joining {
            return Err(StartError::NotJoining);
        }
        if request.secret_code != state.inner.config.secret_code {
            warn!("start requested with the wrong secret code");
            return Err(StartError::SecretMismatch);
        }
        let Some(mut game) = lobby.game.take() else {
            return Err(StartError::NotJoining);
        };
        if let Err(err) = game.start_game() {
            lobby.game = Some(game);
            return Err(err.into());
        }
        (game, std::mem::take(&mut lobby.clients))
    };

    info!(players = game.players().len(), "starting game");
    state.publish(game.get_game_status());
    let match_state = state.clone();
    let match_task = tokio::spawn(async move {
        let mut runner = GameRunner::new(game, clients, match_state.inner.config.runner)
            .with_status_channel(match_state.inner.status_tx.clone());
        let outcome = runner.run().await;
        let game = runner.into_game();
        match_state.publish(game.get_game_status());
        match_state.inner.lobby.lock().await.game = Some(game);
        if let Ok(summary) = &outcome {
            info!(
                winner = summary.winner.as_deref().unwrap_or("nobody"),
                booted = summary.booted.len(),
                "game finished"
            );
        }
        outcome
    });

    match match_task.await {
        Ok(outcome) => {
            outcome?;
            Ok(StatusCode::OK)
        }
        Err(err) => {
            error!(error = %err, "game task failed");
            Err(StartError::Aborted(err.to_string()))
        }
    }
}
