//! Front controller.
//!
//! Exposes the game over HTTP: observers poll `/status`, agents register
//! through `/join`, and an operator holding the secret code triggers the
//! match with `/startgame`. The running match owns the `Game`; everyone else
//! reads status snapshots published on a watch channel, so polling never
//! waits on orchestration.

pub mod cache;
pub mod handlers;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tracing::info;

use crate::engine::{Game, GameConfig, GameError};
use crate::player::PlayerToken;
use crate::protocol::{Connector, GameStatus, PlayerClient};
use crate::runner::RunnerConfig;

pub use cache::StatusCache;
pub use handlers::{JoinError, StartError};

/// How long `/status` answers are reused.
pub const STATUS_TTL: Duration = Duration::from_secs(1);

/// Everything the front controller needs to host one game.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Code required by `/startgame`.
    pub secret_code: String,
    pub game: GameConfig,
    pub runner: RunnerConfig,
    pub status_ttl: Duration,
}

impl ServerConfig {
    pub fn new(secret_code: impl Into<String>) -> Self {
        ServerConfig {
            secret_code: secret_code.into(),
            game: GameConfig::default(),
            runner: RunnerConfig::default(),
            status_ttl: STATUS_TTL,
        }
    }
}

/// The game while it is not being played, plus the joined players' agents.
pub(crate) struct Lobby {
    /// `None` while the runner holds the game.
    pub(crate) game: Option<Game>,
    pub(crate) clients: HashMap<PlayerToken, Arc<dyn PlayerClient>>,
}

pub(crate) struct Shared {
    pub(crate) config: ServerConfig,
    pub(crate) connector: Arc<dyn Connector>,
    pub(crate) lobby: Mutex<Lobby>,
    pub(crate) status_tx: watch::Sender<GameStatus>,
    pub(crate) status_rx: watch::Receiver<GameStatus>,
    pub(crate) cache: StatusCache,
}

/// Shared handle passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub(crate) inner: Arc<Shared>,
}

impl AppState {
    /// Creates a game open for joining.
    pub fn new(config: ServerConfig, connector: Arc<dyn Connector>) -> Result<Self, GameError> {
        let mut game = Game::new(config.game)?;
        game.start_joining()?;
        let (status_tx, status_rx) = watch::channel(game.get_game_status());
        let cache = StatusCache::new(config.status_ttl);
        Ok(AppState {
            inner: Arc::new(Shared {
                config,
                connector,
                lobby: Mutex::new(Lobby {
                    game: Some(game),
                    clients: HashMap::new(),
                }),
                status_tx,
                status_rx,
                cache,
            }),
        })
    }

    /// Latest published status, bypassing the cache.
    pub fn current_status(&self) -> GameStatus {
        self.inner.status_rx.borrow().clone()
    }

    pub(crate) fn publish(&self, status: GameStatus) {
        self.inner.status_tx.send_replace(status);
        self.inner.cache.invalidate();
    }
}

/// Routes for the front controller.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/status", get(handlers::status))
        .route("/join", post(handlers::join))
        .route("/startgame", post(handlers::start_game))
        .with_state(state)
}

/// Serves the front controller until the listener fails.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "front controller listening");
    }
    axum::serve(listener, router(state)).await
}
