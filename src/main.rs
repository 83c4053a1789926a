//! Warlord -- referees a territory conquest match between remote agents.
//!
//! Starts the HTTP front controller with a fresh game open for joining.
//! Agents register via `/join`; `/startgame` plays the match to completion.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

use warlord::board::Adjacency;
use warlord::protocol::HttpConnector;
use warlord::server::{self, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "warlord")]
#[command(about = "Territory conquest referee for remote player agents", version)]
struct Cli {
    /// Address to bind the front controller
    #[arg(long, env = "WARLORD_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Code required to start the game
    #[arg(long, env = "WARLORD_SECRET_CODE")]
    secret_code: String,

    /// Board rows
    #[arg(long, default_value_t = 10)]
    height: u32,

    /// Board columns
    #[arg(long, default_value_t = 10)]
    width: u32,

    /// Armies each player deploys
    #[arg(long, default_value_t = 5)]
    starting_armies: u32,

    /// Let diagonal territories border each other
    #[arg(long)]
    diagonal: bool,

    /// Seconds an agent has to answer one request
    #[arg(long, default_value_t = 10)]
    request_timeout_secs: u64,

    /// Dice seed, 0 for entropy
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        let mut config = ServerConfig::new(self.secret_code.clone());
        config.game.height = self.height;
        config.game.width = self.width;
        config.game.starting_armies = self.starting_armies;
        config.game.seed = self.seed;
        if self.diagonal {
            config.game.adjacency = Adjacency::KingMove;
        }
        config.runner.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).init();

    let config = cli.server_config();
    let connector = HttpConnector::new(config.runner.request_timeout)
        .context("failed to build HTTP client")?;
    let state = AppState::new(config, Arc::new(connector)).context("failed to open game")?;

    let listener = TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    server::serve(listener, state).await.context("server error")?;
    Ok(())
}
