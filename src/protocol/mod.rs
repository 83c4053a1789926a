//! Player callback protocol.
//!
//! Message types for the decision requests sent to agents, the status
//! snapshot served to observers, and the client abstraction used to reach
//! agents.

pub mod client;
pub mod messages;
pub mod status;

pub use client::{ClientError, Connector, HttpConnector, HttpPlayerClient, PlayerClient};
pub use messages::{
    BeginAttackRequest, BeginAttackResponse, BeginAttackStatus, BoardTerritory,
    ContinueAttackRequest, ContinueAttackResponse, DeployArmyRequest, DeployArmyResponse,
    DeploymentStatus, GameOverRequest, JoinRequest, JoinResponse, StartGameRequest,
};
pub use status::{GameStatus, PlayerInfo};
