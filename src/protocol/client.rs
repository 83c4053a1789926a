//! Outbound calls to player agents.
//!
//! The engine never talks HTTP directly: the runner and the front controller
//! go through the `PlayerClient` trait, and `Connector` turns a callback
//! address into a client. `HttpPlayerClient` is the production transport.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use super::messages::{
    BeginAttackRequest, BeginAttackResponse, ContinueAttackRequest, ContinueAttackResponse,
    DeployArmyRequest, DeployArmyResponse, GameOverRequest,
};

/// Default time an agent has to answer a single request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures talking to an agent. None of these say anything about game rules.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid callback address '{0}'")]
    InvalidAddress(String),

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("agent at {url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The decision requests an agent must answer.
#[async_trait]
pub trait PlayerClient: Send + Sync {
    /// Liveness check. Returns true only for a case-insensitive `yes`.
    async fn are_you_there(&self) -> Result<bool, ClientError>;

    async fn deploy_army(&self, request: &DeployArmyRequest) -> Result<DeployArmyResponse, ClientError>;

    async fn begin_attack(&self, request: &BeginAttackRequest) -> Result<BeginAttackResponse, ClientError>;

    async fn continue_attacking(
        &self,
        request: &ContinueAttackRequest,
    ) -> Result<ContinueAttackResponse, ClientError>;

    /// Final report. The agent's answer body is ignored.
    async fn game_over(&self, request: &GameOverRequest) -> Result<(), ClientError>;
}

/// Builds clients for callback addresses supplied at join time.
pub trait Connector: Send + Sync {
    fn connect(&self, base_address: &str) -> Result<Arc<dyn PlayerClient>, ClientError>;
}

/// Agent reachable over HTTP at a base address.
#[derive(Debug, Clone)]
pub struct HttpPlayerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpPlayerClient {
    /// Creates a client whose every request gives up after `timeout`.
    pub fn new(base_address: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(http, base_address)
    }

    /// Creates a client sharing an existing connection pool.
    pub fn with_client(http: reqwest::Client, base_address: &str) -> Result<Self, ClientError> {
        let trimmed = format!("{}/", base_address.trim_end_matches('/'));
        let base_url =
            Url::parse(&trimmed).map_err(|_| ClientError::InvalidAddress(base_address.to_string()))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidAddress(base_address.to_string()));
        }
        Ok(HttpPlayerClient { http, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|_| ClientError::InvalidAddress(format!("{}{}", self.base_url, path)))
    }

    async fn send(&self, request: reqwest::RequestBuilder, url: &Url) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await.map_err(|e| classify(e, url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn post_json<Req, Resp>(&self, path: &str, body: &Req) -> Result<Resp, ClientError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.url(path)?;
        debug!(%url, "posting to agent");
        let response = self.send(self.http.post(url.clone()).json(body), &url).await?;
        response.json::<Resp>().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(url.to_string())
            } else {
                ClientError::Decode {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })
    }
}

fn classify(err: reqwest::Error, url: &Url) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout(url.to_string())
    } else {
        ClientError::Transport(err)
    }
}

#[async_trait]
impl PlayerClient for HttpPlayerClient {
    async fn are_you_there(&self) -> Result<bool, ClientError> {
        let url = self.url("areYouThere")?;
        let response = self.send(self.http.get(url.clone()), &url).await?;
        let body = response.text().await.map_err(|e| classify(e, &url))?;
        Ok(is_yes(&body))
    }

    async fn deploy_army(&self, request: &DeployArmyRequest) -> Result<DeployArmyResponse, ClientError> {
        self.post_json("deployArmy", request).await
    }

    async fn begin_attack(&self, request: &BeginAttackRequest) -> Result<BeginAttackResponse, ClientError> {
        self.post_json("beginAttack", request).await
    }

    async fn continue_attacking(
        &self,
        request: &ContinueAttackRequest,
    ) -> Result<ContinueAttackResponse, ClientError> {
        self.post_json("continueAttacking", request).await
    }

    async fn game_over(&self, request: &GameOverRequest) -> Result<(), ClientError> {
        let url = self.url("gameOver")?;
        self.send(self.http.post(url.clone()).json(request), &url).await?;
        Ok(())
    }
}

/// Liveness answers are accepted case-insensitively, surrounding whitespace and quotes ignored.
pub fn is_yes(body: &str) -> bool {
    body.trim().trim_matches('"').eq_ignore_ascii_case("yes")
}

/// Connects over HTTP, sharing one connection pool across all agents.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: reqwest::Client,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpConnector { http })
    }
}

impl Connector for HttpConnector {
    fn connect(&self, base_address: &str) -> Result<Arc<dyn PlayerClient>, ClientError> {
        let client = HttpPlayerClient::with_client(self.http.clone(), base_address)?;
        Ok(Arc::new(client))
    }
}
