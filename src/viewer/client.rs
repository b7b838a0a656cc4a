use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{HistoryEntry, Round, RoundMeta};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server reported failure: {0}")]
    Server(String),

    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Authoritative state as served by `GET /api/state`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerState {
    #[serde(flatten)]
    pub round: Round,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub rounds: Vec<RoundMeta>,
    pub server_now: i64,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Parse a state-query body, turning `{ ok: false }` into an error.
pub fn parse_state(body: &[u8]) -> Result<ServerState, ClientError> {
    let value: serde_json::Value = serde_json::from_slice(body)?;
    let envelope: Envelope = serde_json::from_value(value.clone())?;
    if !envelope.ok {
        return Err(ClientError::Server(
            envelope.error.unwrap_or_else(|| "unknown error".into()),
        ));
    }
    Ok(serde_json::from_value(value)?)
}

#[derive(Debug, Clone)]
pub struct StateClient {
    http: Client,
    base_url: String,
}

impl StateClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').into(),
        }
    }

    /// Fetch (and thereby advance) the shared round.
    pub async fn fetch_state(&self) -> Result<ServerState, ClientError> {
        let url = format!("{}/api/state", self.base_url);
        // Failures still carry a JSON body, so read it before checking status
        let body = self
            .http
            .get(&url)
            .header("cache-control", "no-store")
            .send()
            .await?
            .bytes()
            .await?;

        parse_state(&body)
    }
}
