//! Nickname generation for joining players.
//!
//! Players get a playful alias derived from their name by an external
//! text-generation service. The service is optional and never trusted to
//! be up: any failure falls back to the player's own name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NicknameError {
    #[error("Nickname request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Nickname service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Nickname service returned an empty nickname")]
    Empty,
}

/// Source of generated nicknames
#[async_trait]
pub trait NicknameService: Send + Sync {
    async fn generate(&self, name: &str) -> Result<String, NicknameError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NicknameRequest<'a> {
    first_name: &'a str,
}

#[derive(Debug, Deserialize)]
struct NicknameResponse {
    nickname: Option<String>,
}

/// Nickname service reached over HTTP.
///
/// Posts `{"firstName": name}` to the endpoint and expects
/// `{"nickname": "..."}` back.
pub struct HttpNicknameService {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpNicknameService {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NicknameService for HttpNicknameService {
    async fn generate(&self, name: &str) -> Result<String, NicknameError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&NicknameRequest { first_name: name })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NicknameError::Status(response.status()));
        }

        let body: NicknameResponse = response.json().await?;
        body.nickname
            .map(|nickname| nickname.trim().to_string())
            .filter(|nickname| !nickname.is_empty())
            .ok_or(NicknameError::Empty)
    }
}

/// Ask `service` for a nickname, settling for `name` itself on any error
/// or once `timeout` passes.
pub async fn resolve_nickname(
    service: &dyn NicknameService,
    name: &str,
    timeout: Duration,
) -> String {
    match tokio::time::timeout(timeout, service.generate(name)).await {
        Ok(Ok(nickname)) => nickname,
        Ok(Err(e)) => {
            log::warn!("Nickname generation failed for {}: {}", name, e);
            name.to_string()
        }
        Err(_) => {
            log::warn!("Nickname generation timed out after {:?}", timeout);
            name.to_string()
        }
    }
}
