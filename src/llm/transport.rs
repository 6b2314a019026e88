//! HTTP transport for chat-completion endpoints.
//!
//! The transport only moves bytes: it reports the status and raw body and
//! leaves every interpretation to the classifier.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::LlmError;

/// A chat message in the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// OpenAI-style chat-completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a chat request and returns whatever came back.
///
/// Errors only when no response was received at all.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Name used in logs and error reports.
    fn provider(&self) -> &str;

    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, LlmError>;
}

/// Bearer-authenticated reqwest transport.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl HttpTransport {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    fn provider(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &ChatRequest) -> Result<RawResponse, LlmError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: self.provider().to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| LlmError::RequestFailed {
            provider: self.provider().to_string(),
            reason: format!("failed to read response body: {e}"),
        })?;

        Ok(RawResponse { status, body })
    }
}
