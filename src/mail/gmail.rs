//! Gmail REST mailbox.
//!
//! `users.messages.list` with a single capped `maxResults`, then
//! `users.messages.get?format=full` per message.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::error::MailboxError;
use crate::google::GoogleSession;
use crate::mail::types::RawMessage;
use crate::mail::{Mailbox, MailboxConnector};

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageListResponse {
    #[serde(default)]
    messages: Vec<MessageStub>,
}

#[derive(Debug, Deserialize)]
struct MessageStub {
    id: String,
}

/// Authenticated Gmail session.
pub struct GmailMailbox {
    client: reqwest::Client,
    session: GoogleSession,
    base_url: String,
}

impl GmailMailbox {
    pub fn new(client: reqwest::Client, session: GoogleSession) -> Self {
        Self {
            client,
            session,
            base_url: GMAIL_API_BASE.to_string(),
        }
    }

    /// Point the mailbox at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, MailboxError> {
        let resp = self
            .client
            .get(url)
            .bearer_auth(self.session.access_token())
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(MailboxError::AuthExpired);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailboxError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl Mailbox for GmailMailbox {
    async fn list_message_ids(&self, limit: u32) -> Result<Vec<String>, MailboxError> {
        let url = format!("{}/messages", self.base_url);
        let list: MessageListResponse = self
            .get_json(&url, &[("maxResults", limit.to_string())])
            .await?;
        Ok(list.messages.into_iter().map(|m| m.id).collect())
    }

    async fn get_message(&self, id: &str) -> Result<RawMessage, MailboxError> {
        let url = format!("{}/messages/{}", self.base_url, id);
        self.get_json(&url, &[("format", "full".to_string())]).await
    }
}

/// Opens Gmail sessions from a local token file.
pub struct GmailConnector {
    client: reqwest::Client,
    token_path: PathBuf,
}

impl GmailConnector {
    pub fn new(client: reqwest::Client, token_path: impl Into<PathBuf>) -> Self {
        Self {
            client,
            token_path: token_path.into(),
        }
    }
}

#[async_trait]
impl MailboxConnector for GmailConnector {
    async fn connect(&self) -> Result<Arc<dyn Mailbox>, MailboxError> {
        let session = GoogleSession::from_token_file(&self.client, &self.token_path).await?;
        info!(token = %self.token_path.display(), "Gmail session ready");
        Ok(Arc::new(GmailMailbox::new(self.client.clone(), session)))
    }
}
