//! Mailbox access.
//!
//! - `types`: Gmail message shape and the reduced `EmailRecord`
//! - `extract`: recursive plain-text body search
//! - `fetch`: bounded list + per-message full fetch
//! - `gmail`: Gmail REST implementation of the traits below

pub mod extract;
pub mod fetch;
pub mod gmail;
pub mod types;

pub use fetch::fetch;
pub use gmail::{GmailConnector, GmailMailbox};
pub use types::{EmailRecord, MessagePart, RawMessage};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::MailboxError;

/// An authenticated mailbox session.
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// List up to `limit` message identifiers, newest first.
    async fn list_message_ids(&self, limit: u32) -> Result<Vec<String>, MailboxError>;

    /// Fetch headers and the full MIME structure of one message.
    async fn get_message(&self, id: &str) -> Result<RawMessage, MailboxError>;
}

/// Opens mailbox sessions.
#[async_trait]
pub trait MailboxConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn Mailbox>, MailboxError>;
}
