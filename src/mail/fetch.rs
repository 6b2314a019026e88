//! Bounded mailbox fetch. List once, then fetch each message in full.

use tracing::{debug, info, warn};

use crate::config::MAX_FETCH_RESULTS;
use crate::error::MailboxError;
use crate::mail::Mailbox;
use crate::mail::extract::{decode_body_data, extract};
use crate::mail::types::{EmailRecord, RawMessage};

/// Marker body used when a single-part payload cannot be decoded.
pub const DECODING_ERROR_MARKER: &str = "[decoding error]";

/// Fetch up to `max_results` messages (clamped to the API ceiling) and
/// reduce each to subject + body.
///
/// No retries and no pagination: the first failing call aborts the batch.
pub async fn fetch(
    mailbox: &dyn Mailbox,
    max_results: u32,
) -> Result<Vec<EmailRecord>, MailboxError> {
    let limit = max_results.min(MAX_FETCH_RESULTS);
    let ids = mailbox.list_message_ids(limit).await?;
    info!(count = ids.len(), limit, "Listed mailbox messages");

    let mut records = Vec::with_capacity(ids.len());
    for id in &ids {
        let message = mailbox.get_message(id).await?;
        let record = to_record(&message);
        debug!(id = %id, subject = %record.subject, "Fetched message");
        records.push(record);
    }

    Ok(records)
}

/// Reduce a full message to its subject and plain-text body.
pub fn to_record(message: &RawMessage) -> EmailRecord {
    let payload = &message.payload;
    let subject = payload.header("Subject").unwrap_or_default().to_string();

    let body = if payload.parts.is_some() {
        extract(payload)
    } else {
        match payload.data() {
            Some(data) => decode_body_data(data).unwrap_or_else(|e| {
                warn!(id = %message.id, error = %e, "Failed to decode message body");
                DECODING_ERROR_MARKER.to_string()
            }),
            None => String::new(),
        }
    };

    EmailRecord { subject, body }
}
