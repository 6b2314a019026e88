//! Shared types for the triage pipeline.

use serde::{Deserialize, Serialize};

use crate::config::{API_ERROR, CRITICAL, DECODE_ERROR, UNCLASSIFIED};

/// How many characters of an error body are kept in the sentinel summary.
const ERROR_BODY_PREVIEW_CHARS: usize = 100;

// ── Classification result ───────────────────────────────────────────

/// Outcome of classifying one email. Every field is always populated,
/// either by the model or by a sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub categorie: String,
    pub urgence: String,
    pub synthese: String,
}

impl ClassificationResult {
    pub fn new(
        categorie: impl Into<String>,
        urgence: impl Into<String>,
        synthese: impl Into<String>,
    ) -> Self {
        Self {
            categorie: categorie.into(),
            urgence: urgence.into(),
            synthese: synthese.into(),
        }
    }

    /// No credential configured; the endpoint was never called.
    pub fn missing_credential() -> Self {
        Self::new(UNCLASSIFIED, UNCLASSIFIED, "missing credential")
    }

    /// The request never produced a response.
    pub fn transport_failure(reason: &str) -> Self {
        Self::new(API_ERROR, CRITICAL, format!("request failed: {reason}"))
    }

    /// The endpoint answered with a non-success status.
    pub fn http_error(status: u16, body: &str) -> Self {
        let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        let detail = if preview.is_empty() {
            "no error detail in response".to_string()
        } else {
            preview
        };
        Self::new(
            API_ERROR,
            CRITICAL,
            format!("classification API call failed (status {status}): {detail}"),
        )
    }

    /// A success status whose body is not JSON.
    pub fn decode_error(reason: &str) -> Self {
        Self::new(
            DECODE_ERROR,
            CRITICAL,
            format!("response was not valid JSON: {reason}"),
        )
    }

    /// Valid JSON without a usable completion choice.
    pub fn no_choice(message: Option<&str>) -> Self {
        Self::new(
            UNCLASSIFIED,
            UNCLASSIFIED,
            format!("API error: {}", message.unwrap_or("unavailable")),
        )
    }

    /// The model answered, but not with a JSON object.
    pub fn unparsed(raw_completion: &str) -> Self {
        Self::new(UNCLASSIFIED, UNCLASSIFIED, raw_completion)
    }

    /// True for every placeholder produced by a failure path.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.categorie.as_str(),
            API_ERROR | DECODE_ERROR | UNCLASSIFIED
        )
    }
}

// ── Persisted record ────────────────────────────────────────────────

/// One line of the output file. Field order is the serialized key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEmail {
    #[serde(default)]
    pub categorie: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub urgence: String,
    #[serde(default)]
    pub synthese: String,
}

impl ClassifiedEmail {
    pub fn new(subject: impl Into<String>, result: ClassificationResult) -> Self {
        Self {
            categorie: result.categorie,
            subject: subject.into(),
            urgence: result.urgence,
            synthese: result.synthese,
        }
    }
}

/// What a pipeline run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub classified: usize,
    /// Results that came from a failure path.
    pub sentinels: usize,
    /// False when the run stopped before writing (e.g. empty mailbox).
    pub written: bool,
}
