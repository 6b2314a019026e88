//! Error types for mail-triage.

use std::path::PathBuf;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Google token loading and refresh errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token file not found at {0}")]
    TokenNotFound(PathBuf),

    #[error("Invalid token file {path}: {reason}")]
    InvalidToken { path: PathBuf, reason: String },

    #[error("Token expired and no refresh token is available")]
    Expired,

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Mailbox listing and fetch errors.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Token expired or revoked")]
    AuthExpired,

    #[error("Mailbox API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Classification transport errors.
///
/// These never escape the classifier; they are folded into sentinel results.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// Pipeline-run errors. Any of these aborts the run without writing output.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Mailbox session failed: {0}")]
    Session(MailboxError),

    #[error("Mailbox fetch failed: {0}")]
    Fetch(MailboxError),

    #[error("Failed to persist results: {0}")]
    Persist(#[from] OutputError),
}

/// Errors reading or writing the classified-emails file.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    #[error("{path} is not a JSON array of classified emails: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// CSV export errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Input(#[from] OutputError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reconciliation input errors.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error(transparent)]
    Predictions(#[from] OutputError),

    #[error("Ground truth file not found: {0}")]
    GroundTruthNotFound(PathBuf),

    #[error("Invalid ground truth file {path}: {reason}")]
    InvalidGroundTruth { path: PathBuf, reason: String },
}

/// Spreadsheet sink errors.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    #[error("Failed to read spreadsheet metadata: {0}")]
    Metadata(String),

    #[error("Sheets API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
