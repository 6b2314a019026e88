//! Triage pipeline.
//!
//! Every run flows through:
//! 1. `MailboxConnector::connect()` — session, fatal on failure
//! 2. `mail::fetch()` — bounded list + full fetch, fatal on failure
//! 3. `Classifier::classify()` — per message, never fails
//! 4. `output::write_classified()` — one write at the end
//!
//! **No partial output.** A run that stops early writes nothing.

pub mod orchestrator;
pub mod output;
pub mod types;

pub use orchestrator::Pipeline;
pub use types::{ClassificationResult, ClassifiedEmail, RunSummary};
