//! LLM classification for mail-triage.
//!
//! - `transport`: HTTP chat-completion exchange (status + raw body)
//! - `prompt`: the fixed classification instruction
//! - `classifier`: maps every response shape onto a `ClassificationResult`

pub mod classifier;
pub mod prompt;
pub mod transport;

pub use classifier::Classifier;
pub use transport::{ChatMessage, ChatRequest, ChatTransport, HttpTransport, RawResponse};
