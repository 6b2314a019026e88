//! mail-triage — classify inbox emails with an LLM and reconcile against
//! hand labels.

pub mod compare;
pub mod config;
pub mod error;
pub mod export;
pub mod google;
pub mod llm;
pub mod mail;
pub mod pipeline;
pub mod sheets;

#[cfg(test)]
mod test_support;
