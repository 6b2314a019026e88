//! Email classifier: one chat-completion call per email, every failure
//! folded into a sentinel result.
//!
//! Decision order:
//! 1. no credential → `Unclassified` sentinel, no call made
//! 2. no response at all → `API_ERROR`
//! 3. non-success status → `API_ERROR` with a body preview
//! 4. body not JSON → `DECODE_ERROR`
//! 5. no usable choice → `Unclassified` with the API's error message
//! 6. completion not a JSON object → `Unclassified` with the raw text
//! 7. otherwise → the model's object

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{ClassifierConfig, Taxonomy, UNCLASSIFIED};
use crate::error::LlmError;
use crate::llm::prompt::build_classification_prompt;
use crate::llm::transport::{ChatMessage, ChatRequest, ChatTransport, HttpTransport, RawResponse};
use crate::pipeline::types::ClassificationResult;

/// Sampling temperature; classification must be deterministic.
const CLASSIFY_TEMPERATURE: f32 = 0.0;

/// Default summary when a parsed object lacks `synthese`.
const MISSING_SUMMARY: &str = "classification error";

pub struct Classifier {
    /// `None` when no credential is configured.
    transport: Option<Arc<dyn ChatTransport>>,
    model: String,
    taxonomy: Taxonomy,
}

impl Classifier {
    /// Build a classifier over HTTP. A missing API key is not an error.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, LlmError> {
        let transport: Option<Arc<dyn ChatTransport>> = match &config.api_key {
            Some(key) => Some(Arc::new(HttpTransport::new(
                config.endpoint.clone(),
                key.clone(),
                config.timeout,
            )?)),
            None => None,
        };

        Ok(Self {
            transport,
            model: config.model.clone(),
            taxonomy: config.taxonomy.clone(),
        })
    }

    /// Build a classifier over an arbitrary transport.
    pub fn with_transport(
        transport: Option<Arc<dyn ChatTransport>>,
        model: impl Into<String>,
        taxonomy: Taxonomy,
    ) -> Self {
        Self {
            transport,
            model: model.into(),
            taxonomy,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.transport.is_some()
    }

    /// Classify one email. Never fails.
    pub async fn classify(&self, subject: &str, body: &str) -> ClassificationResult {
        let Some(transport) = &self.transport else {
            warn!(outcome = "missing_credential", "No API key configured, skipping classification");
            return ClassificationResult::missing_credential();
        };

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(build_classification_prompt(
                &self.taxonomy,
                subject,
                body,
            ))],
            temperature: CLASSIFY_TEMPERATURE,
        };

        match transport.send(&request).await {
            Ok(response) => interpret_response(&response),
            Err(e) => {
                warn!(
                    outcome = "transport_failure",
                    provider = transport.provider(),
                    error = %e,
                    "Classification request failed"
                );
                ClassificationResult::transport_failure(&e.to_string())
            }
        }
    }
}

/// Map a raw HTTP exchange onto a classification result.
pub fn interpret_response(response: &RawResponse) -> ClassificationResult {
    if !response.is_success() {
        warn!(
            outcome = "http_error",
            status = response.status,
            "Classification endpoint returned an error status"
        );
        return ClassificationResult::http_error(response.status, &response.body);
    }

    let json: Value = match serde_json::from_str(&response.body) {
        Ok(v) => v,
        Err(e) => {
            let preview: String = response.body.chars().take(200).collect();
            warn!(
                outcome = "decode_error",
                error = %e,
                body = %preview,
                "Success status but the body is not JSON"
            );
            return ClassificationResult::decode_error(&e.to_string());
        }
    };

    let Some(completion) = first_completion(&json) else {
        let message = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str);
        warn!(
            outcome = "no_choice",
            error = message.unwrap_or("unavailable"),
            "Response carried no usable completion"
        );
        return ClassificationResult::no_choice(message);
    };

    parse_completion(completion)
}

/// Text of `choices[0].message.content`, if present.
fn first_completion(json: &Value) -> Option<&str> {
    json.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
}

/// Turn the model's completion text into a result.
pub fn parse_completion(raw: &str) -> ClassificationResult {
    let candidate = strip_code_fence(raw);
    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => map,
        _ => {
            warn!(outcome = "unparsed_completion", raw = %raw, "Completion is not a JSON object");
            return ClassificationResult::unparsed(raw);
        }
    };

    // Missing and non-string values both fall back to the key's default.
    let field = |key: &str, default: &str| match object.get(key) {
        Some(Value::String(s)) => s.clone(),
        _ => default.to_string(),
    };

    let result = ClassificationResult::new(
        field("categorie", UNCLASSIFIED),
        field("urgence", UNCLASSIFIED),
        field("synthese", MISSING_SUMMARY),
    );
    debug!(
        categorie = %result.categorie,
        urgence = %result.urgence,
        "Parsed classification"
    );
    result
}

/// Unwrap a markdown code fence around a completion, if any.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.rfind("```") {
        Some(end) => rest[..end].trim(),
        None => trimmed,
    }
}
