//! Common types and utilities shared across texpilot crates.
//!
//! This crate defines the request/response data model carried between the
//! document side and the network side of the pipeline, the shared error
//! taxonomy, credential format checks, and observability helpers. It is
//! intentionally lightweight so that all crates can depend on it without
//! heavy transitive costs.
//!
//! # Overview
//!
//! - [`GenerationRequest`]: what the document agent asks the gateway to do
//! - [`envelope::ResultEnvelope`]: the terminal success/failure value
//! - [`credential`]: API key format contract
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`TexpilotError`] and [`Result`]: shared error handling

use serde::{Deserialize, Serialize};

pub mod credential;
pub mod envelope;
pub mod observability;

pub use envelope::{ContentBlock, GenerationPayload, ResultEnvelope, Usage};

/// Model used when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Token budget cap applied to every generation request.
pub const MAX_TOKENS: u32 = 800;

/// A single generation order, created fresh per user action and discarded
/// after use. The relay does not enforce a non-empty prompt; the caller UI
/// does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    /// Document text the model should treat as the current file. Must come
    /// from a successful extraction, never from an extraction diagnostic.
    pub context: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, context: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            context: context.into(),
            api_key: api_key.into(),
            model: default_model(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Error types used across the texpilot pipeline.
///
/// Every variant renders as a single human-readable string; that string is
/// the only form in which a failure crosses the relay boundary.
#[derive(thiserror::Error, Debug)]
pub enum TexpilotError {
    /// The API key is empty or does not carry the provider prefix.
    /// Detected before any network attempt.
    #[error("Invalid API key format. Keys must start with \"{}\"", credential::API_KEY_PREFIX)]
    InvalidCredential,

    /// The API endpoint could not be reached at all.
    #[error("Network error: cannot reach the Claude API: {0}")]
    NetworkUnavailable(String),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// A 2xx response without the expected content sequence.
    #[error("Unexpected response structure: {0}")]
    MalformedPayload(String),

    /// A 2xx response whose first content block has no extractable text.
    #[error("Model response contained no generated text")]
    EmptyGeneration,

    /// No extraction strategy could recover document content. Never sent to
    /// the network agent; handled entirely on the document side.
    #[error("Could not read document content: {0}")]
    ExtractionFailed(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient alias for results that use [`TexpilotError`].
pub type Result<T> = std::result::Result<T, TexpilotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults_model_when_absent() {
        let req: GenerationRequest = serde_json::from_str(
            r#"{"prompt":"add a table","context":"\\section{A}","api_key":"sk-ant-x"}"#,
        )
        .unwrap();
        assert_eq!(req.model, DEFAULT_MODEL);
    }

    #[test]
    fn error_strings_carry_the_status_code() {
        let e = TexpilotError::RemoteRejected {
            status: 529,
            message: "overloaded".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("529"));
        assert!(msg.contains("overloaded"));
    }
}
