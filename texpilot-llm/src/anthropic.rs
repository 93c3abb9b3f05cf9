//! Anthropic Messages API client.
//!
//! Requires a valid API key and internet access. One request per call, no
//! retries: a failed attempt surfaces immediately and the user may retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use texpilot_common::{
    credential::validate_api_key, GenerationPayload, GenerationRequest, Result, TexpilotError,
    MAX_TOKENS,
};

use crate::GenerationBackend;

pub const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Prompt used by the connection self-test.
const TEST_PROMPT: &str = "test connection - just say \"hello\" and tell me what context you see";

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: String,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// The instructional preamble plus the literal document context. The
/// "markup only, no prose" clause is a contract on the model, not an
/// invariant this client enforces; display-side fence stripping is the
/// best-effort cleanup.
fn build_system_prompt(context: &str) -> String {
    format!(
        "You are a LaTeX expert. Generate clean LaTeX code based on the request.\n\n\
         Current document context:\n{context}\n\n\
         Return only the LaTeX code, no explanations."
    )
}

pub struct AnthropicClient {
    http: reqwest::Client,
    endpoint: String,
}

impl AnthropicClient {
    /// Build a client against the production endpoint. Timeouts here are the
    /// transport bound; the relay itself never imposes one.
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| TexpilotError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: ANTHROPIC_API_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (mock servers in tests).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Send a canned prompt through the normal generation path so the user
    /// can check key and connectivity without touching their document.
    pub async fn test_connection(&self, api_key: &str, model: &str) -> Result<GenerationPayload> {
        let request = GenerationRequest::new(TEST_PROMPT, "", api_key).with_model(model);
        self.generate(&request).await
    }

    async fn call(&self, request: &GenerationRequest) -> Result<GenerationPayload> {
        validate_api_key(&request.api_key)?;

        let body = MessagesRequest {
            model: &request.model,
            max_tokens: MAX_TOKENS,
            system: build_system_prompt(&request.context),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        tracing::debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            context_chars = request.context.len(),
            "gateway.request.start"
        );

        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &request.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| TexpilotError::NetworkUnavailable(e.without_url().to_string()))?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| TexpilotError::NetworkUnavailable(e.without_url().to_string()))?;

        if !status.is_success() {
            let message = extract_error_message(&bytes);
            tracing::warn!(status = status.as_u16(), message = %message, "gateway.response.rejected");
            return Err(TexpilotError::RemoteRejected {
                status: status.as_u16(),
                message,
            });
        }

        let payload: GenerationPayload = serde_json::from_slice(&bytes).map_err(|e| {
            TexpilotError::MalformedPayload(format!("{e}; body: {}", snip_body(&bytes)))
        })?;

        if payload.content.is_empty() {
            return Err(TexpilotError::MalformedPayload(format!(
                "expected a non-empty content array, got: {}",
                snip_body(&bytes)
            )));
        }

        if payload.primary_text().is_none() {
            return Err(TexpilotError::EmptyGeneration);
        }

        tracing::debug!(
            blocks = payload.content.len(),
            output_tokens = ?payload.usage.as_ref().and_then(|u| u.output_tokens),
            "gateway.response.ok"
        );
        Ok(payload)
    }
}

#[async_trait]
impl GenerationBackend for AnthropicClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationPayload> {
        self.call(request).await
    }
}

/// Pull a human-readable message out of an error body. Anthropic wraps
/// errors as `{"error":{"message":...}}`; fall back to common generic
/// shapes, then to the raw body.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Nested>(body) {
        return env.error.message;
    }
    if let Ok(flat) = serde_json::from_slice::<Flat>(body) {
        if !flat.message.is_empty() {
            return flat.message;
        }
        if !flat.error.is_empty() {
            return flat.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > 500 {
        let mut end = 500;
        while !snip.is_char_boundary(end) {
            end -= 1;
        }
        snip.truncate(end);
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_embeds_the_context_verbatim() {
        let prompt = build_system_prompt("\\section{Intro}\ntext");
        assert!(prompt.contains("\\section{Intro}\ntext"));
        assert!(prompt.contains("Return only the LaTeX code"));
    }

    #[test]
    fn error_message_prefers_the_nested_shape() {
        let body = br#"{"type":"error","error":{"type":"authentication_error","message":"bad"}}"#;
        assert_eq!(extract_error_message(body), "bad");
    }

    #[test]
    fn error_message_falls_back_to_the_raw_body() {
        assert_eq!(extract_error_message(b"oops"), "oops");
    }

    #[test]
    fn long_raw_bodies_are_snipped() {
        let body = vec![b'x'; 2000];
        let msg = extract_error_message(&body);
        assert!(msg.len() <= 503);
        assert!(msg.ends_with("..."));
    }
}
