//! The discriminated success/failure value threaded through the pipeline.
//!
//! A [`ResultEnvelope`] is created once per request by the gateway and is
//! terminal: retries never reuse it, and nothing persists it. On the wire it
//! keeps the plain-data shape the relay transports:
//! `{ "success": true, "data": … }` or `{ "success": false, "error": … }`.

use serde::{Deserialize, Serialize};

/// Decoded body of a successful Messages API call.
///
/// The pipeline only ever reads the first content block; the rest of the
/// payload is carried verbatim for display/diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// One unit of generated content inside the payload's content sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: Option<u32>,
    #[serde(default)]
    pub output_tokens: Option<u32>,
}

impl GenerationPayload {
    /// Text of the first content block, verbatim. `None` when the block
    /// exists but carries no non-empty text.
    pub fn primary_text(&self) -> Option<&str> {
        self.content
            .first()
            .and_then(|block| block.text.as_deref())
            .filter(|text| !text.is_empty())
    }
}

/// Exactly one variant is ever populated. Consumed by the document agent,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireEnvelope", into = "WireEnvelope")]
pub enum ResultEnvelope {
    Success(GenerationPayload),
    Failure(String),
}

impl ResultEnvelope {
    pub fn is_success(&self) -> bool {
        matches!(self, ResultEnvelope::Success(_))
    }

    /// Collapse any pipeline error into the plain-string failure form the
    /// relay is allowed to carry.
    pub fn from_error(err: impl std::fmt::Display) -> Self {
        ResultEnvelope::Failure(err.to_string())
    }
}

/// Serialized twin of [`ResultEnvelope`].
#[derive(Serialize, Deserialize)]
struct WireEnvelope {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<GenerationPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl TryFrom<WireEnvelope> for ResultEnvelope {
    type Error = String;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        match (wire.success, wire.data, wire.error) {
            (true, Some(payload), None) => Ok(ResultEnvelope::Success(payload)),
            (false, None, Some(message)) => Ok(ResultEnvelope::Failure(message)),
            _ => Err("envelope must populate exactly one of data/error".into()),
        }
    }
}

impl From<ResultEnvelope> for WireEnvelope {
    fn from(envelope: ResultEnvelope) -> Self {
        match envelope {
            ResultEnvelope::Success(payload) => WireEnvelope {
                success: true,
                data: Some(payload),
                error: None,
            },
            ResultEnvelope::Failure(message) => WireEnvelope {
                success: false,
                data: None,
                error: Some(message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload_with(text: &str) -> GenerationPayload {
        GenerationPayload {
            id: None,
            model: Some("claude-3-haiku-20240307".into()),
            content: vec![ContentBlock {
                kind: "text".into(),
                text: Some(text.into()),
            }],
            usage: None,
        }
    }

    #[test]
    fn primary_text_reads_only_the_first_block() {
        let mut payload = payload_with("\\section{A}");
        payload.content.push(ContentBlock {
            kind: "text".into(),
            text: Some("ignored".into()),
        });
        assert_eq!(payload.primary_text(), Some("\\section{A}"));
    }

    #[test]
    fn primary_text_is_none_for_blank_block() {
        let payload = GenerationPayload {
            id: None,
            model: None,
            content: vec![ContentBlock {
                kind: "text".into(),
                text: Some(String::new()),
            }],
            usage: None,
        };
        assert_eq!(payload.primary_text(), None);
    }

    #[test]
    fn success_serializes_to_the_wire_shape() {
        let envelope = ResultEnvelope::Success(payload_with("X"));
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["data"]["content"][0]["text"], json!("X"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failure_round_trips() {
        let envelope = ResultEnvelope::Failure("API error (401): bad".into());
        let text = serde_json::to_string(&envelope).unwrap();
        let back: ResultEnvelope = serde_json::from_str(&text).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn rejects_an_envelope_with_both_sides_populated() {
        let raw = json!({
            "success": true,
            "data": { "content": [] },
            "error": "also here"
        });
        assert!(serde_json::from_value::<ResultEnvelope>(raw).is_err());
    }
}
