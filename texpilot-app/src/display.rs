//! Presentation of a session's lifecycle and the final result.
//!
//! The session is a plain state machine driven entirely by the envelope the
//! relay returns; there is nothing here beyond dispatch-on-tag. Fence
//! stripping lives on this side of the pipeline on purpose: the gateway's
//! contract is "payload text, verbatim", and markdown cleanup is a display
//! nicety.

use std::sync::OnceLock;

use regex::Regex;
use texpilot_common::ResultEnvelope;

/// `idle → awaiting-response → done`, one pass per user action.
#[derive(Debug)]
pub enum SessionState {
    Idle,
    Awaiting,
    Done(ResultEnvelope),
}

impl SessionState {
    /// Status line for the current state.
    pub fn status(&self) -> &'static str {
        match self {
            SessionState::Idle => "Ready",
            SessionState::Awaiting => "Thinking...",
            SessionState::Done(ResultEnvelope::Success(_)) => "Generated",
            SessionState::Done(ResultEnvelope::Failure(_)) => "Error",
        }
    }
}

fn fence_re() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```(?:latex)?\n?").expect("static pattern"))
}

/// Remove markdown code-fence markers the model sometimes wraps its output
/// in, despite being told not to. Best effort; everything between the
/// fences stays untouched.
pub fn strip_code_fences(text: &str) -> String {
    fence_re().replace_all(text, "").into_owned()
}

/// What the terminal state renders to.
#[derive(Debug, PartialEq)]
pub enum Rendered {
    /// Cleaned generation output, ready to print or paste.
    Output(String),
    /// Labeled failure message; the session survives and may retry.
    Error(String),
}

/// Unwrap a terminal envelope for display. Success text gets the fence
/// cleanup; failure messages pass through untouched.
pub fn render(envelope: &ResultEnvelope) -> Rendered {
    match envelope {
        ResultEnvelope::Success(payload) => {
            Rendered::Output(strip_code_fences(payload.primary_text().unwrap_or_default()))
        }
        ResultEnvelope::Failure(message) => Rendered::Error(message.clone()),
    }
}

/// Short model label for the result banner.
pub fn model_label(model: &str) -> &'static str {
    if model.contains("haiku") {
        "Haiku"
    } else {
        "Sonnet"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use texpilot_common::{ContentBlock, GenerationPayload};

    #[test]
    fn strips_latex_fences_and_bare_fences() {
        let fenced = "```latex\n\\begin{table}\n\\end{table}\n```\n";
        assert_eq!(strip_code_fences(fenced), "\\begin{table}\n\\end{table}\n");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        let plain = "\\section{Intro}\nbody";
        assert_eq!(strip_code_fences(plain), plain);
    }

    #[test]
    fn keeps_inner_backticks_that_are_not_fences() {
        let text = "use `verb` here";
        assert_eq!(strip_code_fences(text), text);
    }

    #[test]
    fn state_dispatch_follows_the_envelope_tag() {
        assert_eq!(SessionState::Idle.status(), "Ready");
        assert_eq!(SessionState::Awaiting.status(), "Thinking...");

        let ok = SessionState::Done(ResultEnvelope::Success(GenerationPayload {
            id: None,
            model: None,
            content: vec![ContentBlock {
                kind: "text".into(),
                text: Some("x".into()),
            }],
            usage: None,
        }));
        assert_eq!(ok.status(), "Generated");

        let err = SessionState::Done(ResultEnvelope::Failure("boom".into()));
        assert_eq!(err.status(), "Error");
    }

    #[test]
    fn model_labels() {
        assert_eq!(model_label("claude-3-haiku-20240307"), "Haiku");
        assert_eq!(model_label("claude-3-5-sonnet-20240620"), "Sonnet");
    }
}
