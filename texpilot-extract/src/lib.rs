//! Heuristic document-content extraction from an editor page snapshot.
//!
//! The host editor's internal DOM structure is not a stable contract: class
//! names shift between releases and different deployments ship different
//! editor widgets entirely. Instead of pinning one structure, extraction
//! walks an ordered list of strategies, from the most likely/most structured
//! editor surface down to a generic "looks like an editor" scan, and accepts
//! the first output that actually looks like LaTeX.
//!
//! The acceptance predicate is strict on purpose: a false accept (unrelated
//! page text silently shipped to the model as document context) is worse
//! than a false reject, which the user sees and can work around.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

/// A literal backslash: the cheapest reliable signal that extracted text is
/// LaTeX rather than surrounding page chrome.
pub const MARKUP_MARKER: char = '\\';

/// One extraction attempt: a pure function from the parsed snapshot to a
/// candidate string. Failures of any kind inside a strategy surface as
/// `None`, never as an error.
pub struct Strategy {
    pub name: &'static str,
    pub run: fn(&Html) -> Option<String>,
}

/// Strategy order encodes editor likelihood: current rich-text widget first,
/// legacy and generic scans last.
pub const STRATEGIES: &[Strategy] = &[
    Strategy {
        name: "codemirror content",
        run: codemirror_content,
    },
    Strategy {
        name: "codemirror lines",
        run: codemirror_lines,
    },
    Strategy {
        name: "ace content",
        run: ace_content,
    },
    Strategy {
        name: "textarea scan",
        run: textarea_scan,
    },
    Strategy {
        name: "editor container",
        run: editor_container,
    },
];

fn first_match_text(doc: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    let el = doc.select(&sel).next()?;
    Some(el.text().collect())
}

/// CodeMirror 6 keeps the whole document under one content container.
fn codemirror_content(doc: &Html) -> Option<String> {
    first_match_text(doc, ".cm-content")
}

/// Per-line fallback for CodeMirror: joins line nodes with newlines in
/// document order, which the flat text of the container loses.
fn codemirror_lines(doc: &Html) -> Option<String> {
    let sel = Selector::parse(".cm-line").ok()?;
    let lines: Vec<String> = doc
        .select(&sel)
        .map(|line| line.text().collect::<String>())
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(lines.join("\n"))
}

/// Legacy ACE-based editors.
fn ace_content(doc: &Html) -> Option<String> {
    first_match_text(doc, ".ace_content")
}

/// First textarea whose value already contains the markup marker.
fn textarea_scan(doc: &Html) -> Option<String> {
    let sel = Selector::parse("textarea").ok()?;
    doc.select(&sel)
        .map(|area| area.text().collect::<String>())
        .find(|value| value.contains(MARKUP_MARKER))
}

/// Last resort: anything that advertises itself as an editor container.
fn editor_container(doc: &Html) -> Option<String> {
    for selector in ["#editor", ".editor-panel", r#"[class*="editor"]"#] {
        if let Some(text) = first_match_text(doc, selector) {
            return Some(text);
        }
    }
    None
}

/// Run the default strategy list against a snapshot.
///
/// Returns the trimmed content of the first strategy whose output is
/// non-empty and contains [`MARKUP_MARKER`], or `None` when every strategy
/// is exhausted.
pub fn extract(doc: &Html) -> Option<String> {
    extract_with(doc, STRATEGIES)
}

/// Same as [`extract`] but with an injected strategy list, so tests can
/// exercise the acceptance loop against fake snapshots and orders.
pub fn extract_with(doc: &Html, strategies: &[Strategy]) -> Option<String> {
    for strategy in strategies {
        let Some(content) = (strategy.run)(doc) else {
            continue;
        };
        let trimmed = content.trim();
        if !trimmed.is_empty() && trimmed.contains(MARKUP_MARKER) {
            tracing::debug!(
                strategy = strategy.name,
                chars = trimmed.len(),
                lines = trimmed.lines().count(),
                "extract.strategy.hit"
            );
            return Some(trimmed.to_string());
        }
        // Content without the marker is suspect page chrome; note it and
        // keep going rather than ship it to the model.
        tracing::debug!(
            strategy = strategy.name,
            chars = content.len(),
            "extract.strategy.suspect"
        );
    }
    tracing::debug!("extract.exhausted");
    None
}

/// What the document agent hands to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// Accepted document content plus a short human-readable summary. The
    /// preview is for display only and never part of the network payload.
    Auto { content: String, preview: String },
    /// Extraction failed; `reason` is a diagnostic for the user and must not
    /// be fed to the network agent as document context.
    Failed { reason: String, preview: String },
}

impl ExtractionOutcome {
    pub fn is_auto(&self) -> bool {
        matches!(self, ExtractionOutcome::Auto { .. })
    }
}

/// Wrap [`extract`] into the outcome the UI consumes.
pub fn capture_context(doc: &Html) -> ExtractionOutcome {
    match extract(doc) {
        Some(content) => {
            let preview = format!("Auto context ({} chars)", content.len());
            ExtractionOutcome::Auto { content, preview }
        }
        None => ExtractionOutcome::Failed {
            reason: "No LaTeX content found".to_string(),
            preview: "Could not read document content".to_string(),
        },
    }
}
