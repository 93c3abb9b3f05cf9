//! The network-agent half of the pipeline: credential checks and the
//! Anthropic Messages API gateway.
//!
//! This crate exposes the [`GenerationBackend`] seam the relay layer talks
//! through and the concrete [`anthropic::AnthropicClient`] implementation.
//! The client performs exactly one HTTP attempt per call; retry and backoff
//! are deliberately absent.

use async_trait::async_trait;
use texpilot_common::{GenerationPayload, GenerationRequest, Result};

pub mod anthropic;

pub use texpilot_common::credential::{validate_api_key, API_KEY_PREFIX};

/// Seam between the relay actor and a concrete generation client, so tests
/// can stand in a fake backend without a network stack.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Validate the request's credential, perform a single API call, and
    /// decode the payload. Every failure mode maps onto one
    /// [`texpilot_common::TexpilotError`] variant.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationPayload>;
}
