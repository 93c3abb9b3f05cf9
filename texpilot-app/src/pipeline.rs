//! End-to-end flow for one user action: extract context from the snapshot,
//! relay the request to the gateway actor, hand the envelope to display.
//!
//! One invocation runs exactly one request, so a second trigger while one is
//! in flight cannot happen; the gateway actor additionally drains its
//! mailbox serially, so queued requests would never interleave.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use scraper::Html;
use texpilot_actors::{actor::spawn_actor, gateway::GatewayActor, request_generation};
use texpilot_common::{GenerationRequest, ResultEnvelope, TexpilotError};
use texpilot_config::Settings;
use texpilot_extract::{capture_context, ExtractionOutcome};
use texpilot_llm::anthropic::AnthropicClient;

/// What one relayed generation hands the presentation layer. The envelope
/// is exactly what came back over the channel; unwrapping and cleanup
/// happen in `display`.
#[derive(Debug)]
pub struct RelayOutcome {
    pub envelope: ResultEnvelope,
    pub model: String,
    /// Extraction summary shown alongside the result (never the content).
    pub context_preview: String,
}

fn build_client(api_url: Option<&str>) -> Result<AnthropicClient> {
    let client = AnthropicClient::new().context("building the API client")?;
    Ok(match api_url {
        Some(url) => client.with_endpoint(url),
        None => client,
    })
}

/// Run one generation against a saved editor page.
///
/// Errors here are all document-side or transport-side: empty prompt,
/// failed extraction, missing key, dead relay. A generation the API itself
/// rejected still comes back `Ok` — as a `Failure` envelope, the same
/// plain-data shape the success travels in.
pub async fn generate_from_snapshot(
    html: &str,
    prompt: &str,
    settings: &Settings,
    api_url: Option<&str>,
) -> Result<RelayOutcome> {
    if prompt.trim().is_empty() {
        bail!("Please enter a description first");
    }

    let doc = Html::parse_document(html);
    let (context, context_preview) = match capture_context(&doc) {
        ExtractionOutcome::Auto { content, preview } => (content, preview),
        // Never build a request from a diagnostic; the network agent must
        // not see it.
        ExtractionOutcome::Failed { reason, .. } => {
            return Err(TexpilotError::ExtractionFailed(reason).into())
        }
    };
    tracing::info!(preview = %context_preview, "pipeline.context.captured");

    let Some(api_key) = settings.api_key.clone() else {
        bail!("No API key configured. Set one in your settings file first.");
    };
    let model = settings.model_or_default().to_string();
    let request = GenerationRequest::new(prompt, context, api_key).with_model(&model);

    let client = build_client(api_url)?;
    let gateway = spawn_actor(GatewayActor::new(Arc::new(client)), 8);
    let envelope = request_generation(&gateway.addr, request).await?;
    drop(gateway.addr);
    gateway.task.await?.map_err(|e| e.context("gateway actor"))?;

    Ok(RelayOutcome {
        envelope,
        model,
        context_preview,
    })
}

/// Send a canned prompt through the normal path to verify key and
/// connectivity without touching the user's document.
pub async fn test_connection(settings: &Settings, api_url: Option<&str>) -> Result<String> {
    let api_key = settings.require_api_key()?;
    let client = build_client(api_url)?;
    let payload = client
        .test_connection(api_key, settings.model_or_default())
        .await?;
    Ok(payload.primary_text().unwrap_or_default().to_string())
}
