//! The network-agent actor: owns the generation backend and answers
//! [`GatewayMsg::Generate`] requests.

use std::sync::Arc;

use anyhow::Result;
use texpilot_common::ResultEnvelope;
use texpilot_llm::GenerationBackend;

use crate::actor::{Actor, Context};
use crate::GatewayMsg;

pub struct GatewayActor {
    backend: Arc<dyn GenerationBackend>,
}

impl GatewayActor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait::async_trait]
impl Actor for GatewayActor {
    type Msg = GatewayMsg;

    async fn handle(&mut self, msg: Self::Msg, _ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            GatewayMsg::Generate { request, reply } => {
                tracing::debug!(
                    model = %request.model,
                    prompt_chars = request.prompt.len(),
                    context_chars = request.context.len(),
                    "relay.generate.received"
                );

                // Typed errors stop here: only the rendered string crosses
                // back over the channel.
                let envelope = match self.backend.generate(&request).await {
                    Ok(payload) => ResultEnvelope::Success(payload),
                    Err(err) => {
                        tracing::warn!(error = %err, "relay.generate.failed");
                        ResultEnvelope::from_error(err)
                    }
                };

                if reply.send(envelope).is_err() {
                    // The requester went away; a failed generation already
                    // logged above, so this is informational only.
                    tracing::warn!("relay.reply.dropped");
                }
            }
        }
        Ok(())
    }
}
