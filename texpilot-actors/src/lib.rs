//! Message-passing relay between the document agent and the network agent.
//!
//! The two sides share no mutable state; the only thing that crosses the
//! boundary is the serialized-shape request and the plain-data
//! [`ResultEnvelope`] reply. Each request carries its own
//! `oneshot::Sender`, so a handler that accepts a request holds exactly one
//! terminal reply obligation — the typed rendition of "keep the channel
//! open until the asynchronous response is ready".

pub mod actor;
pub mod gateway;

use anyhow::anyhow;
use texpilot_common::{GenerationRequest, ResultEnvelope};
use tokio::sync::oneshot;

use crate::actor::Addr;
use crate::gateway::GatewayActor;

/// Messages the gateway actor understands.
pub enum GatewayMsg {
    /// One generation order. The reply channel resolves exactly once, with
    /// either variant of the envelope; there is no cancellation and no
    /// relay-level timeout.
    Generate {
        request: GenerationRequest,
        reply: oneshot::Sender<ResultEnvelope>,
    },
}

/// One-shot request/response round trip from the document side.
///
/// Dropped mailboxes or reply channels surface as errors here rather than
/// hanging the caller.
pub async fn request_generation(
    gateway: &Addr<GatewayActor>,
    request: GenerationRequest,
) -> anyhow::Result<ResultEnvelope> {
    let (tx, rx) = oneshot::channel();
    gateway
        .send(GatewayMsg::Generate { request, reply: tx })
        .await
        .map_err(|_| anyhow!("gateway actor mailbox dropped"))?;
    rx.await.map_err(|_| anyhow!("gateway reply dropped"))
}
