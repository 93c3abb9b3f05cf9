use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use texpilot_actors::actor::spawn_actor;
use texpilot_actors::gateway::GatewayActor;
use texpilot_actors::request_generation;
use texpilot_common::{
    ContentBlock, GenerationPayload, GenerationRequest, Result, ResultEnvelope, TexpilotError,
};
use texpilot_llm::GenerationBackend;

/// Idempotent canned backend: same payload for every call, plus a call
/// counter so tests can assert invocation counts.
struct FixedBackend {
    text: &'static str,
    calls: AtomicUsize,
}

impl FixedBackend {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GenerationBackend for FixedBackend {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationPayload {
            id: Some("msg_test".into()),
            model: Some("claude-3-haiku-20240307".into()),
            content: vec![ContentBlock {
                kind: "text".into(),
                text: Some(self.text.into()),
            }],
            usage: None,
        })
    }
}

struct FailingBackend;

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GenerationPayload> {
        Err(TexpilotError::RemoteRejected {
            status: 401,
            message: "bad".into(),
        })
    }
}

fn request() -> GenerationRequest {
    GenerationRequest::new("add a table", "\\section{Intro}", "sk-ant-test")
}

#[tokio::test]
async fn round_trip_delivers_the_payload() {
    let handle = spawn_actor(GatewayActor::new(FixedBackend::new("\\tableofcontents")), 8);

    let envelope = request_generation(&handle.addr, request()).await.unwrap();
    match envelope {
        ResultEnvelope::Success(payload) => {
            assert_eq!(payload.primary_text(), Some("\\tableofcontents"));
        }
        other => panic!("expected success, got {other:?}"),
    }

    drop(handle.addr);
    handle.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn identical_requests_yield_structurally_identical_envelopes() {
    let backend = FixedBackend::new("X");
    let handle = spawn_actor(GatewayActor::new(backend.clone()), 8);

    let first = request_generation(&handle.addr, request()).await.unwrap();
    let second = request_generation(&handle.addr, request()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

    drop(handle.addr);
    handle.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn backend_errors_cross_the_boundary_as_plain_strings() {
    let handle = spawn_actor(GatewayActor::new(Arc::new(FailingBackend)), 8);

    let envelope = request_generation(&handle.addr, request()).await.unwrap();
    match envelope {
        ResultEnvelope::Failure(message) => {
            assert!(message.contains("401"));
            assert!(message.contains("bad"));
        }
        other => panic!("expected failure, got {other:?}"),
    }

    // A failed generation is a normal reply; the actor must stay alive.
    let again = request_generation(&handle.addr, request()).await.unwrap();
    assert!(!again.is_success());

    drop(handle.addr);
    handle.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn dead_gateway_is_an_error_not_a_hang() {
    let handle = spawn_actor(GatewayActor::new(FixedBackend::new("X")), 8);
    handle.task.abort();
    let _ = handle.task.await;

    let err = request_generation(&handle.addr, request())
        .await
        .expect_err("send into a dead mailbox must fail");
    assert!(err.to_string().contains("mailbox dropped"));
}
