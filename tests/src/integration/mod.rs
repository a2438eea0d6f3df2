//! End-to-end request/reply tests over the in-memory bus.

pub mod cancellation;

use memory_bus::InMemoryBroker;
use rpc_client::{RpcClient, RpcConfig};
use rpc_types::{
    ConsumeOptions, CorrelationId, QueueOptions, ResponseEnvelope, Transport,
};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Reply queue used by every fixture client.
pub const REPLY_QUEUE: &str = "rpc.replies.test";

/// Opt-in log output for debugging test failures (`RUST_LOG=debug`).
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Broker plus an initialized client bound to [`REPLY_QUEUE`].
pub async fn broker_and_client() -> (Arc<InMemoryBroker>, RpcClient) {
    init_tracing();
    let broker = Arc::new(InMemoryBroker::new());
    let client = RpcClient::new(
        broker.clone() as Arc<dyn Transport>,
        RpcConfig::new(REPLY_QUEUE),
    );
    client.initialize().await.expect("initialize");
    (broker, client)
}

/// A request as seen by a responder: the envelope fields it needs plus the
/// flattened domain payload.
pub struct SeenRequest {
    pub correlation_id: CorrelationId,
    pub reply_to: String,
    pub payload: Value,
}

fn parse_request(body: &[u8]) -> Option<SeenRequest> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let correlation_id = CorrelationId::parse(value.get("correlationId")?.as_str()?).ok()?;
    let reply_to = value.get("replyTo")?.as_str()?.to_string();
    Some(SeenRequest {
        correlation_id,
        reply_to,
        payload: value,
    })
}

/// Spawn a responder that consumes `queue` and answers every request with
/// whatever `respond` produces for its payload.
pub async fn spawn_responder<F>(
    broker: Arc<InMemoryBroker>,
    queue: &str,
    respond: F,
) -> JoinHandle<()>
where
    F: Fn(&SeenRequest) -> ResponseEnvelope + Send + 'static,
{
    broker
        .assert_queue(queue, QueueOptions::default())
        .await
        .expect("declare request queue");
    let mut deliveries = broker
        .consume(queue, ConsumeOptions::default())
        .await
        .expect("consume request queue");

    tokio::spawn(async move {
        while let Some(delivery) = deliveries.recv().await {
            let Some(request) = parse_request(&delivery.body) else {
                continue;
            };
            let response = respond(&request);
            let body = serde_json::to_vec(&response).expect("encode response");
            broker
                .publish("", &request.reply_to, body)
                .await
                .expect("publish response");
        }
    })
}

/// Responder that echoes each request's payload back under `data`.
pub async fn spawn_echo_responder(broker: Arc<InMemoryBroker>, queue: &str) -> JoinHandle<()> {
    spawn_responder(broker, queue, |request| {
        ResponseEnvelope::success(request.correlation_id, request.payload.clone())
    })
    .await
}
