//! Deadline and shutdown cancellation behavior.

#[cfg(test)]
mod tests {
    use crate::integration::broker_and_client;
    use rpc_types::{CallError, QueueOptions, Transport};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_rejects_at_deadline() {
        let (broker, client) = broker_and_client().await;
        broker
            .assert_queue("silent.requests", QueueOptions::default())
            .await
            .unwrap();

        let started = tokio::time::Instant::now();
        let result: Result<Value, _> = client
            .send_request(
                "silent.requests",
                &json!({"ignored": true}),
                Some(Duration::from_millis(200)),
            )
            .await;

        assert_eq!(result.unwrap_err(), CallError::Timeout { timeout_ms: 200 });
        // Virtual time: the deadline fired at exactly 200ms.
        assert_eq!(started.elapsed(), Duration::from_millis(200));
        assert_eq!(client.stats().pending_count, 0);
    }

    #[tokio::test]
    async fn test_shutdown_cancels_all_pending() {
        let (broker, client) = broker_and_client().await;
        broker
            .assert_queue("silent.requests", QueueOptions::default())
            .await
            .unwrap();
        let client = Arc::new(client);

        let mut handles = Vec::new();
        for n in 0..3u32 {
            let client = client.clone();
            handles.push(tokio::spawn(async move {
                client
                    .send_request::<_, Value>(
                        "silent.requests",
                        &json!({"n": n}),
                        Some(Duration::from_secs(60)),
                    )
                    .await
            }));
        }

        // Wait until all three are registered before tearing down.
        while client.stats().pending_count < 3 {
            tokio::task::yield_now().await;
        }

        client.shutdown().await.unwrap();

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap_err(), CallError::Shutdown);
        }
        let stats = client.stats();
        assert_eq!(stats.pending_count, 0);
        assert!(!stats.initialized);
    }

    #[tokio::test]
    async fn test_shutdown_with_nothing_pending() {
        let (_broker, client) = broker_and_client().await;
        client.shutdown().await.unwrap();
        client.shutdown().await.unwrap();
        assert_eq!(client.stats().pending_count, 0);
    }

    #[tokio::test]
    async fn test_reinitialize_after_shutdown() {
        let (broker, client) = broker_and_client().await;
        client.shutdown().await.unwrap();

        let result: Result<Value, _> = client.send_request("q", &json!({}), None).await;
        assert_eq!(result.unwrap_err(), CallError::NotInitialized);

        // A fresh initialize brings the client back up on the same queue.
        client.initialize().await.unwrap();
        let _responder =
            crate::integration::spawn_echo_responder(broker, "echo.requests").await;
        let echoed: Value = client
            .send_request("echo.requests", &json!({"back": true}), None)
            .await
            .unwrap();
        assert_eq!(echoed["back"], true);
    }
}
