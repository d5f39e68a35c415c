//! Correlation Bus Tests
//!
//! The bus is pure plumbing, so these tests pin down its contract directly:
//! responses reach their own waiter and nobody else, timeouts always resolve
//! the caller, and late responses vanish without side effects.

#[cfg(test)]
mod tests {
    use crate::bus::channel;
    use crate::error::OrchestratorError;
    use std::time::Duration;

    // ============================================================
    // TEST 1: Round trip through an echoing actor
    // ============================================================

    #[tokio::test]
    async fn test_call_round_trip() {
        // ARRANGE: an actor that echoes the request back, doubled
        let (bus, mut inbox) = channel::<u32, u32>(8);

        tokio::spawn(async move {
            while let Some((token, request, responder)) = inbox.recv().await {
                responder.complete(token, request * 2);
            }
        });

        // ACT
        let response = bus.call(21, Duration::from_secs(1)).await;

        // ASSERT
        assert_eq!(response.unwrap(), 42);
        assert_eq!(bus.pending_calls(), 0);
    }

    // ============================================================
    // TEST 2: Tokens are fresh and increasing
    // ============================================================

    #[tokio::test]
    async fn test_tokens_are_unique_and_increasing() {
        let (bus, _inbox) = channel::<(), ()>(8);

        let first = bus.send(()).await.unwrap();
        let second = bus.send(()).await.unwrap();

        assert_eq!(first.token().0, 1);
        assert_eq!(second.token().0, 2);
        assert_ne!(first.token(), second.token());
    }

    // ============================================================
    // TEST 3: Timeout resolves the waiter and unregisters it
    // ============================================================

    #[tokio::test]
    async fn test_timeout_resolves_with_no_response_received() {
        // ARRANGE: inbox kept alive but never answered
        let (bus, _inbox) = channel::<&'static str, ()>(8);

        // ACT
        let result = bus.call("ping", Duration::from_millis(20)).await;

        // ASSERT: the caller gets the timeout error and no waiter leaks
        assert!(matches!(
            result,
            Err(OrchestratorError::NoResponseReceived { waited_ms: 20 })
        ));
        assert_eq!(bus.pending_calls(), 0);
    }

    // ============================================================
    // TEST 4: Late response is silently discarded
    // ============================================================

    #[tokio::test]
    async fn test_late_response_is_discarded() {
        let (bus, mut inbox) = channel::<&'static str, u32>(8);

        // ACT: let the call time out before the actor answers
        let pending = bus.send("slow").await.unwrap();
        let token = pending.token();
        let result = pending.await_response(Duration::from_millis(10)).await;
        assert!(result.is_err());

        // The actor finally processes the request
        let (received_token, _, responder) = inbox.recv().await.unwrap();
        assert_eq!(received_token, token);
        responder.complete(received_token, 7);

        // ASSERT: nothing leaked, and the bus still works for the next call
        assert_eq!(bus.pending_calls(), 0);

        let bus_clone = bus.clone();
        tokio::spawn(async move {
            while let Some((token, _, responder)) = inbox.recv().await {
                responder.complete(token, 99);
            }
        });
        let response = bus_clone.call("next", Duration::from_secs(1)).await;
        assert_eq!(response.unwrap(), 99);
    }

    // ============================================================
    // TEST 5: Concurrent calls never cross-talk
    // ============================================================

    #[tokio::test]
    async fn test_concurrent_calls_keep_their_own_responses() {
        // ARRANGE: an actor that answers in reverse arrival order
        let (bus, mut inbox) = channel::<u64, u64>(8);

        tokio::spawn(async move {
            let first = inbox.recv().await.unwrap();
            let second = inbox.recv().await.unwrap();
            second.2.complete(second.0, second.1 * 10);
            first.2.complete(first.0, first.1 * 10);
        });

        // ACT: two overlapping calls
        let other = bus.clone();
        let first_handle =
            tokio::spawn(async move { other.call(1, Duration::from_secs(1)).await });
        let second = bus.call(2, Duration::from_secs(1)).await;

        // ASSERT: each caller got the response for its own token, not the
        // one that happened to arrive first
        assert_eq!(second.unwrap(), 20);
        assert_eq!(first_handle.await.unwrap().unwrap(), 10);
    }

    // ============================================================
    // TEST 6: A dropped actor resolves callers instead of hanging them
    // ============================================================

    #[tokio::test]
    async fn test_closed_queue_fails_fast() {
        let (bus, inbox) = channel::<(), ()>(8);
        drop(inbox);

        let result = bus.call((), Duration::from_secs(5)).await;

        assert!(matches!(
            result,
            Err(OrchestratorError::NoResponseReceived { .. })
        ));
        assert_eq!(bus.pending_calls(), 0);
    }
}
