use super::*;

#[test]
fn signal_observes_token_cancellation() {
    let token = CancelToken::new();
    let signal = token.signal();
    assert!(!signal.is_cancelled());
    assert_eq!(signal.check(), Ok(()));

    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
    assert!(signal.is_cancelled());
    assert_eq!(signal.check(), Err(Cancelled));
}

#[test]
fn tokens_are_independent() {
    let a = CancelToken::new();
    let b = CancelToken::new();
    a.cancel();
    assert!(!b.signal().is_cancelled());
    assert!(!CancelSignal::never().is_cancelled());
}

#[tokio::test]
async fn cancelled_future_wakes_waiters() {
    let token = CancelToken::new();
    let signal = token.signal();
    let waiter = tokio::spawn(async move { signal.cancelled().await });
    tokio::task::yield_now().await;
    token.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(5), waiter)
        .await
        .expect("waiter should wake")
        .unwrap();
}

#[tokio::test]
async fn cancelled_future_returns_immediately_when_already_cancelled() {
    let token = CancelToken::new();
    token.cancel();
    token.signal().cancelled().await;
}
