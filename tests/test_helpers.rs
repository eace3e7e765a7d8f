//! Small polling helpers for timing-sensitive assertions against an async
//! peer runtime (handshakes and gossip settle over a handful of spawned
//! tasks, not synchronously).

use std::time::Duration;

/// Poll `condition` every `interval` until it returns `true` or `timeout`
/// elapses. Returns whether it converged.
pub async fn wait_until<F>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// `wait_until` for an async condition.
pub async fn wait_until_async<F, Fut>(timeout: Duration, interval: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// The default poll budget for handshake/gossip convergence in these tests.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(2);
pub const SETTLE_INTERVAL: Duration = Duration::from_millis(20);

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_until_returns_true_once_condition_flips() {
        let mut calls = 0;
        let converged = wait_until(Duration::from_millis(200), Duration::from_millis(10), || {
            calls += 1;
            calls >= 3
        })
        .await;
        assert!(converged);
    }

    #[tokio::test]
    async fn wait_until_times_out_on_a_condition_that_never_holds() {
        let converged = wait_until(Duration::from_millis(50), Duration::from_millis(10), || false).await;
        assert!(!converged);
    }
}
