//! Pluggable sleep between attempts.

use async_trait::async_trait;
use std::time::Duration;

/// Waits between retry attempts.
///
/// The default is [`TokioSleeper`]. Tests inject a recording implementation
/// to observe how often and how long the engine sleeps.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend the current retry sequence for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_advances_clock() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(30)).await;
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_zero_sleep_returns() {
        let start = Instant::now();
        TokioSleeper.sleep(Duration::ZERO).await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
