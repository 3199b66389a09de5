use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Cooperative stop signal for a recording session.
///
/// `stop()` is sticky: the flag stays set and a wake permit is stored, so
/// the in-flight `cancelled()` waiter resolves even if it registers after
/// the stop was requested. The session loop has at most one waiter at a
/// time (either the recorder select or a backoff sleep).
#[derive(Debug, Default)]
pub struct StopFlag {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the session to stop at the next checkpoint.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Resolves once a stop has been requested.
    pub async fn cancelled(&self) {
        if self.is_stopped() {
            return;
        }
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unstopped() {
        let flag = StopFlag::new();
        assert!(!flag.is_stopped());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_stop() {
        let flag = StopFlag::new();
        flag.stop();
        assert!(flag.is_stopped());
        // Must not hang even though stop() came before the wait
        flag.cancelled().await;
    }

    #[tokio::test]
    async fn cancelled_wakes_a_pending_waiter() {
        let flag = std::sync::Arc::new(StopFlag::new());
        let waiter = {
            let flag = flag.clone();
            tokio::spawn(async move { flag.cancelled().await })
        };
        tokio::task::yield_now().await;
        flag.stop();
        waiter.await.unwrap();
    }
}
