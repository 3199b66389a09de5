use chrono::Utc;

/// Time source for window planning.
///
/// Injected rather than read implicitly so scheduling decisions are
/// deterministic under test.
pub trait Clock: Send + Sync {
    /// Current Unix time in seconds.
    fn now_unix(&self) -> i64;
}

/// Wall-clock time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}
