/// Outcome of planning the next recording window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPlan {
    /// Record for this many seconds. Always positive.
    Usable(u64),
    /// The URL expires too soon to record anything safely. Not an error:
    /// discard the URL, back off, and fetch a fresh one.
    Unusable,
}

/// Compute how long the next chunk may safely record.
///
/// `safe = expires_at - now - buffer_seconds`; a window is usable only when
/// `safe > 0` (exactly zero is unusable, so the capture subprocess is never
/// started with a non-positive bound). A usable window is capped by the
/// session's remaining budget.
///
/// `now` is injected rather than read from the wall clock so scheduling is
/// deterministic under test. Callers guarantee `remaining_seconds > 0`.
pub fn plan_window(
    expires_at: i64,
    now: i64,
    buffer_seconds: i64,
    remaining_seconds: u64,
) -> WindowPlan {
    let safe_duration = expires_at - now - buffer_seconds;
    if safe_duration <= 0 {
        return WindowPlan::Unusable;
    }

    WindowPlan::Usable((safe_duration as u64).min(remaining_seconds))
}
