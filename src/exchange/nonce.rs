use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Issues strictly increasing nonces for authenticated requests.
///
/// Values follow the wall clock in milliseconds. When two calls land on the
/// same millisecond, or the clock steps backwards, the previous value is
/// bumped by one instead. Safe to share between tasks.
#[derive(Debug, Default)]
pub struct NonceGenerator {
    last: AtomicU64,
}

impl NonceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> u64 {
        let now = Self::now_millis();
        let advance = |last: u64| now.max(last.saturating_add(1));

        // The closure always returns Some, so fetch_update cannot fail.
        let previous = match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(advance(last)))
        {
            Ok(previous) | Err(previous) => previous,
        };
        advance(previous)
    }

    /// Last value handed out, or 0 before the first call.
    pub fn last_issued(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }

    fn now_millis() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }
}
