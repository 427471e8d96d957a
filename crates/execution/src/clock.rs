//! Wall-clock sources.

use chrono::{Local, NaiveDateTime};
use courtres_core::LocalTime;
use tokio::time::Instant;

/// Source of local wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> LocalTime;
}

/// The machine's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> LocalTime {
        Local::now().naive_local()
    }
}

/// A clock that starts at a chosen moment and then runs forward with the
/// tokio clock. Used for dry runs against a pretend "today", and under a
/// paused tokio runtime in tests.
#[derive(Debug, Clone, Copy)]
pub struct AnchoredClock {
    anchor: NaiveDateTime,
    started: Instant,
}

impl AnchoredClock {
    /// Clock reading `anchor` right now.
    pub fn new(anchor: NaiveDateTime) -> Self {
        Self {
            anchor,
            started: Instant::now(),
        }
    }
}

impl Clock for AnchoredClock {
    fn now(&self) -> LocalTime {
        let elapsed = chrono::Duration::from_std(self.started.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        self.anchor + elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_anchored_clock_follows_tokio_time() {
        let anchor = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(13, 59, 58)
            .unwrap();
        let clock = AnchoredClock::new(anchor);
        assert_eq!(clock.now(), anchor);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(clock.now(), anchor + chrono::Duration::seconds(2));
    }
}
