use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Hands out strictly increasing UTC timestamps.
///
/// Two prompts created within the same microsecond, or across a wall-clock
/// step backwards, still get distinct and correctly ordered `created_at`
/// values.
#[derive(Debug, Clone, Default)]
pub struct MonotonicClock {
    last: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        // storage keeps microseconds, so compare at that precision
        let mut now = Utc::now().trunc_subsecs(6);
        if let Some(prev) = *last {
            now = now.max(prev + Duration::microseconds(1));
        }
        *last = Some(now);
        now
    }

    /// Current instant formatted for storage; lexical order equals
    /// chronological order.
    pub fn stamp(&self) -> String {
        format_timestamp(self.now())
    }
}

#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamps_strictly_increase() {
        let clock = MonotonicClock::new();
        let stamps: Vec<String> = (0..500).map(|_| clock.stamp()).collect();
        for pair in stamps.windows(2) {
            assert!(pair[0] < pair[1], "{} !< {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_clones_share_state() {
        let clock = MonotonicClock::new();
        let other = clock.clone();
        let a = clock.now();
        let b = other.now();
        assert!(b > a);
    }

    #[test]
    fn test_format_is_fixed_width() {
        let stamp = MonotonicClock::new().stamp();
        assert_eq!(stamp.len(), "2026-01-01T00:00:00.000000Z".len());
        assert!(stamp.ends_with('Z'));
    }
}
