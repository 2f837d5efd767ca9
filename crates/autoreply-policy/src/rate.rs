// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-sender sliding-window rate limiting.

use std::collections::VecDeque;

use chrono::Utc;
use dashmap::DashMap;

/// Length of the sliding window in milliseconds.
pub const RATE_WINDOW_MS: i64 = 60_000;

/// Tracks send attempts per sender over the trailing [`RATE_WINDOW_MS`].
///
/// Stale timestamps are pruned lazily when a sender is checked.
#[derive(Debug)]
pub struct RateTracker {
    per_minute_limit: u32,
    windows: DashMap<String, VecDeque<i64>>,
}

impl RateTracker {
    pub fn new(per_minute_limit: u32) -> Self {
        Self {
            per_minute_limit,
            windows: DashMap::new(),
        }
    }

    pub fn per_minute_limit(&self) -> u32 {
        self.per_minute_limit
    }

    pub fn can_send(&self, sender: &str) -> bool {
        self.can_send_at(sender, Utc::now().timestamp_millis())
    }

    /// Prunes `sender`'s window relative to `now_ms`, then reports whether
    /// fewer than the per-minute limit of attempts remain in it.
    pub fn can_send_at(&self, sender: &str, now_ms: i64) -> bool {
        let Some(mut window) = self.windows.get_mut(sender) else {
            return self.per_minute_limit > 0;
        };
        while window
            .front()
            .is_some_and(|&ts| now_ms - ts >= RATE_WINDOW_MS)
        {
            window.pop_front();
        }
        window.len() < self.per_minute_limit as usize
    }

    pub fn record(&self, sender: &str) {
        self.record_at(sender, Utc::now().timestamp_millis());
    }

    /// Records a send attempt for `sender` at `now_ms`.
    pub fn record_at(&self, sender: &str, now_ms: i64) {
        self.windows
            .entry(sender.to_string())
            .or_default()
            .push_back(now_ms);
    }

    /// Number of attempts currently held for `sender`, pruned or not.
    pub fn recorded(&self, sender: &str) -> usize {
        self.windows.get(sender).map(|w| w.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_and_fifth_attempts_are_rejected() {
        let tracker = RateTracker::new(3);
        let start = 1_000_000;
        let mut admitted = Vec::new();
        for i in 0..5 {
            let now = start + i * 1_000;
            let ok = tracker.can_send_at("alice", now);
            if ok {
                tracker.record_at("alice", now);
            }
            admitted.push(ok);
        }
        assert_eq!(admitted, vec![true, true, true, false, false]);
    }

    #[test]
    fn window_expires_after_sixty_seconds() {
        let tracker = RateTracker::new(1);
        tracker.record_at("bob", 0);
        assert!(!tracker.can_send_at("bob", 59_999));
        assert!(tracker.can_send_at("bob", 60_000));
        assert_eq!(tracker.recorded("bob"), 0);
    }

    #[test]
    fn senders_are_independent() {
        let tracker = RateTracker::new(1);
        tracker.record_at("a", 0);
        assert!(!tracker.can_send_at("a", 10));
        assert!(tracker.can_send_at("b", 10));
    }

    #[test]
    fn zero_limit_never_admits() {
        assert!(!RateTracker::new(0).can_send_at("a", 0));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn can_send_matches_window_count(
                limit in 1u32..6,
                offsets in proptest::collection::vec(0i64..200_000, 0..20),
                probe in 0i64..260_000,
            ) {
                let tracker = RateTracker::new(limit);
                let mut sorted = offsets.clone();
                sorted.sort_unstable();
                let recorded: Vec<i64> = sorted.into_iter().filter(|&t| t <= probe).collect();
                for &t in &recorded {
                    tracker.record_at("s", t);
                }
                let in_window = recorded.iter().filter(|&&t| probe - t < RATE_WINDOW_MS).count();
                prop_assert_eq!(tracker.can_send_at("s", probe), in_window < limit as usize);
            }
        }
    }
}
