// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Daily successful-reply counter.
//!
//! Seeded at startup from today's successful outcome log entries. The count
//! resets on the first check after the local calendar date changes.
//!
//! Admitted replies hold a [`QuotaSlot`] until delivery settles, so replies
//! still in flight count against the cap.

use std::sync::{Arc, Mutex};

use autoreply_core::types::OutcomeLogEntry;
use chrono::{Local, NaiveDate};
use tracing::{info, warn};

#[derive(Debug)]
struct DayState {
    day: NaiveDate,
    count: u32,
    /// Reserved by admitted replies that have not been delivered yet.
    pending: u32,
}

/// Counts successful replies for the current local day against a cap.
#[derive(Debug)]
pub struct DailyCounter {
    limit: u32,
    state: Mutex<DayState>,
}

impl DailyCounter {
    pub fn new(limit: u32) -> Self {
        Self::starting_at(limit, Local::now().date_naive(), 0)
    }

    /// Counter starting from `count` successes on `day`.
    pub fn starting_at(limit: u32, day: NaiveDate, count: u32) -> Self {
        Self {
            limit,
            state: Mutex::new(DayState {
                day,
                count,
                pending: 0,
            }),
        }
    }

    /// Seeds the count from successful entries whose local date is `today`.
    pub fn from_log(limit: u32, entries: &[OutcomeLogEntry], today: NaiveDate) -> Self {
        let count = entries
            .iter()
            .filter(|e| e.success && e.timestamp.with_timezone(&Local).date_naive() == today)
            .count();
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        if count > 0 {
            info!(count, limit, "seeded daily reply count from outcome log");
        }
        Self::starting_at(limit, today, count)
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_exhausted(&self) -> bool {
        self.is_exhausted_on(Local::now().date_naive())
    }

    /// Whether today's successes plus in-flight reservations have reached the
    /// cap, after any date rollover.
    pub fn is_exhausted_on(&self, today: NaiveDate) -> bool {
        let mut state = self.lock();
        Self::maybe_reset(&mut state, today);
        let used = state.count.saturating_add(state.pending);
        if used >= self.limit {
            return true;
        }
        if self.limit > 0 && u64::from(used) * 5 >= u64::from(self.limit) * 4 {
            warn!(
                count = state.count,
                limit = self.limit,
                "approaching daily reply limit (80%+)"
            );
        }
        false
    }

    /// Reserves one reply for `today`, or `None` when the cap is reached.
    ///
    /// The slot is released on drop unless [`QuotaSlot::commit`] is called.
    pub fn try_reserve_on(self: &Arc<Self>, today: NaiveDate) -> Option<QuotaSlot> {
        let mut state = self.lock();
        Self::maybe_reset(&mut state, today);
        if state.count.saturating_add(state.pending) >= self.limit {
            return None;
        }
        state.pending += 1;
        Some(QuotaSlot {
            counter: Arc::clone(self),
            settled: false,
        })
    }

    /// Replies admitted but not yet delivered.
    pub fn pending(&self) -> u32 {
        self.lock().pending
    }

    pub fn count(&self) -> u32 {
        self.lock().count
    }

    /// Settles against whichever day the counter currently tracks.
    fn settle(&self, delivered: bool) {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);
        if delivered {
            state.count = state.count.saturating_add(1);
        }
    }

    /// Pending reservations survive a date change.
    fn maybe_reset(state: &mut DayState, today: NaiveDate) {
        if state.day != today {
            state.day = today;
            state.count = 0;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DayState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// One reserved reply against the daily cap.
#[derive(Debug)]
pub struct QuotaSlot {
    counter: Arc<DailyCounter>,
    settled: bool,
}

impl QuotaSlot {
    /// Turns the reservation into a counted success.
    pub fn commit(mut self) {
        self.settled = true;
        self.counter.settle(true);
    }
}

impl Drop for QuotaSlot {
    fn drop(&mut self) {
        if !self.settled {
            self.counter.settle(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exhausted_at_limit() {
        let today = day(2026, 3, 1);
        let counter = Arc::new(DailyCounter::starting_at(2, today, 0));
        counter.try_reserve_on(today).unwrap().commit();
        assert!(!counter.is_exhausted_on(today));
        counter.try_reserve_on(today).unwrap().commit();
        assert!(counter.is_exhausted_on(today));
    }

    #[test]
    fn resets_when_date_changes() {
        let counter = DailyCounter::starting_at(1, day(2026, 3, 1), 1);
        assert!(counter.is_exhausted_on(day(2026, 3, 1)));
        assert!(!counter.is_exhausted_on(day(2026, 3, 2)));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn reservations_count_against_the_cap() {
        let today = Local::now().date_naive();
        let counter = Arc::new(DailyCounter::starting_at(2, today, 0));

        let first = counter.try_reserve_on(today).expect("first slot");
        let second = counter.try_reserve_on(today).expect("second slot");
        assert!(counter.try_reserve_on(today).is_none());
        assert!(counter.is_exhausted_on(today));
        assert_eq!(counter.pending(), 2);

        first.commit();
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.pending(), 1);

        drop(second);
        assert_eq!(counter.count(), 1);
        assert_eq!(counter.pending(), 0);
        assert!(!counter.is_exhausted_on(today));
        assert!(counter.try_reserve_on(today).is_some());
    }

    #[test]
    fn seeds_only_todays_successes() {
        let now = Local::now();
        let today = now.date_naive();
        let mut yesterday = OutcomeLogEntry::succeeded("a", "b", "c");
        yesterday.timestamp = (now - Duration::days(1)).with_timezone(&Utc);
        let entries = vec![
            OutcomeLogEntry::succeeded("a", "hi", "hello"),
            OutcomeLogEntry::succeeded("b", "yo", "hey"),
            OutcomeLogEntry::failed("c", "x", "[blocked: sensitive content]"),
            yesterday,
        ];
        let counter = DailyCounter::from_log(10, &entries, today);
        assert_eq!(counter.count(), 2);
    }

    #[test]
    fn seeding_uses_local_dates() {
        let entry_time = Local.with_ymd_and_hms(2026, 5, 4, 23, 30, 0).unwrap();
        let mut entry = OutcomeLogEntry::succeeded("a", "b", "c");
        entry.timestamp = entry_time.with_timezone(&Utc);
        let counter = DailyCounter::from_log(10, &[entry], day(2026, 5, 4));
        assert_eq!(counter.count(), 1);
    }
}
