// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work-hours window.

use chrono::{DateTime, Local, Timelike};

/// Inclusive range of local hours during which replies are allowed.
///
/// When `start > end` the window wraps past midnight, so `22..=6` admits
/// 22:00 through 06:59.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkHours {
    pub start: u32,
    pub end: u32,
}

impl WorkHours {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        if self.start <= self.end {
            (self.start..=self.end).contains(&hour)
        } else {
            hour >= self.start || hour <= self.end
        }
    }

    pub fn contains(&self, at: &DateTime<Local>) -> bool {
        self.contains_hour(at.hour())
    }
}

impl Default for WorkHours {
    fn default() -> Self {
        Self::new(0, 23)
    }
}
