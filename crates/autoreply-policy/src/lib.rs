// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decides whether an incoming notification gets an automatic reply.
//!
//! The [`MessageExtractor`] turns raw host events into (sender, text) pairs.
//! The [`PolicyGate`] then runs its ordered admissibility checks, consulting
//! the [`RateTracker`] and [`DailyCounter`].

pub mod extractor;
pub mod gate;
pub mod quota;
pub mod rate;
pub mod schedule;
pub mod sensitive;

pub use extractor::MessageExtractor;
pub use gate::{GateDecision, GateInput, PolicyGate, RejectReason, REDACTED_REPLY};
pub use quota::{DailyCounter, QuotaSlot};
pub use rate::{RateTracker, RATE_WINDOW_MS};
pub use schedule::WorkHours;
pub use sensitive::SensitiveTerms;
