// SPDX-FileCopyrightText: 2026 Autoreply Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Long-lived adapters extend [`PluginAdapter`] and use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod action;
pub mod adapter;
pub mod source;
pub mod storage;

pub use action::ReplyAction;
pub use adapter::PluginAdapter;
pub use source::NotificationSource;
pub use storage::StorageAdapter;
