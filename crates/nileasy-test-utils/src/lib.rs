// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for NilEasy integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockTaxPortal`] - Scripted GST portal with a fixed captcha answer
//! - [`MockShortener`] - Link shortener that can be switched into failure mode
//! - [`MockChannel`] - Channel adapter that captures outbound messages
//! - [`ManualClock`] - Clock that only moves when told to
//! - [`MemoryStore`] - In-memory [`SessionStore`](nileasy_core::SessionStore)
//! - [`RacingStorage`] - SQLite storage whose user saves always lose the version check
//! - [`TestHarness`] - Temp SQLite storage plus all of the above

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod mock_channel;
pub mod mock_portal;
pub mod mock_shortener;
pub mod racing_storage;

pub use clock::ManualClock;
pub use harness::{TEST_BUSINESS, TEST_GSTIN, TEST_PHONE, TestHarness};
pub use memory_store::MemoryStore;
pub use mock_channel::MockChannel;
pub use mock_portal::MockTaxPortal;
pub use mock_shortener::MockShortener;
pub use racing_storage::RacingStorage;

use chrono::Utc;
use nileasy_core::types::{InboundMessage, Platform};

/// A Twilio-shaped inbound text message from `phone`.
pub fn inbound_text(phone: &str, text: &str) -> InboundMessage {
    InboundMessage {
        message_id: format!("test-{}", uuid::Uuid::new_v4()),
        phone: phone.to_string(),
        name: Some("Test User".to_string()),
        text: text.to_string(),
        button_id: None,
        platform: Platform::Twilio,
        received_at: Utc::now(),
    }
}

/// An inbound quick-reply tap.
pub fn inbound_button(phone: &str, button_id: &str) -> InboundMessage {
    InboundMessage {
        button_id: Some(button_id.to_string()),
        ..inbound_text(phone, "")
    }
}
