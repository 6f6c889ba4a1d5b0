// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMS deep links for NilEasy.
//!
//! WhatsApp does not render `sms:` URIs as tappable links, so filing and
//! confirmation SMS are wrapped by an HTTP shortener. [`SmsLinkService`]
//! falls back to the raw URI whenever shortening is off or fails.

pub mod client;
pub mod service;

pub use client::ShortLinkClient;
pub use service::{SmsLink, SmsLinkService};
