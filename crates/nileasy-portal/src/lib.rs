// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tax portal integration for NilEasy.
//!
//! [`GstPortalClient`] talks to the portal over HTTP. [`CaptchaService`]
//! manages the captcha sessions a GSTIN lookup needs, and [`RateLimiter`]
//! caps how often stateless callers may start one.

pub mod captcha;
pub mod client;
pub mod ratelimit;

pub use captcha::{CaptchaService, CaptchaTicket};
pub use client::GstPortalClient;
pub use ratelimit::RateLimiter;
