// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Link shortener adapter trait.

use async_trait::async_trait;

use crate::error::NilEasyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ShortLink;

/// Wraps `sms:` deep links in HTTP(S) links that every chat client renders.
#[async_trait]
pub trait LinkShortener: PluginAdapter {
    /// Creates a short link that opens an SMS to `number` pre-filled with `body`.
    async fn shorten_sms(&self, number: &str, body: &str) -> Result<ShortLink, NilEasyError>;
}
