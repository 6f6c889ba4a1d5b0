// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tax portal adapter trait.

use async_trait::async_trait;

use crate::error::NilEasyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{BusinessDetails, CaptchaChallenge};

/// Raw access to the GST portal's public taxpayer search.
#[async_trait]
pub trait TaxPortalAdapter: PluginAdapter {
    /// Fetches a new captcha image together with the portal session cookies.
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, NilEasyError>;

    /// Looks up a GSTIN using the session cookies and the solved captcha.
    ///
    /// Fails with `ExternalService` kinds `BadCaptcha`, `GstinNotFound`,
    /// `SessionExpired` or `Unavailable`.
    async fn search_taxpayer(
        &self,
        cookies: &str,
        gstin: &str,
        captcha: &str,
    ) -> Result<BusinessDetails, NilEasyError>;
}
