// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock tax portal for deterministic testing.
//!
//! Every captcha it hands out has the same answer, [`MockTaxPortal::CAPTCHA_ANSWER`].
//! Lookups succeed for GSTINs registered with [`MockTaxPortal::with_taxpayer`]
//! and fail with `GstinNotFound` for everything else.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use nileasy_core::types::{AdapterType, BusinessDetails, CaptchaChallenge, HealthStatus};
use nileasy_core::{
    ExternalErrorKind, ExternalService, NilEasyError, PluginAdapter, TaxPortalAdapter,
};

/// A scripted GST portal.
pub struct MockTaxPortal {
    taxpayers: HashMap<String, BusinessDetails>,
    fetch_failure: Mutex<Option<ExternalErrorKind>>,
    search_failure: Mutex<Option<ExternalErrorKind>>,
    fetches: AtomicUsize,
    searches: AtomicUsize,
}

impl MockTaxPortal {
    /// The answer to every captcha.
    pub const CAPTCHA_ANSWER: &'static str = "Xy7Q2";
    /// Bytes of every captcha image.
    pub const CAPTCHA_IMAGE: &'static [u8] = b"\x89PNG mock captcha";

    pub fn new() -> Self {
        Self {
            taxpayers: HashMap::new(),
            fetch_failure: Mutex::new(None),
            search_failure: Mutex::new(None),
            fetches: AtomicUsize::new(0),
            searches: AtomicUsize::new(0),
        }
    }

    /// Registers an active taxpayer trading as `business_name`.
    pub fn with_taxpayer(mut self, gstin: &str, business_name: &str) -> Self {
        self.taxpayers.insert(
            gstin.to_string(),
            BusinessDetails {
                business_name: business_name.to_string(),
                legal_name: format!("{business_name} Private Limited"),
                address: "12 MG Road, Bengaluru, Karnataka 560001".to_string(),
                registration_date: "01/07/2017".to_string(),
                status: "Active".to_string(),
            },
        );
        self
    }

    /// Makes the next `fetch_captcha` call fail with `kind`.
    pub fn fail_next_fetch(&self, kind: ExternalErrorKind) {
        *self.fetch_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(kind);
    }

    /// Makes the next `search_taxpayer` call fail with `kind`.
    pub fn fail_next_search(&self, kind: ExternalErrorKind) {
        *self.search_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(kind);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn take(slot: &Mutex<Option<ExternalErrorKind>>) -> Option<ExternalErrorKind> {
        slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    fn error(kind: ExternalErrorKind, message: &str) -> NilEasyError {
        NilEasyError::external(ExternalService::TaxPortal, kind, message)
    }
}

impl Default for MockTaxPortal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTaxPortal {
    fn name(&self) -> &str {
        "mock-portal"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TaxPortal
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        Ok(())
    }
}

#[async_trait]
impl TaxPortalAdapter for MockTaxPortal {
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, NilEasyError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(kind) = Self::take(&self.fetch_failure) {
            return Err(Self::error(kind, "scripted captcha failure"));
        }
        Ok(CaptchaChallenge {
            image: Self::CAPTCHA_IMAGE.to_vec(),
            content_type: "image/png".to_string(),
            cookies: format!("JSESSIONID=mock-{n}"),
        })
    }

    async fn search_taxpayer(
        &self,
        cookies: &str,
        gstin: &str,
        captcha: &str,
    ) -> Result<BusinessDetails, NilEasyError> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = Self::take(&self.search_failure) {
            return Err(Self::error(kind, "scripted search failure"));
        }
        if !cookies.starts_with("JSESSIONID=mock-") {
            return Err(Self::error(ExternalErrorKind::SessionExpired, "unknown session"));
        }
        if captcha != Self::CAPTCHA_ANSWER {
            return Err(Self::error(ExternalErrorKind::BadCaptcha, "captcha mismatch"));
        }
        self.taxpayers
            .get(gstin)
            .cloned()
            .ok_or_else(|| Self::error(ExternalErrorKind::GstinNotFound, "no such taxpayer"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookup_requires_matching_captcha() {
        let portal = MockTaxPortal::new().with_taxpayer("29AABCU9603R1ZX", "Uber India");
        let challenge = portal.fetch_captcha().await.unwrap();

        let err = portal
            .search_taxpayer(&challenge.cookies, "29AABCU9603R1ZX", "wrong")
            .await
            .unwrap_err();
        assert_eq!(err.external_kind(), Some(ExternalErrorKind::BadCaptcha));

        let details = portal
            .search_taxpayer(&challenge.cookies, "29AABCU9603R1ZX", MockTaxPortal::CAPTCHA_ANSWER)
            .await
            .unwrap();
        assert_eq!(details.status, "Active");
        assert_eq!(portal.search_calls(), 2);
    }

    #[tokio::test]
    async fn scripted_failures_fire_once() {
        let portal = MockTaxPortal::new();
        portal.fail_next_fetch(ExternalErrorKind::Unavailable);
        assert!(portal.fetch_captcha().await.is_err());
        assert!(portal.fetch_captcha().await.is_ok());
        assert_eq!(portal.fetch_calls(), 2);
    }
}
