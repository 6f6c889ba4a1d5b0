// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filing and confirmation SMS links with raw-URI fallback.

use std::sync::Arc;

use nileasy_core::LinkShortener;
use nileasy_gst::{FilingSms, GstError, Gstin, Period, ReturnType, sms_uri};
use serde::Serialize;
use tracing::{info, warn};

/// A link that opens the SMS app with `sms` pre-filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmsLink {
    pub sms: FilingSms,
    /// Short HTTP link, or the raw `sms:` URI.
    pub url: String,
    pub short_code: Option<String>,
}

impl SmsLink {
    /// Whether the shortener produced this link.
    pub fn is_shortened(&self) -> bool {
        self.short_code.is_some()
    }
}

/// Builds SMS links to the filing short code.
#[derive(Clone)]
pub struct SmsLinkService {
    shortener: Option<Arc<dyn LinkShortener>>,
    sms_number: String,
}

impl SmsLinkService {
    /// `shortener = None` always yields raw `sms:` URIs.
    pub fn new(shortener: Option<Arc<dyn LinkShortener>>, sms_number: &str) -> Self {
        Self {
            shortener,
            sms_number: sms_number.to_string(),
        }
    }

    pub fn sms_number(&self) -> &str {
        &self.sms_number
    }

    /// Link for `NIL <code> <gstin> <period>`.
    pub async fn filing_link(
        &self,
        return_type: ReturnType,
        gstin: &Gstin,
        period: Period,
    ) -> SmsLink {
        self.link_for(FilingSms::nil(return_type, gstin, period)).await
    }

    /// Link for `CNF <code> <otp>`.
    pub async fn confirmation_link(
        &self,
        return_type: ReturnType,
        otp: &str,
    ) -> Result<SmsLink, GstError> {
        let sms = FilingSms::confirmation(return_type, otp)?;
        Ok(self.link_for(sms).await)
    }

    /// Shortens `sms`, or falls back to the raw URI. Never fails.
    pub async fn link_for(&self, sms: FilingSms) -> SmsLink {
        if let Some(shortener) = &self.shortener {
            match shortener.shorten_sms(&self.sms_number, sms.as_str()).await {
                Ok(short) => {
                    info!(short_code = %short.short_code, "SMS short link generated");
                    return SmsLink {
                        sms,
                        url: short.short_url,
                        short_code: Some(short.short_code),
                    };
                }
                Err(e) => warn!(error = %e, "link shortening failed, using raw sms: URI"),
            }
        }
        SmsLink {
            url: sms_uri(&self.sms_number, &sms),
            sms,
            short_code: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nileasy_test_utils::MockShortener;

    fn gstin() -> Gstin {
        Gstin::parse("29AABCU9603R1ZX").unwrap()
    }

    fn period() -> Period {
        Period::from_code("022026").unwrap()
    }

    #[tokio::test]
    async fn shortened_link_keeps_exact_text() {
        let shortener = Arc::new(MockShortener::new());
        let service = SmsLinkService::new(Some(shortener.clone()), "14409");

        let link = service.filing_link(ReturnType::Gstr3b, &gstin(), period()).await;
        assert_eq!(link.sms.as_str(), "NIL 3B 29AABCU9603R1ZX 022026");
        assert_eq!(link.url, "https://sho.rt/s1");
        assert!(link.is_shortened());
        assert_eq!(
            shortener.requests(),
            vec![("14409".to_string(), "NIL 3B 29AABCU9603R1ZX 022026".to_string())]
        );
    }

    #[tokio::test]
    async fn shortener_failure_falls_back_to_uri() {
        let shortener = Arc::new(MockShortener::new());
        shortener.set_failing(true);
        let service = SmsLinkService::new(Some(shortener), "14409");

        let link = service.filing_link(ReturnType::Gstr1, &gstin(), period()).await;
        assert_eq!(link.url, "sms:14409?body=NIL%20R1%2029AABCU9603R1ZX%20022026");
        assert!(!link.is_shortened());
    }

    #[tokio::test]
    async fn disabled_shortener_uses_uri() {
        let service = SmsLinkService::new(None, "14409");
        let link = service.confirmation_link(ReturnType::Gstr3b, "107543").await.unwrap();
        assert_eq!(link.sms.as_str(), "CNF 3B 107543");
        assert_eq!(link.url, "sms:14409?body=CNF%203B%20107543");
    }

    #[tokio::test]
    async fn confirmation_rejects_bad_otp() {
        let service = SmsLinkService::new(None, "14409");
        assert!(service.confirmation_link(ReturnType::Gstr3b, "12").await.is_err());
    }
}
