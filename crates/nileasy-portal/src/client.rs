// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the GST portal's public taxpayer search.
//!
//! Two calls: fetch a captcha image (which also opens a portal session via
//! cookies), then search a GSTIN with the solved captcha and those cookies.

use std::time::Duration;

use async_trait::async_trait;
use nileasy_config::model::PortalConfig;
use nileasy_core::types::{BusinessDetails, CaptchaChallenge};
use nileasy_core::{
    AdapterType, ExternalErrorKind, ExternalService, HealthStatus, NilEasyError, PluginAdapter,
    TaxPortalAdapter,
};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, SET_COOKIE, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, warn};

const CAPTCHA_PATH: &str = "/services/captcha";
const SEARCH_PATH: &str = "/services/api/search/taxpayerDetails";

/// Portal error code for a wrong captcha answer.
const ERR_BAD_CAPTCHA: &str = "SWEB_9000";
/// Portal error code for an unknown GSTIN.
const ERR_NOT_FOUND: &str = "FO8000";

/// Taxpayer search response. Field names follow the portal's JSON.
#[derive(Debug, Deserialize)]
struct TaxpayerResponse {
    #[serde(rename = "tradeNam", default)]
    trade_name: Option<String>,
    #[serde(rename = "lgnm", default)]
    legal_name: Option<String>,
    #[serde(default)]
    pradr: Option<PrincipalAddress>,
    #[serde(rename = "rgdt", default)]
    registration_date: Option<String>,
    #[serde(rename = "sts", default)]
    status: Option<String>,
    #[serde(rename = "errorCode", default)]
    error_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PrincipalAddress {
    #[serde(default)]
    adr: Option<String>,
}

/// Client for the GST portal.
#[derive(Debug, Clone)]
pub struct GstPortalClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GstPortalClient {
    pub fn new(config: &PortalConfig) -> Result<Self, NilEasyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("nileasy/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NilEasyError::Config(format!("failed to build portal HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the retry pause (tests use zero).
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn portal_err(kind: ExternalErrorKind, message: impl Into<String>) -> NilEasyError {
        NilEasyError::external(ExternalService::TaxPortal, kind, message)
    }

    fn transport_err(e: reqwest::Error) -> NilEasyError {
        let what = if e.is_timeout() { "timed out" } else { "request failed" };
        Self::portal_err(ExternalErrorKind::Unavailable, format!("portal {what}: {e}"))
    }
}

/// Joins `Set-Cookie` headers into a single `Cookie` header value.
fn collect_cookies(headers: &HeaderMap) -> String {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

fn is_transient(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
    )
}

#[async_trait]
impl PluginAdapter for GstPortalClient {
    fn name(&self) -> &str {
        "gst-portal"
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
impl TaxPortalAdapter for GstPortalClient {
    async fn fetch_captcha(&self) -> Result<CaptchaChallenge, NilEasyError> {
        let url = format!("{}{CAPTCHA_PATH}", self.base_url);

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying captcha fetch after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(Self::transport_err)?;
            let status = response.status();
            debug!(status = %status, attempt, "captcha response received");

            if status.is_success() {
                let cookies = collect_cookies(response.headers());
                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("image/png")
                    .to_string();
                let image = response.bytes().await.map_err(Self::transport_err)?.to_vec();
                if image.is_empty() {
                    return Err(Self::portal_err(
                        ExternalErrorKind::InvalidResponse,
                        "portal returned an empty captcha image",
                    ));
                }
                return Ok(CaptchaChallenge {
                    image,
                    content_type,
                    cookies,
                });
            }

            if !(is_transient(status) && attempt < self.max_retries) {
                return Err(Self::portal_err(
                    ExternalErrorKind::Unavailable,
                    format!("captcha fetch returned {status}"),
                ));
            }
        }

        Err(Self::portal_err(
            ExternalErrorKind::Unavailable,
            "captcha fetch failed after retries",
        ))
    }

    async fn search_taxpayer(
        &self,
        cookies: &str,
        gstin: &str,
        captcha: &str,
    ) -> Result<BusinessDetails, NilEasyError> {
        let url = format!("{}{SEARCH_PATH}", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(COOKIE, cookies)
            .json(&serde_json::json!({ "gstin": gstin, "captcha": captcha }))
            .send()
            .await
            .map_err(Self::transport_err)?;

        let status = response.status();
        debug!(status = %status, "taxpayer search response received");

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(Self::portal_err(
                ExternalErrorKind::SessionExpired,
                "portal session expired",
            ));
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Self::portal_err(
                ExternalErrorKind::Unavailable,
                format!("taxpayer search returned {status}"),
            ));
        }

        let body = response.text().await.map_err(Self::transport_err)?;
        let parsed: TaxpayerResponse = serde_json::from_str(&body).map_err(|e| {
            Self::portal_err(
                ExternalErrorKind::InvalidResponse,
                format!("unreadable taxpayer response ({status}): {e}"),
            )
        })?;

        match parsed.error_code.as_deref() {
            Some(ERR_BAD_CAPTCHA) => {
                return Err(Self::portal_err(
                    ExternalErrorKind::BadCaptcha,
                    "captcha answer was not accepted",
                ));
            }
            Some(ERR_NOT_FOUND) => {
                return Err(Self::portal_err(
                    ExternalErrorKind::GstinNotFound,
                    format!("no taxpayer registered under {gstin}"),
                ));
            }
            Some(code) => {
                return Err(Self::portal_err(
                    ExternalErrorKind::InvalidResponse,
                    format!(
                        "portal error {code}: {}",
                        parsed.message.as_deref().unwrap_or("no message")
                    ),
                ));
            }
            None => {}
        }

        if !status.is_success() {
            return Err(Self::portal_err(
                ExternalErrorKind::InvalidResponse,
                format!("taxpayer search returned {status}"),
            ));
        }

        let legal_name = parsed.legal_name.unwrap_or_default();
        let business_name = parsed
            .trade_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| legal_name.clone());
        if business_name.is_empty() {
            return Err(Self::portal_err(
                ExternalErrorKind::InvalidResponse,
                "taxpayer response carried no name",
            ));
        }

        Ok(BusinessDetails {
            business_name,
            legal_name,
            address: parsed.pradr.and_then(|p| p.adr).unwrap_or_default(),
            registration_date: parsed.registration_date.unwrap_or_default(),
            status: parsed.status.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> GstPortalClient {
        let config = PortalConfig {
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..PortalConfig::default()
        };
        GstPortalClient::new(&config)
            .unwrap()
            .with_retry_delay(Duration::ZERO)
    }

    fn kind(err: NilEasyError) -> Option<ExternalErrorKind> {
        err.external_kind()
    }

    #[tokio::test]
    async fn fetch_captcha_collects_image_and_cookies() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/jpeg")
                    .append_header("set-cookie", "JSESSIONID=abc123; Path=/; HttpOnly")
                    .append_header("set-cookie", "CaptchaCookie=xyz; Path=/")
                    .set_body_bytes(vec![0xFF, 0xD8, 0xFF]),
            )
            .mount(&server)
            .await;

        let challenge = test_client(&server.uri()).fetch_captcha().await.unwrap();
        assert_eq!(challenge.image, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(challenge.content_type, "image/jpeg");
        assert_eq!(challenge.cookies, "JSESSIONID=abc123; CaptchaCookie=xyz");
    }

    #[tokio::test]
    async fn fetch_captcha_retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .mount(&server)
            .await;

        let challenge = test_client(&server.uri()).fetch_captcha().await.unwrap();
        assert_eq!(challenge.image, vec![1, 2, 3]);
        assert_eq!(challenge.content_type, "image/png");
    }

    #[tokio::test]
    async fn fetch_captcha_gives_up_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(CAPTCHA_PATH))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).fetch_captcha().await.unwrap_err();
        assert_eq!(kind(err), Some(ExternalErrorKind::Unavailable));
    }

    #[tokio::test]
    async fn search_maps_success_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .and(header("cookie", "JSESSIONID=abc123"))
            .and(body_json(serde_json::json!({
                "gstin": "29AABCU9603R1ZX",
                "captcha": "Xy7Q2"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "gstin": "29AABCU9603R1ZX",
                "tradeNam": "UBER INDIA",
                "lgnm": "UBER INDIA SYSTEMS PRIVATE LIMITED",
                "pradr": { "adr": "Embassy Golf Links, Bengaluru, Karnataka" },
                "rgdt": "01/07/2017",
                "sts": "Active"
            })))
            .mount(&server)
            .await;

        let details = test_client(&server.uri())
            .search_taxpayer("JSESSIONID=abc123", "29AABCU9603R1ZX", "Xy7Q2")
            .await
            .unwrap();
        assert_eq!(details.business_name, "UBER INDIA");
        assert_eq!(details.legal_name, "UBER INDIA SYSTEMS PRIVATE LIMITED");
        assert_eq!(details.address, "Embassy Golf Links, Bengaluru, Karnataka");
        assert_eq!(details.registration_date, "01/07/2017");
        assert_eq!(details.status, "Active");
    }

    #[tokio::test]
    async fn search_falls_back_to_legal_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "tradeNam": "",
                "lgnm": "ASHA TRADERS",
                "sts": "Active"
            })))
            .mount(&server)
            .await;

        let details = test_client(&server.uri())
            .search_taxpayer("", "29AABCU9603R1ZX", "abc")
            .await
            .unwrap();
        assert_eq!(details.business_name, "ASHA TRADERS");
        assert_eq!(details.address, "");
    }

    #[tokio::test]
    async fn search_maps_error_codes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .and(body_json(serde_json::json!({ "gstin": "29AABCU9603R1ZX", "captcha": "wrong" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errorCode": "SWEB_9000",
                "message": "Invalid captcha"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .and(body_json(serde_json::json!({ "gstin": "27AAAAA0000A1Z5", "captcha": "ok" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errorCode": "FO8000",
                "message": "No records found"
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let bad = client.search_taxpayer("", "29AABCU9603R1ZX", "wrong").await.unwrap_err();
        assert_eq!(kind(bad), Some(ExternalErrorKind::BadCaptcha));
        let missing = client.search_taxpayer("", "27AAAAA0000A1Z5", "ok").await.unwrap_err();
        assert_eq!(kind(missing), Some(ExternalErrorKind::GstinNotFound));
    }

    #[tokio::test]
    async fn search_maps_http_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .and(header("cookie", "stale"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(SEARCH_PATH))
            .and(header("cookie", "fresh"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let expired = client.search_taxpayer("stale", "29AABCU9603R1ZX", "x").await.unwrap_err();
        assert_eq!(kind(expired), Some(ExternalErrorKind::SessionExpired));
        let down = client.search_taxpayer("fresh", "29AABCU9603R1ZX", "x").await.unwrap_err();
        assert_eq!(kind(down), Some(ExternalErrorKind::Unavailable));
    }

    #[tokio::test]
    async fn unreachable_portal_is_unavailable() {
        let client = test_client("http://127.0.0.1:1");
        let err = client.fetch_captcha().await.unwrap_err();
        assert_eq!(kind(err), Some(ExternalErrorKind::Unavailable));
    }

    #[test]
    fn cookie_collection_skips_attributes() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
        assert_eq!(collect_cookies(&headers), "a=1; b=2");
        assert_eq!(collect_cookies(&HeaderMap::new()), "");
    }
}
