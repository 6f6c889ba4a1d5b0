// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the SMS short-link API.

use std::time::Duration;

use async_trait::async_trait;
use nileasy_config::model::ShortlinkConfig;
use nileasy_core::types::ShortLink;
use nileasy_core::{
    AdapterType, ExternalErrorKind, ExternalService, HealthStatus, LinkShortener, NilEasyError,
    PluginAdapter,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CREATE_PATH: &str = "/api/v1/shortlinks";

#[derive(Serialize)]
struct CreateRequest<'a> {
    phone_number: &'a str,
    message: &'a str,
}

#[derive(Deserialize)]
struct CreateResponse {
    short_url: Option<String>,
    short_code: Option<String>,
}

/// Creates short links that open the SMS app with a pre-filled message.
#[derive(Debug, Clone)]
pub struct ShortLinkClient {
    client: reqwest::Client,
    api_url: String,
}

impl ShortLinkClient {
    pub fn new(config: &ShortlinkConfig) -> Result<Self, NilEasyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                NilEasyError::Config(format!("failed to build shortlink HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn err(kind: ExternalErrorKind, message: impl Into<String>) -> NilEasyError {
        NilEasyError::external(ExternalService::LinkShortener, kind, message)
    }
}

#[async_trait]
impl PluginAdapter for ShortLinkClient {
    fn name(&self) -> &str {
        "shortlink"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LinkShortener
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        Ok(())
    }
}

#[async_trait]
impl LinkShortener for ShortLinkClient {
    async fn shorten_sms(&self, number: &str, body: &str) -> Result<ShortLink, NilEasyError> {
        let response = self
            .client
            .post(format!("{}{CREATE_PATH}", self.api_url))
            .json(&CreateRequest {
                phone_number: number,
                message: body,
            })
            .send()
            .await
            .map_err(|e| {
                let what = if e.is_timeout() { "timed out" } else { "request failed" };
                Self::err(ExternalErrorKind::Unavailable, format!("shortlink {what}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let kind = if status.is_server_error() {
                ExternalErrorKind::Unavailable
            } else {
                ExternalErrorKind::InvalidResponse
            };
            return Err(Self::err(kind, format!("shortlink API returned {status}")));
        }

        let body: CreateResponse = response.json().await.map_err(|e| {
            Self::err(
                ExternalErrorKind::InvalidResponse,
                format!("unreadable shortlink response: {e}"),
            )
        })?;

        match (body.short_url, body.short_code) {
            (Some(short_url), Some(short_code)) if !short_url.is_empty() => {
                debug!(short_code = %short_code, "short link created");
                Ok(ShortLink {
                    short_url,
                    short_code,
                })
            }
            _ => Err(Self::err(
                ExternalErrorKind::InvalidResponse,
                "shortlink response missing short_url or short_code",
            )),
        }
    }
}
