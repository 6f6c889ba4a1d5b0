// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio WhatsApp channel adapter.
//!
//! Sends through the Messages REST resource with basic auth. Freeform
//! Twilio messages cannot carry quick-reply buttons, so buttons are
//! rendered as a numbered list in the body.

use std::time::Duration;

use async_trait::async_trait;
use nileasy_config::model::ChannelConfig;
use nileasy_core::phone::mask_phone;
use nileasy_core::types::{ChannelCapabilities, MessageId, OutboundMessage};
use nileasy_core::{AdapterType, ChannelAdapter, HealthStatus, NilEasyError, PluginAdapter};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::debug;

use crate::transport_err;

#[derive(Deserialize)]
struct MessageResource {
    sid: String,
}

/// Delivers replies via Twilio's WhatsApp API.
pub struct TwilioChannel {
    client: reqwest::Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl std::fmt::Debug for TwilioChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioChannel")
            .field("api_base", &self.api_base)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[redacted]")
            .field("from_number", &self.from_number)
            .finish()
    }
}

fn required(value: &Option<String>, key: &str) -> Result<String, NilEasyError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| NilEasyError::Config(format!("channel.{key} is required for Twilio")))
}

impl TwilioChannel {
    pub fn new(config: &ChannelConfig) -> Result<Self, NilEasyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NilEasyError::Config(format!("failed to build Twilio HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_base: config.twilio_api_base.trim_end_matches('/').to_string(),
            account_sid: required(&config.twilio_account_sid, "twilio_account_sid")?,
            auth_token: required(&config.twilio_auth_token, "twilio_auth_token")?,
            from_number: required(&config.twilio_whatsapp_number, "twilio_whatsapp_number")?,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }
}

#[async_trait]
impl PluginAdapter for TwilioChannel {
    fn name(&self) -> &str {
        "twilio"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TwilioChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: true,
            supports_buttons: false,
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NilEasyError> {
        let mut params = vec![
            ("From", format!("whatsapp:{}", self.from_number)),
            ("To", format!("whatsapp:{}", msg.to)),
            ("Body", msg.text_with_button_fallback()),
        ];
        if let Some(media) = &msg.media_url {
            params.push(("MediaUrl", media.clone()));
        }
        let body = serde_urlencoded::to_string(&params).map_err(|e| NilEasyError::Channel {
            message: "failed to encode Twilio request".into(),
            source: Some(Box::new(e)),
        })?;

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| transport_err("twilio", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NilEasyError::Channel {
                message: format!("twilio returned {status}: {detail}"),
                source: None,
            });
        }

        let resource: MessageResource = response.json().await.map_err(|e| NilEasyError::Channel {
            message: "unreadable Twilio response".into(),
            source: Some(Box::new(e)),
        })?;
        debug!(to = %mask_phone(&msg.to), sid = %resource.sid, "twilio message queued");
        Ok(MessageId(resource.sid))
    }
}
