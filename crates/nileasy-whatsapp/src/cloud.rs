// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Meta WhatsApp Cloud API channel adapter.

use std::time::Duration;

use async_trait::async_trait;
use nileasy_config::model::ChannelConfig;
use nileasy_core::phone::mask_phone;
use nileasy_core::types::{ChannelCapabilities, MessageId, OutboundMessage};
use nileasy_core::{AdapterType, ChannelAdapter, HealthStatus, NilEasyError, PluginAdapter};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::transport_err;

/// Interactive reply buttons allowed per message.
const MAX_BUTTONS: usize = 3;
/// Maximum characters in a button title.
const MAX_BUTTON_TITLE: usize = 20;

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    id: String,
}

/// Delivers replies via the WhatsApp Cloud API.
pub struct CloudApiChannel {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    phone_number_id: String,
}

impl std::fmt::Debug for CloudApiChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudApiChannel")
            .field("api_base", &self.api_base)
            .field("access_token", &"[redacted]")
            .field("phone_number_id", &self.phone_number_id)
            .finish()
    }
}

impl CloudApiChannel {
    pub fn new(config: &ChannelConfig) -> Result<Self, NilEasyError> {
        let access_token = config
            .cloud_access_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| NilEasyError::Config("channel.cloud_access_token is required".into()))?;
        let phone_number_id = config
            .cloud_phone_number_id
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                NilEasyError::Config("channel.cloud_phone_number_id is required".into())
            })?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                NilEasyError::Config(format!("failed to build Cloud API HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            api_base: config.cloud_api_base.trim_end_matches('/').to_string(),
            access_token,
            phone_number_id,
        })
    }
}

/// Builds the Cloud API request body for `msg`.
///
/// Media wins over buttons; more buttons than the API allows fall back
/// to a numbered list in the text.
fn payload(msg: &OutboundMessage) -> Value {
    let to = msg.to.trim_start_matches('+');

    if let Some(media) = &msg.media_url {
        return json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "image",
            "image": { "link": media, "caption": msg.text_with_button_fallback() }
        });
    }

    if !msg.buttons.is_empty() && msg.buttons.len() <= MAX_BUTTONS {
        let buttons: Vec<Value> = msg
            .buttons
            .iter()
            .map(|b| {
                let title: String = b.title.chars().take(MAX_BUTTON_TITLE).collect();
                json!({ "type": "reply", "reply": { "id": b.id, "title": title } })
            })
            .collect();
        return json!({
            "messaging_product": "whatsapp",
            "to": to,
            "type": "interactive",
            "interactive": {
                "type": "button",
                "body": { "text": msg.text },
                "action": { "buttons": buttons }
            }
        });
    }

    json!({
        "messaging_product": "whatsapp",
        "to": to,
        "type": "text",
        "text": { "body": msg.text_with_button_fallback(), "preview_url": true }
    })
}

#[async_trait]
impl PluginAdapter for CloudApiChannel {
    fn name(&self) -> &str {
        "cloud_api"
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
impl ChannelAdapter for CloudApiChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: true,
            supports_buttons: true,
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NilEasyError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&payload(&msg))
            .send()
            .await
            .map_err(|e| transport_err("cloud_api", e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(NilEasyError::Channel {
                message: format!("cloud_api returned {status}: {detail}"),
                source: None,
            });
        }

        let body: SendResponse = response.json().await.map_err(|e| NilEasyError::Channel {
            message: "unreadable Cloud API response".into(),
            source: Some(Box::new(e)),
        })?;
        let id = body
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| NilEasyError::Channel {
                message: "Cloud API response has no message id".into(),
                source: None,
            })?;
        debug!(to = %mask_phone(&msg.to), id = %id, "cloud api message sent");
        Ok(MessageId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nileasy_core::types::ReplyButton;
    use wiremock::matchers::{bearer_token, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn buttons_become_interactive() {
        let msg = OutboundMessage::text("+919876543210", "Which return?").with_buttons(vec![
            ReplyButton::new("gstr1", "GSTR-1"),
            ReplyButton::new("gstr3b", "GSTR-3B (monthly summary return)"),
        ]);
        let body = payload(&msg);
        assert_eq!(body["to"], "919876543210");
        assert_eq!(body["type"], "interactive");
        let buttons = body["interactive"]["action"]["buttons"].as_array().unwrap();
        assert_eq!(buttons.len(), 2);
        assert_eq!(buttons[1]["reply"]["title"].as_str().unwrap().chars().count(), 20);
    }

    #[test]
    fn too_many_buttons_fall_back_to_text() {
        let msg = OutboundMessage::text("+91", "Pick").with_buttons(
            (1..=4).map(|i| ReplyButton::new(i.to_string(), format!("Option {i}"))).collect(),
        );
        let body = payload(&msg);
        assert_eq!(body["type"], "text");
        assert!(body["text"]["body"].as_str().unwrap().contains("4. Option 4"));
    }

    #[test]
    fn media_is_sent_as_image() {
        let msg = OutboundMessage::text("+91", "Type the text").with_media("https://x/c.png");
        let body = payload(&msg);
        assert_eq!(body["type"], "image");
        assert_eq!(body["image"]["caption"], "Type the text");
    }

    #[tokio::test]
    async fn sends_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/PNID/messages"))
            .and(bearer_token("tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "messaging_product": "whatsapp",
                "messages": [{ "id": "wamid.1" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let channel = CloudApiChannel::new(&ChannelConfig {
            cloud_access_token: Some("tok".into()),
            cloud_phone_number_id: Some("PNID".into()),
            cloud_api_base: server.uri(),
            ..ChannelConfig::default()
        })
        .unwrap();
        let id = channel.send(OutboundMessage::text("+91", "hi")).await.unwrap();
        assert_eq!(id.0, "wamid.1");
    }
}
