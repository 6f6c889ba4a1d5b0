// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier assigned by the messaging gateway to a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    TaxPortal,
    LinkShortener,
}

/// Which inbound payload shape a message arrived in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// Form-encoded Twilio webhook.
    Twilio,
    /// JSON webhook from the production WhatsApp gateway.
    #[strum(serialize = "aisensy")]
    #[serde(rename = "aisensy")]
    AiSensy,
}

/// A normalized inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Gateway message id.
    pub message_id: String,
    /// Sender phone in E.164 form (`+919876543210`).
    pub phone: String,
    /// Sender profile name, when the gateway provides one.
    pub name: Option<String>,
    /// Message text (may be empty for pure button replies).
    pub text: String,
    /// Id of the tapped quick-reply button, if any.
    pub button_id: Option<String>,
    pub platform: Platform,
    pub received_at: DateTime<Utc>,
}

impl InboundMessage {
    /// The value handlers should interpret: button id if present, else trimmed text.
    pub fn input(&self) -> &str {
        match self.button_id.as_deref() {
            Some(id) if !id.trim().is_empty() => id.trim(),
            _ => self.text.trim(),
        }
    }
}

/// A quick-reply button rendered under an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyButton {
    pub id: String,
    pub title: String,
}

impl ReplyButton {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// A reply to be delivered through a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Recipient phone in E.164 form.
    pub to: String,
    /// WhatsApp-markdown body.
    pub text: String,
    /// Image to attach (the captcha, for instance).
    pub media_url: Option<String>,
    /// Quick-reply buttons. Channels without button support render them as text.
    pub buttons: Vec<ReplyButton>,
}

impl OutboundMessage {
    pub fn text(to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            text: text.into(),
            media_url: None,
            buttons: Vec::new(),
        }
    }

    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }

    pub fn with_buttons(mut self, buttons: Vec<ReplyButton>) -> Self {
        self.buttons = buttons;
        self
    }

    /// Body with buttons appended as a numbered list, for channels that
    /// cannot render interactive buttons.
    pub fn text_with_button_fallback(&self) -> String {
        if self.buttons.is_empty() {
            return self.text.clone();
        }
        let mut body = self.text.clone();
        body.push('\n');
        for (idx, button) in self.buttons.iter().enumerate() {
            body.push_str(&format!("\n{}. {}", idx + 1, button.title));
        }
        body
    }
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCapabilities {
    pub supports_media: bool,
    pub supports_buttons: bool,
}

/// A captcha freshly fetched from the tax portal.
#[derive(Clone, PartialEq, Eq)]
pub struct CaptchaChallenge {
    pub image: Vec<u8>,
    pub content_type: String,
    /// Portal session cookies that must accompany the verification request.
    pub cookies: String,
}

impl std::fmt::Debug for CaptchaChallenge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaChallenge")
            .field("image_bytes", &self.image.len())
            .field("content_type", &self.content_type)
            .field("cookies", &"[redacted]")
            .finish()
    }
}

/// Taxpayer details returned by a successful GSTIN lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    pub business_name: String,
    pub legal_name: String,
    pub address: String,
    pub registration_date: String,
    pub status: String,
}

/// A shortened link returned by the link shortener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortLink {
    pub short_url: String,
    pub short_code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(text: &str, button: Option<&str>) -> InboundMessage {
        InboundMessage {
            message_id: "m1".into(),
            phone: "+919876543210".into(),
            name: None,
            text: text.into(),
            button_id: button.map(str::to_string),
            platform: Platform::Twilio,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn input_prefers_button_id() {
        assert_eq!(inbound(" Start Filing ", Some("start_filing")).input(), "start_filing");
        assert_eq!(inbound(" hello ", None).input(), "hello");
        assert_eq!(inbound("typed", Some("  ")).input(), "typed");
    }

    #[test]
    fn button_fallback_numbers_entries() {
        let msg = OutboundMessage::text("+91", "Pick one").with_buttons(vec![
            ReplyButton::new("a", "GSTR-1"),
            ReplyButton::new("b", "GSTR-3B"),
        ]);
        assert_eq!(msg.text_with_button_fallback(), "Pick one\n\n1. GSTR-1\n2. GSTR-3B");
    }

    #[test]
    fn captcha_debug_redacts_cookies() {
        let challenge = CaptchaChallenge {
            image: vec![1, 2, 3],
            content_type: "image/png".into(),
            cookies: "JSESSIONID=secret".into(),
        };
        let debug = format!("{challenge:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("image_bytes: 3"));
    }

    #[test]
    fn platform_display() {
        assert_eq!(Platform::AiSensy.to_string(), "aisensy");
        assert_eq!(Platform::Twilio.to_string(), "twilio");
    }
}
