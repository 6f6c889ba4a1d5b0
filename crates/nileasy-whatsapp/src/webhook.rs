// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook payloads.
//!
//! Twilio posts form fields (`From`, `Body`, `ProfileName`, `MessageSid`,
//! `ButtonPayload`). The JSON gateway posts
//! `{event, data: {contact: {phone, name}, message: {id, text, button}}}`.
//! The shape is detected by field presence, not by content type.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use nileasy_core::NilEasyError;
use nileasy_core::phone::{is_valid_phone, normalize_phone};
use nileasy_core::types::{InboundMessage, Platform};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct JsonEvent {
    #[serde(default)]
    event: Option<String>,
    data: JsonData,
}

#[derive(Debug, Default, Deserialize)]
struct JsonData {
    #[serde(default)]
    contact: JsonContact,
    #[serde(default)]
    message: JsonMessage,
}

#[derive(Debug, Default, Deserialize)]
struct JsonContact {
    #[serde(default)]
    phone: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JsonMessage {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: String,
    #[serde(default)]
    button: Option<JsonButton>,
}

#[derive(Debug, Deserialize)]
struct JsonButton {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
}

/// Parses a raw webhook body into a normalized message.
///
/// Fails with `Validation` when the body matches neither shape or carries
/// no usable phone number.
pub fn parse_webhook(body: &[u8], received_at: DateTime<Utc>) -> Result<InboundMessage, NilEasyError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        if value.get("event").is_some() && value.get("data").is_some() {
            let event: JsonEvent = serde_json::from_value(value)
                .map_err(|e| NilEasyError::validation(format!("malformed webhook JSON: {e}")))?;
            return from_json(event, received_at);
        }
        return Err(NilEasyError::validation("unknown webhook format"));
    }

    let form = parse_form(body)?;
    if form.contains_key("From") || form.contains_key("Body") {
        return from_twilio(&form, received_at);
    }
    Err(NilEasyError::validation("unknown webhook format"))
}

/// Decodes a form-encoded body into a map.
pub fn parse_form(body: &[u8]) -> Result<HashMap<String, String>, NilEasyError> {
    serde_urlencoded::from_bytes(body)
        .map_err(|e| NilEasyError::validation(format!("malformed form body: {e}")))
}

fn checked_phone(raw: &str) -> Result<String, NilEasyError> {
    let phone = normalize_phone(raw);
    if !is_valid_phone(&phone) {
        return Err(NilEasyError::validation("webhook has no valid sender phone"));
    }
    Ok(phone)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

fn from_twilio(
    form: &HashMap<String, String>,
    received_at: DateTime<Utc>,
) -> Result<InboundMessage, NilEasyError> {
    let phone = checked_phone(form.get("From").map(String::as_str).unwrap_or_default())?;
    Ok(InboundMessage {
        message_id: non_empty(form.get("MessageSid"))
            .unwrap_or_else(|| format!("twilio-{}", uuid::Uuid::new_v4())),
        phone,
        name: non_empty(form.get("ProfileName")),
        text: form.get("Body").cloned().unwrap_or_default(),
        button_id: non_empty(form.get("ButtonPayload")),
        platform: Platform::Twilio,
        received_at,
    })
}

fn from_json(event: JsonEvent, received_at: DateTime<Utc>) -> Result<InboundMessage, NilEasyError> {
    if let Some(kind) = event.event.as_deref() {
        tracing::trace!(event = kind, "json webhook event");
    }
    let JsonData { contact, message } = event.data;
    let phone = checked_phone(&contact.phone)?;

    let (button_id, button_text) = match message.button {
        Some(button) => (button.id, button.text),
        None => (None, None),
    };
    // Button taps may arrive with an empty text; fall back to the button label.
    let text = if message.text.trim().is_empty() {
        button_text.unwrap_or_default()
    } else {
        message.text
    };

    Ok(InboundMessage {
        message_id: message
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("aisensy-{}", uuid::Uuid::new_v4())),
        phone,
        name: contact.name.filter(|n| !n.trim().is_empty()),
        text,
        button_id: button_id.filter(|id| !id.trim().is_empty()),
        platform: Platform::AiSensy,
        received_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_twilio_form() {
        let body = b"From=whatsapp%3A%2B919876543210&Body=Hi+there&ProfileName=Asha&MessageSid=SM123";
        let msg = parse_webhook(body, Utc::now()).unwrap();
        assert_eq!(msg.platform, Platform::Twilio);
        assert_eq!(msg.phone, "+919876543210");
        assert_eq!(msg.text, "Hi there");
        assert_eq!(msg.name.as_deref(), Some("Asha"));
        assert_eq!(msg.message_id, "SM123");
        assert_eq!(msg.button_id, None);
    }

    #[test]
    fn twilio_button_payload_becomes_button_id() {
        let body = b"From=whatsapp%3A%2B919876543210&Body=Start+Filing&ButtonPayload=start_filing";
        let msg = parse_webhook(body, Utc::now()).unwrap();
        assert_eq!(msg.button_id.as_deref(), Some("start_filing"));
        assert_eq!(msg.input(), "start_filing");
        assert!(msg.message_id.starts_with("twilio-"));
    }

    #[test]
    fn parses_json_event() {
        let body = serde_json::json!({
            "event": "message:in:new",
            "data": {
                "contact": { "phone": "919876543210", "name": "Asha" },
                "message": { "id": "wamid.abc", "text": "", "button": { "id": "gstr3b", "text": "GSTR-3B" } }
            }
        })
        .to_string();
        let msg = parse_webhook(body.as_bytes(), Utc::now()).unwrap();
        assert_eq!(msg.platform, Platform::AiSensy);
        assert_eq!(msg.phone, "+919876543210");
        assert_eq!(msg.text, "GSTR-3B");
        assert_eq!(msg.button_id.as_deref(), Some("gstr3b"));
        assert_eq!(msg.message_id, "wamid.abc");
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(parse_webhook(br#"{"hello": "world"}"#, Utc::now()).is_err());
        assert!(parse_webhook(b"foo=bar", Utc::now()).is_err());
    }

    #[test]
    fn rejects_missing_phone() {
        let err = parse_webhook(b"Body=hi", Utc::now()).unwrap_err();
        assert!(matches!(err, NilEasyError::Validation { .. }));
    }
}
