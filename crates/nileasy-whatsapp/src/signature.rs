// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio request signatures (`X-Twilio-Signature`).
//!
//! The signed string is the full request URL followed by every POST
//! parameter, sorted by name, as `name` + `value` with no separators.
//! The signature is base64(HMAC-SHA1(auth_token, signed string)).

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

fn signed_payload(url: &str, params: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = params.keys().collect();
    keys.sort();
    let mut payload = url.to_string();
    for key in keys {
        payload.push_str(key);
        payload.push_str(&params[key]);
    }
    payload
}

fn keyed_mac(auth_token: &str, url: &str, params: &HashMap<String, String>) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;
    mac.update(signed_payload(url, params).as_bytes());
    Some(mac)
}

/// Computes the expected signature for a request.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &HashMap<String, String>,
) -> Option<String> {
    keyed_mac(auth_token, url, params).map(|mac| STANDARD.encode(mac.finalize().into_bytes()))
}

/// Constant-time check of `signature` against the request.
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &HashMap<String, String>,
    signature: &str,
) -> bool {
    let Ok(provided) = STANDARD.decode(signature.trim()) else {
        return false;
    };
    keyed_mac(auth_token, url, params)
        .map(|mac| mac.verify_slice(&provided).is_ok())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> HashMap<String, String> {
        HashMap::from([
            ("From".to_string(), "whatsapp:+919876543210".to_string()),
            ("Body".to_string(), "hi".to_string()),
            ("MessageSid".to_string(), "SM1".to_string()),
        ])
    }

    #[test]
    fn payload_sorts_parameters() {
        assert_eq!(
            signed_payload("https://bot.example.in/webhook", &params()),
            "https://bot.example.in/webhookBodyhiFromwhatsapp:+919876543210MessageSidSM1"
        );
    }

    #[test]
    fn accepts_matching_signature() {
        let url = "https://bot.example.in/webhook";
        let sig = compute_signature("token", url, &params()).unwrap();
        assert!(verify_signature("token", url, &params(), &sig));
    }

    #[test]
    fn rejects_tampering() {
        let url = "https://bot.example.in/webhook";
        let sig = compute_signature("token", url, &params()).unwrap();

        let mut changed = params();
        changed.insert("Body".into(), "bye".into());
        assert!(!verify_signature("token", url, &changed, &sig));
        assert!(!verify_signature("other", url, &params(), &sig));
        assert!(!verify_signature("token", "https://evil.example/webhook", &params(), &sig));
        assert!(!verify_signature("token", url, &params(), "not base64!"));
    }
}
