// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The page behind the OTP link.
//!
//! Shows the OTP, the filing it belongs to and a button that opens the
//! confirmation SMS (`CNF <code> <otp>`) in the phone's messaging app.

use std::str::FromStr;

use nileasy_core::NilEasyError;
use nileasy_core::phone::{is_valid_phone, normalize_phone};
use nileasy_gst::{FilingSms, Gstin, Period, ReturnType, sms_uri};
use serde::Deserialize;

/// Query string of `GET /otp-callback`.
#[derive(Debug, Clone, Deserialize)]
pub struct OtpCallbackQuery {
    /// Phone number.
    pub p: String,
    /// OTP.
    pub o: String,
    /// GSTIN.
    pub g: String,
    /// Return type (`3B`, `R1`, `GSTR3B`, ...).
    pub t: String,
    /// Period as `MMYYYY`.
    pub pr: String,
    /// Short code of the link that was opened.
    #[serde(default)]
    pub c: Option<String>,
}

/// A validated OTP page.
#[derive(Debug, Clone)]
pub struct OtpPage {
    pub phone: String,
    pub otp: String,
    pub gstin: Gstin,
    pub return_type: ReturnType,
    pub period: Period,
}

impl OtpPage {
    pub fn from_query(query: &OtpCallbackQuery) -> Result<Self, NilEasyError> {
        let phone = normalize_phone(&query.p);
        if !is_valid_phone(&phone) {
            return Err(NilEasyError::validation("invalid phone number"));
        }
        let otp = query.o.trim();
        if otp.len() != 6 || !otp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NilEasyError::validation("OTP must be 6 digits"));
        }
        let return_type = ReturnType::from_sms_code(&query.t)
            .or_else(|_| ReturnType::from_str(query.t.trim()))
            .map_err(|_| NilEasyError::validation("unknown return type"))?;

        Ok(Self {
            phone,
            otp: otp.to_string(),
            gstin: Gstin::parse(&query.g)?,
            return_type,
            period: Period::from_code(query.pr.trim())?,
        })
    }

    /// Renders the page. `sms_number` receives the confirmation SMS.
    pub fn render(&self, sms_number: &str) -> Result<String, NilEasyError> {
        let confirmation = FilingSms::confirmation(self.return_type, &self.otp)?;
        let sms_link = sms_uri(sms_number, &confirmation);

        Ok(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Your GST Filing OTP</title>
<style>
body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; background: #f4f6fb; display: flex; justify-content: center; padding: 24px; }}
.card {{ background: #fff; border-radius: 16px; box-shadow: 0 8px 32px rgba(0,0,0,.12); padding: 32px 24px; max-width: 480px; width: 100%; text-align: center; }}
.otp {{ font: bold 44px 'Courier New', monospace; letter-spacing: 8px; color: #4c51bf; user-select: all; margin: 16px 0; }}
.details {{ text-align: left; color: #4a5568; font-size: 15px; margin: 24px 0; }}
.details dt {{ font-weight: 600; }}
.details dd {{ margin: 0 0 12px 0; }}
.sms {{ display: inline-block; background: #4c51bf; color: #fff; padding: 12px 28px; border-radius: 24px; text-decoration: none; font-weight: 600; }}
code {{ background: #edf2f7; padding: 2px 6px; border-radius: 4px; }}
</style>
</head>
<body>
<div class="card">
<h1>Your filing OTP</h1>
<div class="otp">{otp}</div>
<dl class="details">
<dt>Return</dt><dd>{return_type} ({description})</dd>
<dt>Period</dt><dd>{period}</dd>
<dt>GSTIN</dt><dd>{gstin}</dd>
</dl>
<p>Send <code>{confirmation}</code> to <strong>{number}</strong> from your registered mobile number to finish filing.</p>
<p><a class="sms" href="{sms_link}">Open confirmation SMS</a></p>
<p>Then return to WhatsApp and share the ARN you receive.</p>
</div>
</body>
</html>
"#,
            otp = escape_html(&self.otp),
            return_type = escape_html(&self.return_type.to_string()),
            description = escape_html(self.return_type.description()),
            period = escape_html(&self.period.display_name()),
            gstin = escape_html(self.gstin.as_str()),
            confirmation = escape_html(confirmation.as_str()),
            number = escape_html(sms_number),
            sms_link = escape_html(&sms_link),
        ))
    }
}

/// Escapes text for use in HTML element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}
