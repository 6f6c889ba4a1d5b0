// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filing SMS text and `sms:` deep links.
//!
//! The portal rejects any edited text, so [`FilingSms`] can only be built
//! through its constructors and exposes its content read-only.

use std::fmt;

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::error::GstError;
use crate::gstin::Gstin;
use crate::period::Period;
use crate::return_type::ReturnType;

/// Exact SMS text sent to the filing short code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct FilingSms(String);

impl FilingSms {
    /// `NIL <CODE> <GSTIN> <MMYYYY>`, e.g. `NIL 3B 29AABCU9603R1ZX 022026`.
    pub fn nil(return_type: ReturnType, gstin: &Gstin, period: Period) -> Self {
        Self(format!(
            "NIL {} {} {}",
            return_type.sms_code(),
            gstin.as_str(),
            period.code()
        ))
    }

    /// `CNF <CODE> <OTP>`, the follow-up SMS confirming a Nil filing.
    pub fn confirmation(return_type: ReturnType, otp: &str) -> Result<Self, GstError> {
        let otp = otp.trim();
        if otp.len() != 6 || !otp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GstError::InvalidOtp(otp.to_string()));
        }
        Ok(Self(format!("CNF {} {}", return_type.sms_code(), otp)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilingSms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `sms:<number>?body=<percent-encoded text>`.
pub fn sms_uri(number: &str, sms: &FilingSms) -> String {
    format!(
        "sms:{}?body={}",
        number,
        utf8_percent_encode(sms.as_str(), NON_ALPHANUMERIC)
    )
}
