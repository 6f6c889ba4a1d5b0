// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GSTIN format validation.
//!
//! Layout: `SS PPPPPPPPPP E Z C`
//! - `SS`: state code, 01 to 37
//! - `PPPPPPPPPP`: PAN (five letters, four digits, one letter)
//! - `E`: entity number within the PAN, `[1-9A-Z]`
//! - `Z`: literal
//! - `C`: check character, any alphanumeric
//!
//! The check character is accepted as-is; no checksum is computed.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::GstError;

static GSTIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{2}[A-Z]{5}[0-9]{4}[A-Z][1-9A-Z]Z[0-9A-Z]$").expect("GSTIN regex")
});

/// Highest state/UT code allotted under GST.
const MAX_STATE_CODE: u8 = 37;

/// Returns `true` if `raw` (after trimming and upper-casing) is a well-formed GSTIN.
pub fn validate_gstin(raw: &str) -> bool {
    Gstin::parse(raw).is_ok()
}

/// A format-validated, upper-case GSTIN.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Gstin(String);

impl Gstin {
    /// Parses a raw user string, normalizing whitespace and case.
    pub fn parse(raw: &str) -> Result<Self, GstError> {
        let normalized = raw.trim().to_ascii_uppercase();
        if !GSTIN_PATTERN.is_match(&normalized) {
            return Err(GstError::InvalidGstin(raw.trim().to_string()));
        }
        let state: u8 = normalized[..2]
            .parse()
            .map_err(|_| GstError::InvalidGstin(normalized.clone()))?;
        if state == 0 || state > MAX_STATE_CODE {
            return Err(GstError::InvalidGstin(normalized));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Two-digit state code.
    pub fn state_code(&self) -> u8 {
        // Both characters are ASCII digits once parsed.
        let bytes = self.0.as_bytes();
        (bytes[0] - b'0') * 10 + (bytes[1] - b'0')
    }

    /// The PAN embedded in positions 3..=12.
    pub fn pan(&self) -> &str {
        &self.0[2..12]
    }

    /// Masked form for logs, e.g. `29AABCU****R1ZX`.
    pub fn masked(&self) -> String {
        format!("{}****{}", &self.0[..7], &self.0[11..])
    }
}

impl fmt::Display for Gstin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Gstin {
    type Err = GstError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Gstin {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Gstin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Gstin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Gstin::parse(&raw).map_err(serde::de::Error::custom)
    }
}
