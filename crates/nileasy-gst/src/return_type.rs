// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Return types that can be filed as Nil via SMS.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::GstError;

/// A GST return that supports Nil filing over SMS.
///
/// `Display` renders the portal name (`GSTR-3B`); [`ReturnType::sms_code`]
/// renders the code used inside the filing SMS (`3B`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    #[strum(to_string = "GSTR-1", serialize = "gstr1", serialize = "r1", serialize = "gstr 1")]
    Gstr1,
    #[strum(to_string = "GSTR-3B", serialize = "gstr3b", serialize = "3b", serialize = "gstr 3b")]
    Gstr3b,
}

impl ReturnType {
    /// Code used in the filing and confirmation SMS.
    pub fn sms_code(self) -> &'static str {
        match self {
            ReturnType::Gstr1 => "R1",
            ReturnType::Gstr3b => "3B",
        }
    }

    /// Parses the SMS code form (`R1` / `3B`), case-insensitively.
    pub fn from_sms_code(code: &str) -> Result<Self, GstError> {
        match code.trim().to_ascii_uppercase().as_str() {
            "R1" => Ok(ReturnType::Gstr1),
            "3B" => Ok(ReturnType::Gstr3b),
            _ => Err(GstError::InvalidReturnType(code.trim().to_string())),
        }
    }

    /// Short description shown next to the menu entry.
    pub fn description(self) -> &'static str {
        match self {
            ReturnType::Gstr1 => "Outward supplies",
            ReturnType::Gstr3b => "Monthly summary return",
        }
    }

    /// Stable lowercase key used for storage.
    pub fn as_key(self) -> &'static str {
        match self {
            ReturnType::Gstr1 => "gstr1",
            ReturnType::Gstr3b => "gstr3b",
        }
    }
}
