// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone number normalization.

/// Normalizes a gateway phone value to E.164 with a leading `+`.
///
/// Strips a `whatsapp:` prefix, spaces and dashes. Bare 10-digit Indian
/// mobile numbers get the `+91` country code.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_scheme = trimmed.strip_prefix("whatsapp:").unwrap_or(trimmed);
    let digits: String = without_scheme
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.len() == 10 && matches!(digits.as_bytes()[0], b'6'..=b'9') {
        return format!("+91{digits}");
    }
    format!("+{digits}")
}

/// Whether `phone` is a plausible E.164 number.
pub fn is_valid_phone(phone: &str) -> bool {
    phone
        .strip_prefix('+')
        .map(|digits| (8..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

/// Masks all but the last four digits, for logs.
pub fn mask_phone(phone: &str) -> String {
    let count = phone.chars().count();
    if count <= 4 {
        return "****".to_string();
    }
    let tail: String = phone.chars().skip(count - 4).collect();
    format!("****{tail}")
}
