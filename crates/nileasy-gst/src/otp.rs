// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extraction of OTPs and ARNs from text the user forwards to the bot.

use std::sync::LazyLock;

use regex::Regex;

static OTP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)[0-9]{6}(?-u:\b)").expect("OTP regex"));

static ARN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bARN\b(?:\s+(?:is|no\.?|number|:))*\s*[:\-]?\s*([A-Z0-9]{10,20})\b")
        .expect("ARN regex")
});

/// Returns the first isolated 6-digit run in `message`, if any.
///
/// "Isolated" means not part of a longer digit or word run, so phone numbers
/// and GSTINs never match. Only ASCII digits count.
pub fn extract_otp(message: &str) -> Option<String> {
    OTP_PATTERN.find(message).map(|m| m.as_str().to_string())
}

/// Returns the acknowledgement reference number from a portal SMS, upper-cased.
///
/// A reference without a digit is a word that happens to follow "ARN".
pub fn extract_arn(message: &str) -> Option<String> {
    ARN_PATTERN
        .captures_iter(message)
        .map(|caps| caps[1].to_ascii_uppercase())
        .find(|arn| arn.bytes().any(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn finds_otp_in_portal_message() {
        assert_eq!(extract_otp("107543 is your OTP").as_deref(), Some("107543"));
        assert_eq!(
            extract_otp("Your code is 654321. Valid for 30 minutes.").as_deref(),
            Some("654321")
        );
    }

    #[test]
    fn ignores_longer_digit_runs() {
        assert_eq!(extract_otp("call 9876543210"), None);
        assert_eq!(extract_otp("12345"), None);
        assert_eq!(extract_otp("1234567"), None);
    }

    #[test]
    fn ignores_digits_inside_words() {
        assert_eq!(extract_otp("29AABCU9603R1ZX"), None);
        assert_eq!(extract_otp("abc123456"), None);
    }

    #[test]
    fn no_otp_returns_none() {
        assert_eq!(extract_otp("I have not received anything"), None);
    }

    #[test]
    fn extracts_arn() {
        assert_eq!(
            extract_arn("Your GSTR-3B is filed. ARN is AA2902260123456 dated 12/03/2026")
                .as_deref(),
            Some("AA2902260123456")
        );
        assert_eq!(
            extract_arn("arn: aa290226012345x").as_deref(),
            Some("AA290226012345X")
        );
        assert_eq!(extract_arn("no reference here"), None);
    }

    #[test]
    fn arn_needs_a_digit() {
        assert_eq!(extract_arn("I have not got the ARN confirmation yet"), None);
        assert_eq!(extract_arn("send me the ARN information"), None);
        assert_eq!(
            extract_arn("ARN information: ARN AA2902260123456").as_deref(),
            Some("AA2902260123456")
        );
    }

    #[test]
    fn non_ascii_digits_are_not_an_otp() {
        assert_eq!(extract_otp("आपका OTP १०७५४३ है"), None);
        assert_eq!(extract_otp("OTP १०७५४३ / 107543").as_deref(), Some("107543"));
    }

    proptest! {
        #[test]
        fn single_isolated_run_is_returned(
            otp in "[0-9]{6}",
            prefix in "[a-zA-Z ]{0,20}",
            suffix in "[a-zA-Z ]{0,20}",
        ) {
            let message = format!("{prefix} {otp} {suffix}");
            prop_assert_eq!(extract_otp(&message), Some(otp));
        }

        #[test]
        fn text_without_digits_has_no_otp(text in "[a-zA-Z .,!?]{0,60}") {
            prop_assert_eq!(extract_otp(&text), None);
        }
    }
}
