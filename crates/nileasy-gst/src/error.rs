// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Validation errors for GST primitives.

use thiserror::Error;

/// Raised when user-supplied GST data fails format or range checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GstError {
    /// The GSTIN does not match the 15-character format or has a bad state code.
    #[error("invalid GSTIN `{0}`")]
    InvalidGstin(String),

    /// The return type is not one of GSTR-1 / GSTR-3B.
    #[error("unsupported return type `{0}`")]
    InvalidReturnType(String),

    /// The period could not be parsed as a month and year.
    #[error("unrecognised period `{0}`")]
    InvalidPeriod(String),

    /// The period lies after the current month.
    #[error("period {0} is in the future")]
    FuturePeriod(String),

    /// The period predates the July 2017 GST rollout.
    #[error("period {0} is before GST was introduced")]
    PeriodBeforeGst(String),

    /// The OTP is not exactly six digits.
    #[error("invalid OTP `{0}`")]
    InvalidOtp(String),
}
