// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! GST domain primitives for NilEasy.
//!
//! Pure, side-effect free building blocks shared by the conversation flow and
//! the stateless API:
//! - [`Gstin`]: parsed and format-validated taxpayer identifier
//! - [`ReturnType`]: GSTR-1 / GSTR-3B with their SMS codes
//! - [`Period`]: a tax period (month + year) with `MMYYYY` codes and parsing
//! - [`extract_otp`] / [`extract_arn`]: pull values out of forwarded SMS text
//! - [`FilingSms`]: the exact, immutable SMS text sent to the filing short code

pub mod error;
pub mod gstin;
pub mod otp;
pub mod period;
pub mod return_type;
pub mod sms;

pub use error::GstError;
pub use gstin::{Gstin, validate_gstin};
pub use otp::{extract_arn, extract_otp};
pub use period::{Period, format_period_for_display, normalize_period};
pub use return_type::ReturnType;
pub use sms::{FilingSms, sms_uri};
