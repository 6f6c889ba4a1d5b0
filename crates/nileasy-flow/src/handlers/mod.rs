// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One handler per conversation state.
//!
//! Handlers validate the input, perform external calls, update the user
//! record and name the next state. They never persist anything about the
//! user themselves; filing and link history is written as it happens.

mod captcha;
mod completed;
mod confirmation;
mod duration;
mod gst_type;
mod gstin;
mod otp;
mod sms;
mod welcome;

use nileasy_core::user::UserRecord;
use nileasy_core::{ConversationState, NilEasyError};

use crate::context::FlowContext;
use crate::outcome::Outcome;

pub(crate) use gst_type::period_menu;

/// Runs the handler for the user's current state.
pub(crate) async fn route(
    ctx: &FlowContext,
    user: &mut UserRecord,
    input: &str,
) -> Result<Outcome, NilEasyError> {
    use ConversationState::*;
    match user.current_state {
        Welcome => Ok(welcome::handle(user, input)),
        AwaitingGstin => gstin::handle(ctx, user, input).await,
        AwaitingCaptcha => captcha::handle(ctx, user, input).await,
        AwaitingConfirmation => Ok(confirmation::handle(user, input)),
        AwaitingGstType => Ok(gst_type::handle(ctx, user, input)),
        AwaitingDuration => duration::handle(ctx, user, input).await,
        SmsGeneration => sms::handle(ctx, user).await,
        AwaitingOtp => otp::handle(ctx, user, input).await,
        Completed => Ok(completed::handle(user, input)),
        SessionExpired | Error => Ok(welcome::resume(user)),
    }
}

/// Lower-cased, trimmed input for keyword matching.
pub(crate) fn keyword(input: &str) -> String {
    input.trim().to_lowercase()
}

fn is_back(input: &str) -> bool {
    matches!(keyword(input).as_str(), "back" | "change" | "go back")
}
