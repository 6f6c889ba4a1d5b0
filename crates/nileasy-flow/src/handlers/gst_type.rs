// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::str::FromStr;

use nileasy_core::ConversationState;
use nileasy_core::user::UserRecord;
use nileasy_gst::{Period, ReturnType};

use super::{is_back, keyword};
use crate::context::FlowContext;
use crate::messages;
use crate::outcome::Outcome;

/// Reads a return type from a menu number, button id or name.
pub(crate) fn parse_return_type(input: &str) -> Option<ReturnType> {
    match keyword(input).as_str() {
        "1" => Some(ReturnType::Gstr1),
        "2" => Some(ReturnType::Gstr3b),
        other => ReturnType::from_str(other)
            .or_else(|_| ReturnType::from_sms_code(other))
            .ok(),
    }
}

/// The periods offered in the menu, newest first.
pub(crate) fn period_menu(ctx: &FlowContext) -> Vec<Period> {
    Period::recent(ctx.clock.today(), ctx.settings.period_options)
}

pub(crate) fn handle(ctx: &FlowContext, user: &mut UserRecord, input: &str) -> Outcome {
    if is_back(input) {
        return Outcome::go(ConversationState::AwaitingGstin, messages::ask_gstin());
    }
    match parse_return_type(input) {
        Some(return_type) => {
            user.session_data.return_type = Some(return_type);
            Outcome::go(
                ConversationState::AwaitingDuration,
                messages::ask_period(return_type, &period_menu(ctx)),
            )
        }
        None => Outcome::invalid(
            ConversationState::AwaitingGstType,
            messages::invalid_return_type(ctx.attempts_left(user)),
        ),
    }
}
