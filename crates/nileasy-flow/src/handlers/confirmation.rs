// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::ConversationState;
use nileasy_core::user::{FilingMilestone, UserRecord};

use super::keyword;
use crate::messages::{self, BTN_CONFIRM_NO, BTN_CONFIRM_YES};
use crate::outcome::Outcome;

pub(crate) fn handle(user: &mut UserRecord, input: &str) -> Outcome {
    match keyword(input).as_str() {
        BTN_CONFIRM_YES | "1" | "yes" | "y" | "correct" | "confirm" => {
            user.last_updated_status = Some(FilingMilestone::Onboarded);
            user.session_data.pending_gstin = None;
            Outcome::go(ConversationState::AwaitingGstType, messages::ask_return_type())
        }
        BTN_CONFIRM_NO | "2" | "no" | "n" | "wrong" | "change" => {
            user.gstin = None;
            user.profile = None;
            Outcome::go(ConversationState::AwaitingGstin, messages::ask_gstin())
        }
        _ => Outcome::invalid(
            ConversationState::AwaitingConfirmation,
            messages::confirm_prompt(),
        ),
    }
}
