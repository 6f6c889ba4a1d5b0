// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::ConversationState;
use nileasy_core::user::UserRecord;

use super::keyword;
use crate::messages::{self, BTN_ASPIRE, BTN_DONE, BTN_FILE_ANOTHER};
use crate::outcome::Outcome;

const STATE: ConversationState = ConversationState::Completed;

pub(crate) fn handle(user: &UserRecord, input: &str) -> Outcome {
    match keyword(input).as_str() {
        BTN_ASPIRE | "1" | "aspire" | "explore" => Outcome::stay(STATE, messages::aspire()),
        BTN_FILE_ANOTHER | "2" | "file" | "another" | "file another" => Outcome::go(
            ConversationState::Welcome,
            messages::welcome(user.name.as_deref()),
        ),
        BTN_DONE | "3" | "done" | "exit" | "bye" | "thanks" | "thank you" => {
            Outcome::stay(STATE, messages::goodbye())
        }
        _ => Outcome::stay(STATE, messages::completed_menu()),
    }
}
