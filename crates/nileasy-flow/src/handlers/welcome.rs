// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::ConversationState;
use nileasy_core::user::{FilingMilestone, UserRecord};

use super::keyword;
use crate::messages::{self, BTN_HELP, BTN_START};
use crate::outcome::Outcome;

pub(crate) fn handle(user: &mut UserRecord, input: &str) -> Outcome {
    match keyword(input).as_str() {
        BTN_START | "1" | "start filing" | "file" | "yes" => {
            user.last_updated_status = Some(FilingMilestone::Initiated);
            Outcome::go(ConversationState::AwaitingGstin, messages::ask_gstin())
        }
        BTN_HELP | "2" => Outcome::stay(ConversationState::Welcome, messages::help()),
        _ => Outcome::stay(
            ConversationState::Welcome,
            messages::welcome(user.name.as_deref()),
        ),
    }
}

/// Any message after an expiry or an error starts over.
pub(crate) fn resume(user: &UserRecord) -> Outcome {
    Outcome::go(
        ConversationState::Welcome,
        messages::welcome(user.name.as_deref()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> UserRecord {
        UserRecord::for_phone("+919876543210", Some("Asha".into()), Utc::now())
    }

    #[test]
    fn start_button_asks_for_gstin() {
        let mut user = user();
        let outcome = handle(&mut user, "start_filing");
        assert_eq!(outcome.next, ConversationState::AwaitingGstin);
        assert_eq!(user.last_updated_status, Some(FilingMilestone::Initiated));
    }

    #[test]
    fn help_stays() {
        let outcome = handle(&mut user(), "Help");
        assert_eq!(outcome.next, ConversationState::Welcome);
        assert!(outcome.replies[0].text.contains("How NilEasy works"));
    }

    #[test]
    fn anything_else_repeats_welcome() {
        let outcome = handle(&mut user(), "what is this");
        assert_eq!(outcome.next, ConversationState::Welcome);
        assert!(!outcome.invalid_input);
        assert!(outcome.replies[0].text.contains("*Asha*"));
    }
}
