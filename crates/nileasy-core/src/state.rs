// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation states and the transition table.
//!
//! The happy path is linear:
//! `WELCOME -> AWAITING_GSTIN -> AWAITING_CAPTCHA -> AWAITING_CONFIRMATION ->
//! AWAITING_GST_TYPE -> AWAITING_DURATION -> SMS_GENERATION -> AWAITING_OTP -> COMPLETED`.
//!
//! Every state lists its valid successors, including retry-same-state and
//! go-back edges. Anything else is rejected.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A state in the filing conversation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationState {
    Welcome,
    AwaitingGstin,
    AwaitingCaptcha,
    AwaitingConfirmation,
    AwaitingGstType,
    AwaitingDuration,
    SmsGeneration,
    AwaitingOtp,
    Completed,
    SessionExpired,
    Error,
}

/// Static properties of a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateMetadata {
    /// Invalid inputs tolerated before the user is sent back.
    pub max_retries: u32,
    /// Minutes of inactivity after which the state expires. `None` never expires.
    pub timeout_minutes: Option<i64>,
    /// Whether the state waits for user input. States that don't are run
    /// immediately after being entered.
    pub expects_input: bool,
    /// Position in the progress indicator (0 = not started).
    pub step: u8,
}

/// Number of steps shown in the progress indicator.
pub const TOTAL_STEPS: u8 = 7;

impl ConversationState {
    /// Valid successors of this state.
    pub fn valid_transitions(self) -> &'static [ConversationState] {
        use ConversationState::*;
        match self {
            Welcome => &[Welcome, AwaitingGstin],
            AwaitingGstin => &[AwaitingGstin, AwaitingCaptcha, AwaitingConfirmation, Welcome],
            AwaitingCaptcha => &[AwaitingCaptcha, AwaitingConfirmation, AwaitingGstin],
            AwaitingConfirmation => &[AwaitingConfirmation, AwaitingGstType, AwaitingGstin],
            AwaitingGstType => &[AwaitingGstType, AwaitingDuration, AwaitingGstin],
            AwaitingDuration => &[AwaitingDuration, SmsGeneration, AwaitingGstType],
            SmsGeneration => &[SmsGeneration, AwaitingOtp],
            AwaitingOtp => &[AwaitingOtp, Completed, SmsGeneration],
            Completed => &[Completed, Welcome],
            SessionExpired => &[Welcome],
            Error => &[Welcome],
        }
    }

    /// Whether `next` is a valid successor of this state.
    pub fn can_transition_to(self, next: ConversationState) -> bool {
        self.valid_transitions().contains(&next)
    }

    pub fn metadata(self) -> StateMetadata {
        use ConversationState::*;
        let (max_retries, timeout_minutes, expects_input, step) = match self {
            Welcome => (3, None, true, 0),
            AwaitingGstin => (3, Some(30), true, 1),
            AwaitingCaptcha => (3, Some(15), true, 2),
            AwaitingConfirmation => (3, Some(30), true, 2),
            AwaitingGstType => (3, Some(30), true, 3),
            AwaitingDuration => (3, Some(30), true, 4),
            SmsGeneration => (0, Some(30), false, 5),
            AwaitingOtp => (5, Some(60), true, 6),
            Completed => (3, None, true, 7),
            SessionExpired | Error => (0, None, true, 0),
        };
        StateMetadata {
            max_retries,
            timeout_minutes,
            expects_input,
            step,
        }
    }

    /// States that end or interrupt a conversation.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConversationState::Completed
                | ConversationState::SessionExpired
                | ConversationState::Error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn display_round_trips() {
        for state in ConversationState::iter() {
            let s = state.to_string();
            assert_eq!(ConversationState::from_str(&s).unwrap(), state);
        }
        assert_eq!(ConversationState::AwaitingGstType.to_string(), "AWAITING_GST_TYPE");
        assert_eq!(ConversationState::SmsGeneration.to_string(), "SMS_GENERATION");
    }

    #[test]
    fn serde_matches_display() {
        let json = serde_json::to_string(&ConversationState::AwaitingOtp).unwrap();
        assert_eq!(json, "\"AWAITING_OTP\"");
    }

    #[test]
    fn happy_path_is_connected() {
        use ConversationState::*;
        let path = [
            Welcome,
            AwaitingGstin,
            AwaitingCaptcha,
            AwaitingConfirmation,
            AwaitingGstType,
            AwaitingDuration,
            SmsGeneration,
            AwaitingOtp,
            Completed,
            Welcome,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn steps_cannot_be_skipped() {
        use ConversationState::*;
        assert!(!Welcome.can_transition_to(AwaitingCaptcha));
        assert!(!AwaitingGstin.can_transition_to(AwaitingGstType));
        assert!(!AwaitingCaptcha.can_transition_to(SmsGeneration));
        assert!(!AwaitingDuration.can_transition_to(Completed));
        assert!(!SessionExpired.can_transition_to(AwaitingOtp));
    }

    #[test]
    fn every_input_state_can_retry_itself() {
        for state in ConversationState::iter() {
            let meta = state.metadata();
            if meta.expects_input && !matches!(
                state,
                ConversationState::SessionExpired | ConversationState::Error
            ) {
                assert!(state.can_transition_to(state), "{state} must allow retry");
            }
        }
    }

    #[test]
    fn only_sms_generation_runs_without_input() {
        let auto: Vec<_> = ConversationState::iter()
            .filter(|s| !s.metadata().expects_input)
            .collect();
        assert_eq!(auto, vec![ConversationState::SmsGeneration]);
    }

    #[test]
    fn steps_never_exceed_total() {
        for state in ConversationState::iter() {
            assert!(state.metadata().step <= TOTAL_STEPS);
        }
    }
}
