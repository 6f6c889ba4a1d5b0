// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation state machine.
//!
//! [`ConversationMachine::advance`] applies one user input to a user record:
//! global restart keywords, inactivity expiry, routing to the state handler,
//! retry accounting, transition validation and auto-running states that do
//! not wait for input. It never fails; errors turn into replies.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use nileasy_core::user::{OtpStage, SessionData, UserRecord};
use nileasy_core::{ConversationState, NilEasyError};
use tracing::{debug, error, info, warn};

use crate::context::FlowContext;
use crate::handlers::{self, keyword};
use crate::messages;
use crate::outcome::{Outcome, Reply};

/// Inputs that restart the conversation from any state.
pub const RESTART_KEYWORDS: [&str; 5] = ["hi", "hello", "start", "reset", "restart"];

/// Upper bound on states run for a single input.
const MAX_CHAINED_STEPS: usize = 3;

pub fn is_restart(input: &str) -> bool {
    RESTART_KEYWORDS.contains(&keyword(input).as_str())
}

/// Where a user lands once a state's retry budget is spent.
pub fn fallback_state(state: ConversationState) -> Option<ConversationState> {
    use ConversationState::*;
    match state {
        AwaitingGstin | Completed => Some(Welcome),
        AwaitingCaptcha | AwaitingConfirmation | AwaitingGstType => Some(AwaitingGstin),
        AwaitingDuration => Some(AwaitingGstType),
        AwaitingOtp => Some(SmsGeneration),
        Welcome | SmsGeneration | SessionExpired | Error => None,
    }
}

/// Drives users through the filing conversation.
pub struct ConversationMachine {
    ctx: Arc<FlowContext>,
}

impl ConversationMachine {
    pub fn new(ctx: Arc<FlowContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    /// Applies `input` to `user` and returns the replies to send.
    ///
    /// The caller persists `user` afterwards.
    pub async fn advance(
        &self,
        user: &mut UserRecord,
        input: &str,
        now: DateTime<Utc>,
    ) -> Vec<Reply> {
        if is_restart(input) || user.expired_at.is_some() {
            info!(from = %user.current_state, "conversation restarted");
            user.expired_at = None;
            reset(user, ConversationState::Welcome);
            return vec![messages::welcome(user.name.as_deref())];
        }
        if is_inactive(user, now) {
            info!(state = %user.current_state, "session expired after inactivity");
            reset(user, ConversationState::SessionExpired);
            return vec![messages::session_expired()];
        }

        let mut replies = Vec::new();
        let mut input = input.to_string();
        for _ in 0..MAX_CHAINED_STEPS {
            let from = user.current_state;
            let outcome = match handlers::route(&self.ctx, user, &input).await {
                Ok(outcome) => outcome,
                Err(e) => match recoverable(from, &e) {
                    Some(outcome) => outcome,
                    None => {
                        replies.push(self.fail(user, &e));
                        break;
                    }
                },
            };
            replies.extend(self.apply(user, from, outcome));

            let state = user.current_state;
            if state == from || state.metadata().expects_input {
                break;
            }
            input.clear();
        }
        replies
    }

    /// Retry accounting and transition validation for one handler outcome.
    fn apply(&self, user: &mut UserRecord, from: ConversationState, outcome: Outcome) -> Vec<Reply> {
        let Outcome {
            mut next,
            mut replies,
            invalid_input,
        } = outcome;

        if invalid_input {
            user.session_data.retry_count += 1;
            let retries = user.session_data.retry_count;
            let max = self.ctx.max_retries(from);
            if max > 0
                && retries >= max
                && let Some(fallback) = fallback_state(from)
            {
                warn!(state = %from, retries, fallback = %fallback, "retry budget exhausted");
                next = fallback;
                replies = vec![messages::too_many_attempts()];
                replies.extend(self.prompt_for(user, fallback));
            }
        }

        if !from.can_transition_to(next) {
            warn!(from = %from, to = %next, "rejected invalid transition");
            let mut corrective = vec![messages::off_track()];
            corrective.extend(self.prompt_for(user, from));
            return corrective;
        }

        if next != from {
            debug!(from = %from, to = %next, "state transition");
            enter(user, next);
            if next.metadata().expects_input
                && let Some(progress) = messages::progress(next)
                && let Some(last) = replies.last_mut()
            {
                last.text.push_str(&format!("\n\n{progress}"));
            }
        }
        user.current_state = next;
        replies
    }

    /// Moves the user to ERROR and builds the restart hint.
    fn fail(&self, user: &mut UserRecord, err: &NilEasyError) -> Reply {
        match err {
            NilEasyError::NotFound { .. } => {
                warn!(state = %user.current_state, error = %err, "conversation data missing")
            }
            _ => error!(state = %user.current_state, error = %err, "handler failed"),
        }
        reset(user, ConversationState::Error);
        let detail = self
            .ctx
            .settings
            .expose_error_details
            .then(|| err.to_string());
        messages::internal_error(detail.as_deref())
    }

    /// The prompt a user sees when (re)entering `state` outside its handler.
    fn prompt_for(&self, user: &UserRecord, state: ConversationState) -> Vec<Reply> {
        use ConversationState::*;
        let reply = match state {
            Welcome => messages::welcome(user.name.as_deref()),
            AwaitingGstin => messages::ask_gstin(),
            AwaitingCaptcha => messages::captcha_empty(),
            AwaitingConfirmation => messages::confirm_prompt(),
            AwaitingGstType => messages::ask_return_type(),
            AwaitingDuration => match user.session_data.return_type {
                Some(return_type) => messages::ask_period(
                    return_type,
                    &handlers::period_menu(&self.ctx),
                ),
                None => messages::ask_return_type(),
            },
            // Runs straight away and speaks for itself.
            SmsGeneration => return Vec::new(),
            AwaitingOtp => match user.session_data.otp_stage.unwrap_or(OtpStage::SmsPending) {
                OtpStage::SmsPending => messages::sms_pending_prompt(),
                OtpStage::WaitingOtp => messages::wait_for_otp(),
                OtpStage::SendingConfirmation => messages::confirmation_prompt(),
                OtpStage::WaitingArn => messages::wait_for_arn(),
            },
            Completed => messages::completed_menu(),
            SessionExpired => messages::session_expired(),
            Error => messages::internal_error(None),
        };
        vec![reply]
    }
}

/// Errors a handler may raise that keep the user in place.
fn recoverable(from: ConversationState, err: &NilEasyError) -> Option<Outcome> {
    match err {
        NilEasyError::Validation { message } => {
            Some(Outcome::invalid(from, messages::invalid_input(message)))
        }
        NilEasyError::ExternalService { .. } | NilEasyError::Timeout { .. } => {
            warn!(state = %from, error = %err, "external call failed");
            Some(Outcome::invalid(from, messages::temporarily_unavailable()))
        }
        _ => None,
    }
}

fn is_inactive(user: &UserRecord, now: DateTime<Utc>) -> bool {
    user.current_state
        .metadata()
        .timeout_minutes
        .is_some_and(|minutes| now - user.last_active_at > Duration::minutes(minutes))
}

/// Forces `state`, dropping all session data. Bypasses the transition table.
fn reset(user: &mut UserRecord, state: ConversationState) {
    user.session_data = SessionData::default();
    user.current_state = state;
}

/// Clears what the entered state is about to collect again.
fn enter(user: &mut UserRecord, next: ConversationState) {
    let session = &mut user.session_data;
    match next {
        ConversationState::Welcome => *session = SessionData::default(),
        ConversationState::AwaitingGstin => {
            session.pending_gstin = None;
            session.captcha_session_id = None;
        }
        ConversationState::SmsGeneration => {
            session.otp_stage = None;
            session.confirmation_link = None;
        }
        _ => {}
    }
    session.retry_count = 0;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn restart_keywords_ignore_case_and_spacing() {
        assert!(is_restart("Hi"));
        assert!(is_restart("  RESTART "));
        assert!(is_restart("hello"));
        assert!(!is_restart("hi there"));
        assert!(!is_restart("start_filing"));
    }

    #[test]
    fn fallbacks_are_valid_transitions() {
        for state in ConversationState::iter() {
            if let Some(fallback) = fallback_state(state) {
                assert!(
                    state.can_transition_to(fallback),
                    "{state} -> {fallback} must be in the table"
                );
            }
        }
    }

    #[test]
    fn states_with_retry_budget_have_fallbacks() {
        use ConversationState::*;
        for state in [
            AwaitingGstin,
            AwaitingCaptcha,
            AwaitingConfirmation,
            AwaitingGstType,
            AwaitingDuration,
            AwaitingOtp,
        ] {
            assert!(fallback_state(state).is_some(), "{state}");
        }
    }

    #[test]
    fn inactivity_uses_state_timeout() {
        let start = Utc::now();
        let mut user = UserRecord::for_phone("+919876543210", None, start);
        user.current_state = ConversationState::AwaitingCaptcha;
        assert!(!is_inactive(&user, start + Duration::minutes(15)));
        assert!(is_inactive(&user, start + Duration::minutes(16)));

        user.current_state = ConversationState::Welcome;
        assert!(!is_inactive(&user, start + Duration::days(30)));
    }

    #[test]
    fn entering_welcome_clears_session() {
        let mut user = UserRecord::for_phone("+919876543210", None, Utc::now());
        user.session_data.pending_gstin = Some("29AABCU9603R1ZX".into());
        user.session_data.retry_count = 2;
        enter(&mut user, ConversationState::Welcome);
        assert_eq!(user.session_data, SessionData::default());
    }

    #[test]
    fn entering_sms_generation_resets_otp_stage() {
        let mut user = UserRecord::for_phone("+919876543210", None, Utc::now());
        user.session_data.otp_stage = Some(OtpStage::WaitingArn);
        user.session_data.sms_text = Some("NIL 3B 29AABCU9603R1ZX 022026".into());
        enter(&mut user, ConversationState::SmsGeneration);
        assert!(user.session_data.otp_stage.is_none());
        assert!(user.session_data.sms_text.is_some());
    }

    #[test]
    fn validation_errors_count_as_retries() {
        let outcome = recoverable(
            ConversationState::AwaitingDuration,
            &NilEasyError::validation("period is in the future"),
        )
        .unwrap();
        assert!(outcome.invalid_input);
        assert_eq!(outcome.next, ConversationState::AwaitingDuration);
        assert!(recoverable(
            ConversationState::AwaitingDuration,
            &NilEasyError::Internal("boom".into())
        )
        .is_none());
    }

    fn machine_over(h: &nileasy_test_utils::TestHarness) -> ConversationMachine {
        use crate::context::FlowSettings;
        use nileasy_portal::CaptchaService;
        use nileasy_shortlink::SmsLinkService;

        let captcha = Arc::new(CaptchaService::new(
            h.portal.clone(),
            h.storage.clone(),
            h.clock.clone(),
            h.config.portal.captcha_ttl_minutes,
            "https://nileasy.test",
        ));
        let sms_links =
            SmsLinkService::new(Some(h.shortener.clone()), &h.config.filing.sms_number);
        ConversationMachine::new(Arc::new(FlowContext::new(
            h.storage.clone(),
            captcha,
            sms_links,
            h.clock.clone(),
            FlowSettings::from_config(&h.config),
        )))
    }

    #[tokio::test]
    async fn transition_outside_the_table_keeps_the_state() {
        use ConversationState::*;
        let h = nileasy_test_utils::TestHarness::builder()
            .build()
            .await
            .unwrap();
        let machine = machine_over(&h);
        let mut user = UserRecord::for_phone(nileasy_test_utils::TEST_PHONE, None, Utc::now());
        user.current_state = AwaitingGstin;
        assert!(!AwaitingGstin.can_transition_to(Completed));

        let replies = machine.apply(
            &mut user,
            AwaitingGstin,
            Outcome::go(Completed, Reply::text("done")),
        );

        assert_eq!(user.current_state, AwaitingGstin);
        assert_eq!(replies, vec![messages::off_track(), messages::ask_gstin()]);
    }
}
