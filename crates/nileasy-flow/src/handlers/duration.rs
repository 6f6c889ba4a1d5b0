// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::user::UserRecord;
use nileasy_core::{ConversationState, NilEasyError};
use nileasy_gst::{GstError, Period};
use tracing::info;

use super::gst_type::period_menu;
use super::is_back;
use crate::context::FlowContext;
use crate::messages;
use crate::outcome::Outcome;

const STATE: ConversationState = ConversationState::AwaitingDuration;

/// A menu number (`1`..), a button id (`022026`) or free text (`Jan 2026`).
fn select_period(input: &str, menu: &[Period]) -> Result<Period, GstError> {
    let trimmed = input.trim();
    if let Ok(choice) = trimmed.parse::<usize>()
        && (1..=menu.len()).contains(&choice)
    {
        return Ok(menu[choice - 1]);
    }
    Period::parse(trimmed)
}

fn rejection(err: &GstError) -> String {
    match err {
        GstError::FuturePeriod(name) => {
            format!("{name} hasn't ended yet. You can only file for a completed month")
        }
        GstError::PeriodBeforeGst(_) => "GST returns can only be filed from July 2017".to_string(),
        _ => "I couldn't read that month".to_string(),
    }
}

pub(crate) async fn handle(
    ctx: &FlowContext,
    user: &mut UserRecord,
    input: &str,
) -> Result<Outcome, NilEasyError> {
    let return_type = match user.session_data.return_type {
        Some(return_type) if !is_back(input) => return_type,
        _ => {
            return Ok(Outcome::go(
                ConversationState::AwaitingGstType,
                messages::ask_return_type(),
            ));
        }
    };

    let period = match select_period(input, &period_menu(ctx))
        .and_then(|period| period.ensure_fileable(ctx.clock.today()))
    {
        Ok(period) => period,
        Err(e) => {
            return Ok(Outcome::invalid(
                STATE,
                messages::invalid_period(&rejection(&e), ctx.attempts_left(user)),
            ));
        }
    };
    user.session_data.period = Some(period);

    let mut outcome = Outcome::silent(ConversationState::SmsGeneration);
    if let Some(gstin) = user.gstin.as_deref() {
        let since = ctx
            .settings
            .duplicate_window
            .map(|window| ctx.clock.now() - window);
        if let Some(previous) = ctx
            .storage
            .find_completed_filing(gstin, return_type, period, since)
            .await?
        {
            info!(
                filing_id = previous.id,
                period = %period,
                "duplicate filing, warning user"
            );
            outcome = outcome.preceded_by(messages::duplicate_warning(&previous));
        }
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Vec<Period> {
        ["022026", "012026", "122025", "112025"]
            .iter()
            .map(|code| Period::from_code(code).unwrap())
            .collect()
    }

    #[test]
    fn menu_numbers_pick_listed_periods() {
        assert_eq!(select_period("1", &menu()).unwrap().code(), "022026");
        assert_eq!(select_period(" 4 ", &menu()).unwrap().code(), "112025");
    }

    #[test]
    fn codes_and_names_parse() {
        assert_eq!(select_period("022026", &menu()).unwrap().code(), "022026");
        assert_eq!(select_period("Jan 2026", &menu()).unwrap().code(), "012026");
    }

    #[test]
    fn out_of_range_numbers_are_rejected() {
        assert!(select_period("7", &menu()).is_err());
        assert!(select_period("0", &menu()).is_err());
    }

    #[test]
    fn rejection_reasons() {
        assert!(rejection(&GstError::FuturePeriod("March 2026".into())).contains("hasn't ended"));
        assert!(rejection(&GstError::PeriodBeforeGst("June 2017".into())).contains("July 2017"));
        assert!(rejection(&GstError::InvalidPeriod("x".into())).contains("couldn't read"));
    }
}
