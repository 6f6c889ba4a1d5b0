// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `AWAITING_OTP` and its sub-stages.
//!
//! `sms_pending -> waiting_otp -> sending_confirmation -> waiting_arn`.
//! A forwarded OTP is picked up before the confirmation is sent, and an ARN
//! once it is, so users who skip the buttons still get through.

use nileasy_core::user::{
    FilingMilestone, FilingStatus, LinkKind, NewGeneratedLink, OtpStage, UserRecord,
};
use nileasy_core::{ConversationState, NilEasyError};
use nileasy_gst::{extract_arn, extract_otp};
use tracing::info;

use super::keyword;
use crate::context::FlowContext;
use crate::messages::{
    self, BTN_ARN_MISSING, BTN_ARN_RECEIVED, BTN_CNF_HELP, BTN_CNF_SENT, BTN_OTP_MISSING,
    BTN_OTP_RECEIVED, BTN_SMS_HELP, BTN_SMS_SENT,
};
use crate::outcome::Outcome;

const STATE: ConversationState = ConversationState::AwaitingOtp;

pub(crate) async fn handle(
    ctx: &FlowContext,
    user: &mut UserRecord,
    input: &str,
) -> Result<Outcome, NilEasyError> {
    let stage = user.session_data.otp_stage.unwrap_or(OtpStage::SmsPending);
    let kw = keyword(input);

    if matches!(kw.as_str(), "retry" | "resend" | "regenerate") {
        info!("regenerating filing SMS");
        return Ok(Outcome::silent(ConversationState::SmsGeneration));
    }
    if matches!(stage, OtpStage::SendingConfirmation | OtpStage::WaitingArn)
        && let Some(arn) = extract_arn(input)
    {
        return complete(ctx, user, Some(arn)).await;
    }
    if matches!(stage, OtpStage::SmsPending | OtpStage::WaitingOtp)
        && let Some(otp) = extract_otp(input)
    {
        return confirm(ctx, user, &otp).await;
    }

    let sms_number = ctx.sms_links.sms_number();
    let outcome = match stage {
        OtpStage::SmsPending => match kw.as_str() {
            BTN_SMS_SENT | "1" | "sent" | "yes" | "done" => {
                user.session_data.otp_stage = Some(OtpStage::WaitingOtp);
                Outcome::stay(STATE, messages::wait_for_otp())
            }
            BTN_SMS_HELP | "2" | "help" | "issue" | "problem" => {
                let sms_text = user.session_data.sms_text.as_deref().unwrap_or_default();
                Outcome::stay(STATE, messages::sms_help(sms_text, sms_number))
            }
            _ => Outcome::invalid(STATE, messages::sms_pending_prompt()),
        },
        OtpStage::WaitingOtp => match kw.as_str() {
            BTN_OTP_RECEIVED | "1" | "received" | "got" | "got it" | "yes" => {
                Outcome::stay(STATE, messages::ask_otp_digits())
            }
            BTN_OTP_MISSING | "2" | "no" | "not received" | "help" => {
                Outcome::stay(STATE, messages::otp_troubleshooting())
            }
            _ => Outcome::invalid(STATE, messages::wait_for_otp()),
        },
        OtpStage::SendingConfirmation => match kw.as_str() {
            BTN_CNF_SENT | "1" | "sent" | "done" | "yes" => {
                user.session_data.otp_stage = Some(OtpStage::WaitingArn);
                Outcome::stay(STATE, messages::wait_for_arn())
            }
            BTN_CNF_HELP | "2" | "help" => {
                let sms_text = user
                    .generated_links
                    .iter()
                    .rev()
                    .find(|link| link.kind == LinkKind::Confirmation)
                    .map(|link| link.sms_text.as_str())
                    .unwrap_or("CNF <code> <OTP>");
                Outcome::stay(STATE, messages::confirmation_help(sms_text, sms_number))
            }
            _ => Outcome::invalid(STATE, messages::confirmation_prompt()),
        },
        OtpStage::WaitingArn => match kw.as_str() {
            BTN_ARN_RECEIVED | "1" | "received" | "got" | "yes" | "done" => {
                return complete(ctx, user, None).await;
            }
            BTN_ARN_MISSING | "2" | "no" | "help" => {
                Outcome::stay(STATE, messages::arn_troubleshooting())
            }
            _ => Outcome::invalid(STATE, messages::wait_for_arn()),
        },
    };
    Ok(outcome)
}

/// Builds the `CNF` link for `otp` and moves to `sending_confirmation`.
async fn confirm(
    ctx: &FlowContext,
    user: &mut UserRecord,
    otp: &str,
) -> Result<Outcome, NilEasyError> {
    let Some(return_type) = user.session_data.return_type else {
        return Err(NilEasyError::not_found("return type", &user.id));
    };
    let link = ctx.sms_links.confirmation_link(return_type, otp).await?;
    let now = ctx.clock.now();

    if let Some(filing_id) = user.session_data.filing_id {
        let filing = ctx
            .storage
            .update_filing_status(filing_id, FilingStatus::OtpReceived, None, now)
            .await?;
        user.upsert_filing(filing);
    }
    if let (Some(gstin), Some(period)) = (user.gstin.clone(), user.session_data.period) {
        let record = ctx
            .storage
            .record_generated_link(&NewGeneratedLink {
                user_id: user.id.clone(),
                kind: LinkKind::Confirmation,
                gstin,
                return_type,
                period,
                short_url: link.url.clone(),
                short_code: link.short_code.clone(),
                sms_text: link.sms.as_str().to_string(),
                created_at: now,
            })
            .await?;
        user.generated_links.push(record);
    }
    info!(filing_id = ?user.session_data.filing_id, "confirmation SMS prepared");

    user.session_data.confirmation_link = Some(link.url.clone());
    user.session_data.otp_stage = Some(OtpStage::SendingConfirmation);
    Ok(Outcome::stay(
        STATE,
        messages::confirmation_ready(&link.url, link.sms.as_str(), ctx.sms_links.sms_number()),
    ))
}

/// Marks the filing completed and shows the summary.
async fn complete(
    ctx: &FlowContext,
    user: &mut UserRecord,
    arn: Option<String>,
) -> Result<Outcome, NilEasyError> {
    let (Some(return_type), Some(period), Some(gstin)) = (
        user.session_data.return_type,
        user.session_data.period,
        user.gstin.clone(),
    ) else {
        return Err(NilEasyError::not_found("filing selection", &user.id));
    };

    if let Some(filing_id) = user.session_data.filing_id {
        let filing = ctx
            .storage
            .update_filing_status(
                filing_id,
                FilingStatus::Completed,
                arn.as_deref(),
                ctx.clock.now(),
            )
            .await?;
        user.upsert_filing(filing);
    }
    user.last_updated_status = Some(FilingMilestone::FilingDone);
    info!(
        filing_id = ?user.session_data.filing_id,
        has_arn = arn.is_some(),
        "filing completed"
    );

    Ok(Outcome::go(
        ConversationState::Completed,
        messages::filing_completed(
            return_type,
            period,
            &gstin,
            arn.as_deref(),
            user.completed_filings(),
        ),
    ))
}
