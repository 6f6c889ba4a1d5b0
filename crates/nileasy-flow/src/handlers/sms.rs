// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::user::{
    FilingMilestone, FilingStatus, LinkKind, NewFiling, NewGeneratedLink, OtpStage, UserRecord,
};
use nileasy_core::{ConversationState, NilEasyError};
use nileasy_gst::Gstin;
use tracing::info;

use crate::context::FlowContext;
use crate::messages;
use crate::outcome::Outcome;

/// Records the filing attempt and prepares the `NIL` SMS link.
///
/// Runs without user input, straight after the period is chosen or when
/// the user asks for a fresh link.
pub(crate) async fn handle(
    ctx: &FlowContext,
    user: &mut UserRecord,
) -> Result<Outcome, NilEasyError> {
    let (Some(return_type), Some(period)) =
        (user.session_data.return_type, user.session_data.period)
    else {
        return Err(NilEasyError::not_found("filing selection", &user.id));
    };
    let gstin = match user.gstin.as_deref() {
        Some(raw) => Gstin::parse(raw)?,
        None => return Err(NilEasyError::not_found("verified GSTIN", &user.id)),
    };
    let now = ctx.clock.now();

    let mut filing = ctx
        .storage
        .record_filing(&NewFiling {
            user_id: user.id.clone(),
            gstin: gstin.as_str().to_string(),
            return_type,
            period,
            created_at: now,
        })
        .await?;
    if filing.status == FilingStatus::Initiated {
        filing = ctx
            .storage
            .update_filing_status(filing.id, FilingStatus::SmsLinkGenerated, None, now)
            .await?;
    }

    let link = ctx.sms_links.filing_link(return_type, &gstin, period).await;
    let record = ctx
        .storage
        .record_generated_link(&NewGeneratedLink {
            user_id: user.id.clone(),
            kind: LinkKind::Filing,
            gstin: gstin.as_str().to_string(),
            return_type,
            period,
            short_url: link.url.clone(),
            short_code: link.short_code.clone(),
            sms_text: link.sms.as_str().to_string(),
            created_at: now,
        })
        .await?;
    info!(
        filing_id = filing.id,
        shortened = link.is_shortened(),
        "filing SMS prepared"
    );

    let session = &mut user.session_data;
    session.filing_id = Some(filing.id);
    session.sms_text = Some(link.sms.as_str().to_string());
    session.sms_link = Some(link.url.clone());
    session.otp_stage = Some(OtpStage::SmsPending);
    session.confirmation_link = None;
    user.upsert_filing(filing);
    user.generated_links.push(record);
    user.last_updated_status = Some(FilingMilestone::SmsGenerated);

    Ok(Outcome::go(
        ConversationState::AwaitingOtp,
        messages::sms_ready(
            return_type,
            period,
            &link.url,
            link.sms.as_str(),
            ctx.sms_links.sms_number(),
        ),
    ))
}
