// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::user::{FilingMilestone, UserRecord};
use nileasy_core::{ConversationState, NilEasyError};
use nileasy_gst::Gstin;
use tracing::{debug, info};

use super::captcha::issue;
use super::is_back;
use crate::context::FlowContext;
use crate::messages;
use crate::outcome::Outcome;

const STATE: ConversationState = ConversationState::AwaitingGstin;

pub(crate) async fn handle(
    ctx: &FlowContext,
    user: &mut UserRecord,
    input: &str,
) -> Result<Outcome, NilEasyError> {
    if is_back(input) {
        return Ok(Outcome::go(
            ConversationState::Welcome,
            messages::welcome(user.name.as_deref()),
        ));
    }

    let gstin = match Gstin::parse(input) {
        Ok(gstin) => gstin,
        Err(e) => {
            debug!(error = %e, "rejected GSTIN input");
            return Ok(Outcome::invalid(
                STATE,
                messages::invalid_gstin(ctx.attempts_left(user)),
            ));
        }
    };
    user.session_data.pending_gstin = Some(gstin.as_str().to_string());

    if ctx.settings.cache_business_details {
        let not_before = ctx.clock.now() - ctx.settings.cache_max_age;
        if let Some(profile) = ctx
            .storage
            .find_cached_profile(gstin.as_str(), not_before)
            .await?
        {
            info!(gstin = %gstin.masked(), "using cached business profile");
            let reply = messages::confirm_business(gstin.as_str(), &profile.details(), true);
            user.gstin = Some(gstin.as_str().to_string());
            user.profile = Some(profile);
            return Ok(Outcome::go(ConversationState::AwaitingConfirmation, reply));
        }
    }

    Ok(match issue(ctx, user).await? {
        Some(url) => {
            user.last_updated_status = Some(FilingMilestone::VerifyingCaptcha);
            Outcome::go(
                ConversationState::AwaitingCaptcha,
                messages::captcha(gstin.as_str(), &url),
            )
        }
        None => Outcome::invalid(STATE, messages::portal_unavailable()),
    })
}
