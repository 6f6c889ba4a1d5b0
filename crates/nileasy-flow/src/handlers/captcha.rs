// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use nileasy_core::user::{BusinessProfile, UserRecord};
use nileasy_core::{ConversationState, ExternalErrorKind, NilEasyError};
use nileasy_gst::Gstin;
use tracing::{info, warn};

use super::{is_back, keyword};
use crate::context::FlowContext;
use crate::messages;
use crate::outcome::Outcome;

const STATE: ConversationState = ConversationState::AwaitingCaptcha;

/// Opens a captcha session for the user and returns the image URL.
///
/// `None` when the portal could not be reached.
pub(super) async fn issue(
    ctx: &FlowContext,
    user: &mut UserRecord,
) -> Result<Option<String>, NilEasyError> {
    match ctx.captcha.get_captcha(&user.id).await {
        Ok(ticket) => {
            user.session_data.captcha_session_id = Some(ticket.session_id);
            Ok(Some(ticket.image_url))
        }
        Err(e @ NilEasyError::ExternalService { .. }) => {
            warn!(error = %e, "captcha fetch failed");
            user.session_data.captcha_session_id = None;
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

async fn refresh(ctx: &FlowContext, user: &mut UserRecord) -> Result<Outcome, NilEasyError> {
    Ok(match issue(ctx, user).await? {
        Some(url) => Outcome::stay(STATE, messages::captcha_refreshed(&url)),
        None => Outcome::invalid(STATE, messages::portal_unavailable()),
    })
}

pub(crate) async fn handle(
    ctx: &FlowContext,
    user: &mut UserRecord,
    input: &str,
) -> Result<Outcome, NilEasyError> {
    let pending = user
        .session_data
        .pending_gstin
        .as_deref()
        .and_then(|raw| Gstin::parse(raw).ok());
    let Some(gstin) = pending else {
        return Ok(Outcome::go(ConversationState::AwaitingGstin, messages::ask_gstin()));
    };
    if is_back(input) {
        return Ok(Outcome::go(ConversationState::AwaitingGstin, messages::ask_gstin()));
    }

    let wants_refresh = matches!(keyword(input).as_str(), "refresh" | "new" | "reload");
    let session_id = match user.session_data.captcha_session_id.clone() {
        Some(id) if !wants_refresh => id,
        _ => return refresh(ctx, user).await,
    };

    let err = match ctx
        .captcha
        .verify_gstin(&user.id, &gstin, input, &session_id)
        .await
    {
        Ok(details) => {
            user.session_data.captcha_session_id = None;
            user.gstin = Some(gstin.as_str().to_string());
            let reply = messages::confirm_business(gstin.as_str(), &details, false);
            user.profile = Some(BusinessProfile::from_details(details, ctx.clock.now()));
            return Ok(Outcome::go(ConversationState::AwaitingConfirmation, reply));
        }
        // Blank answer: the session was not consumed.
        Err(NilEasyError::Validation { .. }) => {
            return Ok(Outcome::invalid(STATE, messages::captcha_empty()));
        }
        Err(e) => e,
    };

    user.session_data.captcha_session_id = None;
    match err.external_kind() {
        Some(ExternalErrorKind::GstinNotFound) => {
            info!(gstin = %gstin.masked(), "GSTIN not registered on portal");
            Ok(Outcome::go(
                ConversationState::AwaitingGstin,
                messages::gstin_not_found(gstin.as_str()),
            ))
        }
        Some(ExternalErrorKind::SessionExpired) => refresh(ctx, user).await,
        Some(ExternalErrorKind::BadCaptcha) => {
            let left = ctx.attempts_left(user);
            if left == 0 {
                return Ok(Outcome::rejected(STATE));
            }
            Ok(match issue(ctx, user).await? {
                Some(url) => Outcome::invalid(STATE, messages::captcha_retry(&url, left)),
                None => Outcome::invalid(STATE, messages::portal_unavailable()),
            })
        }
        Some(kind) => {
            warn!(error = %err, ?kind, "GSTIN verification failed");
            Ok(match issue(ctx, user).await? {
                Some(url) => Outcome::invalid(STATE, messages::captcha_refreshed(&url))
                    .preceded_by(messages::portal_unavailable()),
                None => Outcome::invalid(STATE, messages::portal_unavailable()),
            })
        }
        None => Err(err),
    }
}
