// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use nileasy_core::phone::mask_phone;
use nileasy_core::{HealthStatus, NilEasyError, PluginAdapter};
use nileasy_flow::api::{
    SmsLinkRequest, SmsLinkResponse, TrackCompletionRequest, TrackCompletionResponse,
    ValidateGstinRequest, ValidateGstinResponse, VerifyCaptchaRequest, VerifyCaptchaResponse,
};
use nileasy_whatsapp::parse_webhook;
use nileasy_whatsapp::signature::verify_signature;
use nileasy_whatsapp::webhook::parse_form;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::ApiError;
use crate::otp_page::{OtpCallbackQuery, OtpPage};
use crate::server::GatewayState;

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    /// Storage health (`healthy`, `degraded: ...`, `unhealthy: ...`).
    pub storage: String,
}

/// Response body for POST /webhook.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub status: &'static str,
}

/// GET /health
///
/// Answers 503 when storage is not healthy.
pub async fn get_health(State(state): State<GatewayState>) -> (StatusCode, Json<HealthResponse>) {
    let (healthy, storage) = match state.context().storage.health_check().await {
        Ok(HealthStatus::Healthy) => (true, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (false, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => (false, format!("unhealthy: {reason}")),
        Err(e) => (false, format!("unhealthy: {e}")),
    };
    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (
        code,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.health.start_time.elapsed().as_secs(),
            storage,
        }),
    )
}

/// POST /webhook
///
/// Runs one chat turn and sends the replies through the outbound channel.
/// Anything past the signature check is acknowledged with 200 so the
/// gateway does not redeliver.
pub async fn post_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, ApiError> {
    if let Some(token) = state.webhook.twilio_auth_token.as_deref() {
        check_twilio_signature(token, &state.webhook.webhook_url, &headers, &body)?;
    }

    let msg = match parse_webhook(&body, state.context().clock.now()) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(error = %e, "ignoring webhook");
            return Ok(Json(WebhookAck { status: "ignored" }));
        }
    };
    debug!(
        phone = %mask_phone(&msg.phone),
        platform = %msg.platform,
        message_id = %msg.message_id,
        "webhook received"
    );

    match state.dispatcher.dispatch(&msg).await {
        Ok(_) => Ok(Json(WebhookAck { status: "ok" })),
        Err(e) => {
            error!(phone = %mask_phone(&msg.phone), error = %e, "reply delivery failed");
            Ok(Json(WebhookAck {
                status: "delivery_failed",
            }))
        }
    }
}

/// Verifies `X-Twilio-Signature` over the webhook URL and form parameters.
fn check_twilio_signature(
    token: &str,
    url: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), NilEasyError> {
    let signature = headers
        .get("x-twilio-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| NilEasyError::Unauthorized("missing X-Twilio-Signature".into()))?;

    let is_form = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    let params = if is_form {
        parse_form(body)?
    } else {
        Default::default()
    };

    if verify_signature(token, url, &params, signature) {
        Ok(())
    } else {
        warn!("rejected webhook with bad Twilio signature");
        Err(NilEasyError::Unauthorized("invalid Twilio signature".into()))
    }
}

/// POST /api/v1/validate-gstin
pub async fn post_validate_gstin(
    State(state): State<GatewayState>,
    Json(req): Json<ValidateGstinRequest>,
) -> Result<Json<ValidateGstinResponse>, ApiError> {
    Ok(Json(state.api.validate_gstin(req).await?))
}

/// POST /api/v1/verify-captcha
pub async fn post_verify_captcha(
    State(state): State<GatewayState>,
    Json(req): Json<VerifyCaptchaRequest>,
) -> Result<Json<VerifyCaptchaResponse>, ApiError> {
    Ok(Json(state.api.verify_captcha(req).await?))
}

/// POST /api/v1/generate-sms-link
pub async fn post_generate_sms_link(
    State(state): State<GatewayState>,
    Json(req): Json<SmsLinkRequest>,
) -> Result<Json<SmsLinkResponse>, ApiError> {
    Ok(Json(state.api.generate_sms_link(req).await?))
}

/// POST /api/v1/track-completion
pub async fn post_track_completion(
    State(state): State<GatewayState>,
    Json(req): Json<TrackCompletionRequest>,
) -> Result<Json<TrackCompletionResponse>, ApiError> {
    Ok(Json(state.api.track_completion(req).await?))
}

/// GET /api/v1/captcha/{id}
pub async fn get_captcha_image(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    match state.context().captcha.captcha_image(&id).await? {
        Some((image, content_type)) => Ok((
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            image,
        )
            .into_response()),
        None => Err(NilEasyError::not_found("captcha session", id).into()),
    }
}

/// GET /otp-callback
///
/// `c` marks the matching generated link as clicked. Tracking failures are
/// logged and never block the page.
pub async fn get_otp_callback(
    State(state): State<GatewayState>,
    Query(query): Query<OtpCallbackQuery>,
) -> Result<Html<String>, ApiError> {
    let page = OtpPage::from_query(&query)?;
    let ctx = state.context();

    if let Some(code) = query.c.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        match ctx.storage.mark_link_clicked(code).await {
            Ok(true) => debug!(short_code = code, "link click recorded"),
            Ok(false) => debug!(short_code = code, "click for unknown link"),
            Err(e) => warn!(short_code = code, error = %e, "failed to record link click"),
        }
    }

    info!(
        phone = %mask_phone(&page.phone),
        gstin = %page.gstin.masked(),
        "OTP page opened"
    );
    Ok(Html(page.render(ctx.sms_links.sms_number())?))
}
