// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateless filing operations for callers that run their own conversation.
//!
//! Every request carries what it needs. Records created here are keyed by
//! GSTIN until a phone number turns up.

use std::str::FromStr;
use std::sync::Arc;

use nileasy_core::phone::{is_valid_phone, mask_phone, normalize_phone};
use nileasy_core::user::{
    BusinessProfile, FilingMilestone, FilingStatus, LinkKind, NewFiling, NewGeneratedLink,
    UserRecord,
};
use nileasy_core::{ExternalErrorKind, NilEasyError};
use nileasy_gst::{Gstin, Period, ReturnType};
use nileasy_portal::RateLimiter;
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, warn};

use crate::context::FlowContext;

const SMS_CAUTION: &str = "Send from your GST-registered mobile only and do not edit the SMS text. \
     The OTP usually arrives within two minutes.";

/// `valid` in the GSTIN validation response: `true`, `false` or `"found"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GstinValidity {
    Valid,
    Invalid,
    /// A cached business profile exists; no captcha needed.
    Found,
}

impl Serialize for GstinValidity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GstinValidity::Valid => serializer.serialize_bool(true),
            GstinValidity::Invalid => serializer.serialize_bool(false),
            GstinValidity::Found => serializer.serialize_str("found"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidateGstinRequest {
    pub gstin: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateGstinResponse {
    pub valid: GstinValidity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCaptchaRequest {
    pub session_id: String,
    pub gstin: String,
    pub captcha: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyCaptchaResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legal_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gstin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsLinkRequest {
    pub gstin: String,
    /// `3B` or `R1`.
    pub gst_type: String,
    /// `MMYYYY`.
    pub period: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SmsLinkResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final outcome reported by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportedStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackCompletionRequest {
    pub phone: String,
    pub gstin: String,
    pub gst_type: String,
    pub period: String,
    pub status: ReportedStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackCompletionResponse {
    pub tracked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Accepts `3B`/`R1` as well as the names the chat flow understands.
fn parse_gst_type(raw: &str) -> Result<ReturnType, NilEasyError> {
    ReturnType::from_sms_code(raw)
        .or_else(|_| ReturnType::from_str(raw.trim()))
        .map_err(|_| NilEasyError::validation(format!("unsupported gst_type `{}`", raw.trim())))
}

/// Backs the `/api/v1` endpoints.
pub struct FilingApi {
    ctx: Arc<FlowContext>,
    lookups: RateLimiter,
}

impl FilingApi {
    /// `lookups` throttles GSTIN validation per GSTIN.
    pub fn new(ctx: Arc<FlowContext>, lookups: RateLimiter) -> Self {
        Self { ctx, lookups }
    }

    /// Loads (or creates) the GSTIN-keyed record, applies `update` and saves it.
    async fn update_record<F>(&self, gstin: &Gstin, update: F) -> Result<UserRecord, NilEasyError>
    where
        F: FnOnce(&mut UserRecord),
    {
        let storage = &self.ctx.storage;
        let now = self.ctx.clock.now();
        let mut user = match storage.get_user(gstin.as_str()).await? {
            Some(user) => user,
            None => {
                let user = UserRecord::for_gstin(gstin.as_str(), now);
                storage.create_user(&user).await?;
                user
            }
        };
        update(&mut user);
        user.updated_at = now;
        user.last_active_at = now;
        user.version = storage.save_user(&user).await?;
        Ok(user)
    }

    /// Checks the GSTIN format and starts a captcha session for it.
    pub async fn validate_gstin(
        &self,
        req: ValidateGstinRequest,
    ) -> Result<ValidateGstinResponse, NilEasyError> {
        let gstin = match Gstin::parse(&req.gstin) {
            Ok(gstin) => gstin,
            Err(e) => {
                return Ok(ValidateGstinResponse {
                    valid: GstinValidity::Invalid,
                    captcha_url: None,
                    session_id: None,
                    error: Some(e.to_string()),
                });
            }
        };

        if let Some(raw) = req.phone.as_deref().filter(|p| !p.trim().is_empty()) {
            let phone = normalize_phone(raw);
            if !is_valid_phone(&phone) {
                return Err(NilEasyError::validation(format!("invalid phone `{}`", raw.trim())));
            }
            info!(gstin = %gstin.masked(), phone = %mask_phone(&phone), "linking phone to GSTIN");
            self.update_record(&gstin, |user| {
                user.phone = Some(phone);
                user.last_updated_status = Some(FilingMilestone::Initiated);
            })
            .await?;
        }

        self.lookups.check(gstin.as_str()).await?;

        if self.ctx.settings.cache_business_details {
            let not_before = self.ctx.clock.now() - self.ctx.settings.cache_max_age;
            if self
                .ctx
                .storage
                .find_cached_profile(gstin.as_str(), not_before)
                .await?
                .is_some()
            {
                info!(gstin = %gstin.masked(), "GSTIN found in profile cache");
                return Ok(ValidateGstinResponse {
                    valid: GstinValidity::Found,
                    captcha_url: None,
                    session_id: None,
                    error: None,
                });
            }
        }

        let ticket = self.ctx.captcha.get_captcha(gstin.as_str()).await?;
        Ok(ValidateGstinResponse {
            valid: GstinValidity::Valid,
            captcha_url: Some(ticket.image_url),
            session_id: Some(ticket.session_id),
            error: None,
        })
    }

    /// Verifies the captcha answer and returns the business details.
    ///
    /// A wrong answer, expired session or unknown GSTIN is reported in the
    /// body with `success = false`.
    pub async fn verify_captcha(
        &self,
        req: VerifyCaptchaRequest,
    ) -> Result<VerifyCaptchaResponse, NilEasyError> {
        let gstin = Gstin::parse(&req.gstin)?;
        let result = self
            .ctx
            .captcha
            .verify_gstin(gstin.as_str(), &gstin, &req.captcha, &req.session_id)
            .await;

        let details = match result {
            Ok(details) => details,
            Err(e @ (NilEasyError::Validation { .. } | NilEasyError::ExternalService { .. })) => {
                warn!(gstin = %gstin.masked(), error = %e, "captcha verification failed");
                self.update_record(&gstin, |user| {
                    user.last_updated_status = Some(FilingMilestone::VerifyingCaptcha);
                })
                .await?;
                let error = match e.external_kind() {
                    Some(ExternalErrorKind::BadCaptcha) => "Invalid captcha. Please try again.",
                    Some(ExternalErrorKind::SessionExpired) => {
                        "Captcha session expired. Please validate the GSTIN again."
                    }
                    Some(ExternalErrorKind::GstinNotFound) => "GSTIN not found on the GST portal.",
                    Some(_) => "The GST portal is not responding. Please try again.",
                    None => "Captcha answer is empty.",
                };
                return Ok(VerifyCaptchaResponse {
                    success: false,
                    error: Some(error.to_string()),
                    ..VerifyCaptchaResponse::default()
                });
            }
            Err(e) => return Err(e),
        };

        let profile = BusinessProfile::from_details(details.clone(), self.ctx.clock.now());
        self.update_record(&gstin, |user| {
            user.gstin = Some(gstin.as_str().to_string());
            user.profile = Some(profile);
            user.last_updated_status = Some(FilingMilestone::Onboarded);
        })
        .await?;

        Ok(VerifyCaptchaResponse {
            success: true,
            business_name: Some(details.business_name),
            legal_name: Some(details.legal_name),
            address: Some(details.address),
            registration_date: Some(details.registration_date),
            status: Some(details.status),
            gstin: Some(gstin.as_str().to_string()),
            error: None,
        })
    }

    /// Builds the `NIL` SMS link and records the filing attempt.
    pub async fn generate_sms_link(
        &self,
        req: SmsLinkRequest,
    ) -> Result<SmsLinkResponse, NilEasyError> {
        let gstin = Gstin::parse(&req.gstin)?;
        let return_type = parse_gst_type(&req.gst_type)?;
        let period = Period::from_code(&req.period)?.ensure_fileable(self.ctx.clock.today())?;
        let now = self.ctx.clock.now();
        let storage = &self.ctx.storage;

        let since = self.ctx.settings.duplicate_window.map(|window| now - window);
        let duplicate = storage
            .find_completed_filing(gstin.as_str(), return_type, period, since)
            .await?;

        let user = self
            .update_record(&gstin, |user| {
                user.last_updated_status = Some(FilingMilestone::SmsGenerated);
            })
            .await?;

        let filing = storage
            .record_filing(&NewFiling {
                user_id: user.id.clone(),
                gstin: gstin.as_str().to_string(),
                return_type,
                period,
                created_at: now,
            })
            .await?;
        if filing.status == FilingStatus::Initiated {
            storage
                .update_filing_status(filing.id, FilingStatus::SmsLinkGenerated, None, now)
                .await?;
        }

        let link = self.ctx.sms_links.filing_link(return_type, &gstin, period).await;
        storage
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
            gstin = %gstin.masked(),
            filing_id = filing.id,
            duplicate = duplicate.is_some(),
            "SMS link generated"
        );

        let warning = match duplicate {
            Some(previous) => format!(
                "{return_type} for {} was already filed on {}. {SMS_CAUTION}",
                period.display_name(),
                previous
                    .completed_at
                    .unwrap_or(previous.updated_at)
                    .format("%d %b %Y"),
            ),
            None => SMS_CAUTION.to_string(),
        };
        Ok(SmsLinkResponse {
            success: true,
            sms_link: Some(link.url),
            sms_preview: Some(link.sms.as_str().to_string()),
            instruction: Some(format!(
                "Tap the link to send the SMS to {} from your GST-registered mobile number.",
                self.ctx.sms_links.sms_number()
            )),
            warning: Some(warning),
            error: None,
        })
    }

    /// Records the caller-reported outcome of a filing.
    pub async fn track_completion(
        &self,
        req: TrackCompletionRequest,
    ) -> Result<TrackCompletionResponse, NilEasyError> {
        let gstin = Gstin::parse(&req.gstin)?;
        let return_type = parse_gst_type(&req.gst_type)?;
        let period = Period::from_code(&req.period)?;
        let phone = normalize_phone(&req.phone);
        if !is_valid_phone(&phone) {
            return Err(NilEasyError::validation(format!(
                "invalid phone `{}`",
                req.phone.trim()
            )));
        }
        let now = self.ctx.clock.now();

        let user = self
            .update_record(&gstin, |user| {
                user.phone = Some(phone.clone());
                if req.status == ReportedStatus::Completed {
                    user.last_updated_status = Some(FilingMilestone::FilingDone);
                }
            })
            .await?;

        let filing = self
            .ctx
            .storage
            .record_filing(&NewFiling {
                user_id: user.id.clone(),
                gstin: gstin.as_str().to_string(),
                return_type,
                period,
                created_at: now,
            })
            .await?;
        let status = match req.status {
            ReportedStatus::Completed => FilingStatus::Completed,
            ReportedStatus::Failed => FilingStatus::Failed,
        };
        self.ctx
            .storage
            .update_filing_status(filing.id, status, None, now)
            .await?;
        info!(
            gstin = %gstin.masked(),
            phone = %mask_phone(&phone),
            status = %status,
            "filing outcome tracked"
        );

        let message = match req.status {
            ReportedStatus::Completed => {
                "Your filing has been recorded. Thank you for using NilEasy!"
            }
            ReportedStatus::Failed => {
                "We've recorded your filing attempt. Please try again or contact support."
            }
        };
        Ok(TrackCompletionResponse {
            tracked: true,
            message: Some(message.to_string()),
            error: None,
        })
    }
}
