// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived captcha sessions.
//!
//! A session pairs the portal cookies with the captcha image that was issued
//! under them. Sessions live in a [`SessionStore`] with an explicit expiry
//! and are consumed by the first verification attempt, successful or not.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use nileasy_core::types::BusinessDetails;
use nileasy_core::{
    Clock, ExternalErrorKind, ExternalService, NilEasyError, SessionStore, TaxPortalAdapter,
};
use nileasy_gst::Gstin;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const KEY_PREFIX: &str = "captcha:";

/// What a caller needs to show a captcha to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptchaTicket {
    pub session_id: String,
    /// Public URL serving the image through the captcha proxy.
    pub image_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Stored form of a captcha session.
#[derive(Serialize, Deserialize)]
struct CaptchaSession {
    user_key: String,
    cookies: String,
    image_b64: String,
    content_type: String,
}

/// Issues and redeems captcha sessions against the tax portal.
pub struct CaptchaService {
    portal: Arc<dyn TaxPortalAdapter>,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    public_base_url: String,
}

impl CaptchaService {
    pub fn new(
        portal: Arc<dyn TaxPortalAdapter>,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        ttl_minutes: i64,
        public_base_url: &str,
    ) -> Self {
        Self {
            portal,
            store,
            clock,
            ttl: Duration::minutes(ttl_minutes),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn key(session_id: &str) -> String {
        format!("{KEY_PREFIX}{session_id}")
    }

    /// Public URL of the image for `session_id`.
    pub fn image_url(&self, session_id: &str) -> String {
        format!("{}/api/v1/captcha/{session_id}", self.public_base_url)
    }

    /// Fetch a fresh captcha for `user_key` (a phone number or GSTIN) and
    /// open a session for it.
    pub async fn get_captcha(&self, user_key: &str) -> Result<CaptchaTicket, NilEasyError> {
        let challenge = self.portal.fetch_captcha().await?;
        let session_id = uuid::Uuid::new_v4().simple().to_string();
        let expires_at = self.clock.now() + self.ttl;

        let session = CaptchaSession {
            user_key: user_key.to_string(),
            cookies: challenge.cookies,
            image_b64: STANDARD.encode(&challenge.image),
            content_type: challenge.content_type,
        };
        self.store
            .put(&Self::key(&session_id), serde_json::to_vec(&session)?, expires_at)
            .await?;

        debug!(session_id = %session_id, "captcha session opened");
        Ok(CaptchaTicket {
            image_url: self.image_url(&session_id),
            session_id,
            expires_at,
        })
    }

    async fn load(&self, session_id: &str) -> Result<Option<CaptchaSession>, NilEasyError> {
        let now = self.clock.now();
        match self.store.get(&Self::key(session_id), now).await? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    /// Verify `gstin` with the user's captcha answer.
    ///
    /// The session is removed before the portal is called, so every attempt
    /// needs a fresh captcha. A missing, expired or foreign session reports
    /// `SessionExpired`.
    pub async fn verify_gstin(
        &self,
        user_key: &str,
        gstin: &Gstin,
        captcha: &str,
        session_id: &str,
    ) -> Result<BusinessDetails, NilEasyError> {
        let captcha = captcha.trim();
        if captcha.is_empty() {
            return Err(NilEasyError::validation("captcha answer is empty"));
        }

        let session = self
            .load(session_id)
            .await?
            .filter(|s| s.user_key == user_key)
            .ok_or_else(|| {
                NilEasyError::external(
                    ExternalService::TaxPortal,
                    ExternalErrorKind::SessionExpired,
                    "captcha session expired or unknown",
                )
            })?;
        self.store.remove(&Self::key(session_id)).await?;

        let details = self
            .portal
            .search_taxpayer(&session.cookies, gstin.as_str(), captcha)
            .await?;
        info!(gstin = %gstin.masked(), "GSTIN verified");
        Ok(details)
    }

    /// Image bytes and content type for a live session.
    pub async fn captcha_image(
        &self,
        session_id: &str,
    ) -> Result<Option<(Vec<u8>, String)>, NilEasyError> {
        let Some(session) = self.load(session_id).await? else {
            return Ok(None);
        };
        let image = STANDARD
            .decode(session.image_b64.as_bytes())
            .map_err(|e| NilEasyError::Internal(format!("corrupt captcha image: {e}")))?;
        Ok(Some((image, session.content_type)))
    }
}
