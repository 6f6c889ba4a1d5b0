// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Services and settings shared by every handler.

use std::sync::Arc;

use chrono::Duration;
use nileasy_config::NilEasyConfig;
use nileasy_core::user::UserRecord;
use nileasy_core::{Clock, ConversationState, StorageAdapter};
use nileasy_portal::CaptchaService;
use nileasy_shortlink::SmsLinkService;

/// Knobs the conversation reads from configuration.
#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub cache_business_details: bool,
    pub cache_max_age: Duration,
    /// `None` checks for duplicates across all time.
    pub duplicate_window: Option<Duration>,
    pub period_options: usize,
    pub max_captcha_attempts: u32,
    /// Show raw error messages to users (development only).
    pub expose_error_details: bool,
}

impl FlowSettings {
    pub fn from_config(config: &NilEasyConfig) -> Self {
        Self {
            cache_business_details: config.filing.cache_business_details,
            cache_max_age: Duration::days(config.filing.cache_max_age_days),
            duplicate_window: config.filing.duplicate_window_hours.map(Duration::hours),
            period_options: config.filing.period_options,
            max_captcha_attempts: config.portal.max_captcha_attempts,
            expose_error_details: config.app.environment.exposes_error_details(),
        }
    }
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self::from_config(&NilEasyConfig::default())
    }
}

/// Everything a handler may touch besides the user record.
pub struct FlowContext {
    pub storage: Arc<dyn StorageAdapter>,
    pub captcha: Arc<CaptchaService>,
    pub sms_links: SmsLinkService,
    pub clock: Arc<dyn Clock>,
    pub settings: FlowSettings,
}

impl FlowContext {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        captcha: Arc<CaptchaService>,
        sms_links: SmsLinkService,
        clock: Arc<dyn Clock>,
        settings: FlowSettings,
    ) -> Self {
        Self {
            storage,
            captcha,
            sms_links,
            clock,
            settings,
        }
    }

    /// Invalid inputs tolerated in `state` before falling back.
    pub fn max_retries(&self, state: ConversationState) -> u32 {
        match state {
            ConversationState::AwaitingCaptcha => self.settings.max_captcha_attempts,
            other => other.metadata().max_retries,
        }
    }

    /// Attempts left after the current (failed) one.
    pub fn attempts_left(&self, user: &UserRecord) -> u32 {
        self.max_retries(user.current_state)
            .saturating_sub(user.session_data.retry_count + 1)
    }
}
