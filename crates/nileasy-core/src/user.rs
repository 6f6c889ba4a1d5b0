// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The user aggregate: identity, cached business profile, conversation state
//! and append-only filing/link history.

use chrono::{DateTime, Utc};
use nileasy_gst::{Period, ReturnType};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::state::ConversationState;
use crate::types::BusinessDetails;

/// One user of the assistant.
///
/// Keyed by phone number, or transiently by GSTIN for stateless API callers
/// that have not shared a phone yet. `version` increases on every save and
/// guards against concurrent overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub gstin: Option<String>,
    pub profile: Option<BusinessProfile>,
    pub current_state: ConversationState,
    pub session_data: SessionData,
    pub last_updated_status: Option<FilingMilestone>,
    pub filings: Vec<FilingAttempt>,
    pub generated_links: Vec<GeneratedLink>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub expired_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn blank(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            phone: None,
            name: None,
            gstin: None,
            profile: None,
            current_state: ConversationState::Welcome,
            session_data: SessionData::default(),
            last_updated_status: None,
            filings: Vec::new(),
            generated_links: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
            last_active_at: now,
            expired_at: None,
        }
    }

    /// A new chat user keyed by phone.
    pub fn for_phone(phone: &str, name: Option<String>, now: DateTime<Utc>) -> Self {
        let mut user = Self::blank(phone.to_string(), now);
        user.phone = Some(phone.to_string());
        user.name = name;
        user
    }

    /// A new API-only record keyed by GSTIN.
    pub fn for_gstin(gstin: &str, now: DateTime<Utc>) -> Self {
        let mut user = Self::blank(gstin.to_string(), now);
        user.gstin = Some(gstin.to_string());
        user
    }

    /// Number of completed filings in the history.
    pub fn completed_filings(&self) -> usize {
        self.filings
            .iter()
            .filter(|f| f.status == FilingStatus::Completed)
            .count()
    }

    /// The filing attempt the conversation is currently working on.
    pub fn active_filing(&self) -> Option<&FilingAttempt> {
        let id = self.session_data.filing_id?;
        self.filings.iter().find(|f| f.id == id)
    }

    /// Replaces (or appends) a filing in the in-memory history.
    pub fn upsert_filing(&mut self, filing: FilingAttempt) {
        match self.filings.iter_mut().find(|f| f.id == filing.id) {
            Some(existing) => *existing = filing,
            None => self.filings.push(filing),
        }
    }
}

/// Verified business details cached on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub business_name: String,
    pub legal_name: String,
    pub address: String,
    pub registration_date: String,
    pub status: String,
    pub verified_at: DateTime<Utc>,
}

impl BusinessProfile {
    pub fn from_details(details: BusinessDetails, verified_at: DateTime<Utc>) -> Self {
        Self {
            business_name: details.business_name,
            legal_name: details.legal_name,
            address: details.address,
            registration_date: details.registration_date,
            status: details.status,
            verified_at,
        }
    }

    pub fn details(&self) -> BusinessDetails {
        BusinessDetails {
            business_name: self.business_name.clone(),
            legal_name: self.legal_name.clone(),
            address: self.address.clone(),
            registration_date: self.registration_date.clone(),
            status: self.status.clone(),
        }
    }
}

/// Transient per-conversation fields. Cleared on restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionData {
    /// Invalid inputs in the current state. Reset on every state change.
    pub retry_count: u32,
    /// GSTIN awaiting captcha verification.
    pub pending_gstin: Option<String>,
    pub captcha_session_id: Option<String>,
    pub return_type: Option<ReturnType>,
    pub period: Option<Period>,
    pub filing_id: Option<i64>,
    pub sms_text: Option<String>,
    pub sms_link: Option<String>,
    pub otp_stage: Option<OtpStage>,
    pub confirmation_link: Option<String>,
}

/// Sub-stages of `AWAITING_OTP`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OtpStage {
    /// Filing SMS link shown; waiting for the user to send it.
    SmsPending,
    /// User sent the SMS; waiting for the portal OTP.
    WaitingOtp,
    /// Confirmation SMS link shown; waiting for the user to send it.
    SendingConfirmation,
    /// Confirmation sent; waiting for the ARN SMS.
    WaitingArn,
}

/// Coarse progress label stored for reporting.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum FilingMilestone {
    #[strum(serialize = "Initiated")]
    Initiated,
    #[strum(serialize = "Verifying captcha")]
    VerifyingCaptcha,
    #[strum(serialize = "Onboarded")]
    Onboarded,
    #[strum(serialize = "SMS GENERATED")]
    SmsGenerated,
    #[strum(serialize = "FILING DONE")]
    FilingDone,
}

/// Lifecycle of a filing attempt. Only moves forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Initiated,
    SmsLinkGenerated,
    OtpReceived,
    Completed,
    Failed,
}

impl FilingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, FilingStatus::Completed | FilingStatus::Failed)
    }

    /// Whether moving from `self` to `next` respects the forward-only order.
    ///
    /// Re-applying the current status is allowed; terminal states accept nothing.
    pub fn can_advance_to(self, next: FilingStatus) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == FilingStatus::Failed || next > self
    }
}

/// One (gstin, return type, period) filing cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingAttempt {
    pub id: i64,
    pub user_id: String,
    pub gstin: String,
    pub return_type: ReturnType,
    pub period: Period,
    pub status: FilingStatus,
    pub arn: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Input for creating a filing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFiling {
    pub user_id: String,
    pub gstin: String,
    pub return_type: ReturnType,
    pub period: Period,
    pub created_at: DateTime<Utc>,
}

/// What a generated SMS link sends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// `NIL ...` filing SMS.
    Filing,
    /// `CNF ...` confirmation SMS.
    Confirmation,
}

/// A generated SMS deep link, kept for history and click tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedLink {
    pub id: i64,
    pub user_id: String,
    pub kind: LinkKind,
    pub gstin: String,
    pub return_type: ReturnType,
    pub period: Period,
    /// Shortened URL, or the raw `sms:` URI when shortening failed.
    pub short_url: String,
    pub short_code: Option<String>,
    pub sms_text: String,
    pub clicked: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a generated link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGeneratedLink {
    pub user_id: String,
    pub kind: LinkKind,
    pub gstin: String,
    pub return_type: ReturnType,
    pub period: Period,
    pub short_url: String,
    pub short_code: Option<String>,
    pub sms_text: String,
    pub created_at: DateTime<Utc>,
}

/// Age distribution of cached business profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: u64,
    pub last_7_days: u64,
    pub last_30_days: u64,
    pub older: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn new_users_start_in_welcome() {
        let now = Utc::now();
        let user = UserRecord::for_phone("+919876543210", Some("Asha".into()), now);
        assert_eq!(user.id, "+919876543210");
        assert_eq!(user.current_state, ConversationState::Welcome);
        assert_eq!(user.version, 0);
        assert!(user.gstin.is_none());

        let api = UserRecord::for_gstin("29AABCU9603R1ZX", now);
        assert_eq!(api.id, "29AABCU9603R1ZX");
        assert!(api.phone.is_none());
    }

    #[test]
    fn filing_status_moves_forward_only() {
        use FilingStatus::*;
        assert!(Initiated.can_advance_to(SmsLinkGenerated));
        assert!(Initiated.can_advance_to(Completed));
        assert!(OtpReceived.can_advance_to(Failed));
        assert!(SmsLinkGenerated.can_advance_to(SmsLinkGenerated));
        assert!(!OtpReceived.can_advance_to(Initiated));
        assert!(!Completed.can_advance_to(Failed));
        assert!(!Failed.can_advance_to(Completed));
    }

    #[test]
    fn milestone_labels() {
        assert_eq!(FilingMilestone::SmsGenerated.to_string(), "SMS GENERATED");
        assert_eq!(
            FilingMilestone::from_str("Verifying captcha").unwrap(),
            FilingMilestone::VerifyingCaptcha
        );
    }

    #[test]
    fn session_data_tolerates_missing_fields() {
        let data: SessionData = serde_json::from_str(r#"{"retry_count":2}"#).unwrap();
        assert_eq!(data.retry_count, 2);
        assert!(data.otp_stage.is_none());

        let data = SessionData {
            otp_stage: Some(OtpStage::WaitingArn),
            return_type: Some(ReturnType::Gstr3b),
            ..SessionData::default()
        };
        let json = serde_json::to_string(&data).unwrap();
        assert!(json.contains("\"waiting_arn\""));
        assert!(json.contains("\"gstr3b\""));
    }

    #[test]
    fn upsert_filing_replaces_by_id() {
        let now = Utc::now();
        let mut user = UserRecord::for_phone("+919876543210", None, now);
        let mut filing = FilingAttempt {
            id: 7,
            user_id: user.id.clone(),
            gstin: "29AABCU9603R1ZX".into(),
            return_type: ReturnType::Gstr3b,
            period: Period::from_code("022026").unwrap(),
            status: FilingStatus::Initiated,
            arn: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        user.upsert_filing(filing.clone());
        filing.status = FilingStatus::Completed;
        user.upsert_filing(filing);
        assert_eq!(user.filings.len(), 1);
        assert_eq!(user.completed_filings(), 1);

        user.session_data.filing_id = Some(7);
        assert_eq!(user.active_filing().map(|f| f.id), Some(7));
    }
}
