// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for NilEasy.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level NilEasy configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section defaults to values suitable for local
/// development.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NilEasyConfig {
    /// Application identity and environment.
    #[serde(default)]
    pub app: AppConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// GST portal client settings.
    #[serde(default)]
    pub portal: PortalConfig,

    /// SMS short-link service settings.
    #[serde(default)]
    pub shortlink: ShortlinkConfig,

    /// Filing behavior.
    #[serde(default)]
    pub filing: FilingConfig,

    /// Outbound WhatsApp channel.
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Abuse limits.
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// Deployment environment. Controls how much error detail users see.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Whether raw internal error messages may be shown to users.
    pub fn exposes_error_details(self) -> bool {
        self != Environment::Production
    }
}

/// Application identity and environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in messages and logs.
    #[serde(default = "default_app_name")]
    pub name: String,

    #[serde(default)]
    pub environment: Environment,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Public base URL of this service, used for captcha images and OTP pages.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: Environment::default(),
            log_level: default_log_level(),
            public_base_url: default_public_base_url(),
        }
    }
}

fn default_app_name() -> String {
    "NilEasy".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}

/// HTTP server configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on the `/api/v1` flow-builder endpoints.
    /// `None` leaves them open.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            api_token: None,
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("api_token", &self.api_token.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Days without activity after which a user is soft-expired.
    #[serde(default = "default_inactive_user_days")]
    pub inactive_user_days: u32,

    /// Minutes between background cleanup sweeps while serving. 0 disables.
    #[serde(default = "default_sweep_interval_minutes")]
    pub sweep_interval_minutes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
            inactive_user_days: default_inactive_user_days(),
            sweep_interval_minutes: default_sweep_interval_minutes(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|d| d.join("nileasy").join("nileasy.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("nileasy.db"))
        .to_string_lossy()
        .to_string()
}

fn default_true() -> bool {
    true
}

fn default_inactive_user_days() -> u32 {
    90
}

fn default_sweep_interval_minutes() -> u64 {
    60
}

/// GST portal client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PortalConfig {
    /// Portal base URL.
    #[serde(default = "default_portal_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_portal_timeout_secs")]
    pub timeout_secs: u64,

    /// How long a fetched captcha stays valid.
    #[serde(default = "default_captcha_ttl_minutes")]
    pub captcha_ttl_minutes: i64,

    /// Wrong captcha answers tolerated per GSTIN before re-entry is forced.
    #[serde(default = "default_max_captcha_attempts")]
    pub max_captcha_attempts: u32,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_portal_base_url(),
            timeout_secs: default_portal_timeout_secs(),
            captcha_ttl_minutes: default_captcha_ttl_minutes(),
            max_captcha_attempts: default_max_captcha_attempts(),
        }
    }
}

fn default_portal_base_url() -> String {
    "https://services.gst.gov.in".to_string()
}

fn default_portal_timeout_secs() -> u64 {
    20
}

fn default_captcha_ttl_minutes() -> i64 {
    15
}

fn default_max_captcha_attempts() -> u32 {
    3
}

/// SMS short-link service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShortlinkConfig {
    /// When disabled, raw `sms:` links are sent.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_shortlink_api_url")]
    pub api_url: String,

    #[serde(default = "default_shortlink_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ShortlinkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_shortlink_api_url(),
            timeout_secs: default_shortlink_timeout_secs(),
        }
    }
}

fn default_shortlink_api_url() -> String {
    "https://sm-snacc.vercel.app".to_string()
}

fn default_shortlink_timeout_secs() -> u64 {
    10
}

/// Filing behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilingConfig {
    /// Government short code that receives filing SMS.
    #[serde(default = "default_sms_number")]
    pub sms_number: String,

    /// Reuse verified business details to skip the captcha on later visits.
    #[serde(default = "default_true")]
    pub cache_business_details: bool,

    /// Maximum age of a cached business profile.
    #[serde(default = "default_cache_max_age_days")]
    pub cache_max_age_days: i64,

    /// Window for the duplicate-filing warning. `None` checks all history.
    #[serde(default = "default_duplicate_window_hours")]
    pub duplicate_window_hours: Option<i64>,

    /// Number of recent periods offered in the period menu.
    #[serde(default = "default_period_options")]
    pub period_options: usize,
}

impl Default for FilingConfig {
    fn default() -> Self {
        Self {
            sms_number: default_sms_number(),
            cache_business_details: true,
            cache_max_age_days: default_cache_max_age_days(),
            duplicate_window_hours: default_duplicate_window_hours(),
            period_options: default_period_options(),
        }
    }
}

fn default_sms_number() -> String {
    "14409".to_string()
}

fn default_cache_max_age_days() -> i64 {
    30
}

fn default_duplicate_window_hours() -> Option<i64> {
    Some(24)
}

fn default_period_options() -> usize {
    4
}

/// Which gateway delivers outbound messages.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChannelProvider {
    /// Log replies instead of sending them.
    #[default]
    Log,
    /// Twilio WhatsApp API.
    Twilio,
    /// Meta WhatsApp Cloud API.
    CloudApi,
}

/// Outbound WhatsApp channel configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChannelConfig {
    #[serde(default)]
    pub provider: ChannelProvider,

    #[serde(default)]
    pub twilio_account_sid: Option<String>,

    #[serde(default)]
    pub twilio_auth_token: Option<String>,

    /// Sender number, E.164 (without the `whatsapp:` prefix).
    #[serde(default)]
    pub twilio_whatsapp_number: Option<String>,

    #[serde(default = "default_twilio_api_base")]
    pub twilio_api_base: String,

    /// Reject webhooks without a valid `X-Twilio-Signature`.
    #[serde(default)]
    pub validate_twilio_signature: bool,

    #[serde(default)]
    pub cloud_access_token: Option<String>,

    #[serde(default)]
    pub cloud_phone_number_id: Option<String>,

    #[serde(default = "default_cloud_api_base")]
    pub cloud_api_base: String,

    #[serde(default = "default_channel_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            provider: ChannelProvider::default(),
            twilio_account_sid: None,
            twilio_auth_token: None,
            twilio_whatsapp_number: None,
            twilio_api_base: default_twilio_api_base(),
            validate_twilio_signature: false,
            cloud_access_token: None,
            cloud_phone_number_id: None,
            cloud_api_base: default_cloud_api_base(),
            timeout_secs: default_channel_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ChannelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelConfig")
            .field("provider", &self.provider)
            .field("twilio_account_sid", &self.twilio_account_sid)
            .field(
                "twilio_auth_token",
                &self.twilio_auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field("twilio_whatsapp_number", &self.twilio_whatsapp_number)
            .field("twilio_api_base", &self.twilio_api_base)
            .field("validate_twilio_signature", &self.validate_twilio_signature)
            .field(
                "cloud_access_token",
                &self.cloud_access_token.as_ref().map(|_| "[redacted]"),
            )
            .field("cloud_phone_number_id", &self.cloud_phone_number_id)
            .field("cloud_api_base", &self.cloud_api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_twilio_api_base() -> String {
    "https://api.twilio.com".to_string()
}

fn default_cloud_api_base() -> String {
    "https://graph.facebook.com/v19.0".to_string()
}

fn default_channel_timeout_secs() -> u64 {
    15
}

/// Abuse limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Stateless `validate-gstin` calls allowed per GSTIN per hour.
    #[serde(default = "default_gstin_lookups_per_hour")]
    pub gstin_lookups_per_hour: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            gstin_lookups_per_hour: default_gstin_lookups_per_hour(),
        }
    }
}

fn default_gstin_lookups_per_hour() -> u32 {
    3
}
