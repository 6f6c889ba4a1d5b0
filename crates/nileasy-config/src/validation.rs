// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Every rule runs; all failures are returned together.

use crate::diagnostic::ConfigError;
use crate::model::{ChannelProvider, NilEasyConfig};

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &NilEasyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    check_server(config, &mut errors);
    check_storage(config, &mut errors);
    check_urls(config, &mut errors);
    check_filing(config, &mut errors);
    check_channel(config, &mut errors);

    if config.portal.max_captcha_attempts == 0 {
        errors.push(ConfigError::invalid(
            "portal.max_captcha_attempts must be at least 1",
        ));
    }
    if config.portal.captcha_ttl_minutes <= 0 {
        errors.push(ConfigError::invalid(format!(
            "portal.captcha_ttl_minutes must be positive, got {}",
            config.portal.captcha_ttl_minutes
        )));
    }
    if config.limits.gstin_lookups_per_hour == 0 {
        errors.push(ConfigError::invalid(
            "limits.gstin_lookups_per_hour must be at least 1",
        ));
    }
    if !matches!(
        config.app.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::invalid(format!(
            "app.log_level `{}` is not one of trace, debug, info, warn, error",
            config.app.log_level
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_server(config: &NilEasyConfig, errors: &mut Vec<ConfigError>) {
    let addr = config.server.bind_address.trim();
    if addr.is_empty() {
        errors.push(ConfigError::invalid("server.bind_address must not be empty"));
    } else {
        let is_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-');
        if !is_ip && !is_hostname {
            errors.push(ConfigError::invalid(format!(
                "server.bind_address `{addr}` is not a valid IP address or hostname"
            )));
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::invalid("server.port must not be 0"));
    }

    if let Some(token) = &config.server.api_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::invalid(
            "server.api_token must not be blank; omit it to disable auth",
        ));
    }
}

fn check_storage(config: &NilEasyConfig, errors: &mut Vec<ConfigError>) {
    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::invalid("storage.database_path must not be empty"));
    }
    if config.storage.inactive_user_days == 0 {
        errors.push(ConfigError::invalid(
            "storage.inactive_user_days must be at least 1",
        ));
    }
}

fn check_urls(config: &NilEasyConfig, errors: &mut Vec<ConfigError>) {
    let urls = [
        ("app.public_base_url", &config.app.public_base_url),
        ("portal.base_url", &config.portal.base_url),
        ("shortlink.api_url", &config.shortlink.api_url),
        ("channel.twilio_api_base", &config.channel.twilio_api_base),
        ("channel.cloud_api_base", &config.channel.cloud_api_base),
    ];
    for (key, url) in urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errors.push(ConfigError::invalid(format!(
                "{key} `{url}` must start with http:// or https://"
            )));
        }
    }
}

fn check_filing(config: &NilEasyConfig, errors: &mut Vec<ConfigError>) {
    let number = &config.filing.sms_number;
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::invalid(format!(
            "filing.sms_number `{number}` must contain digits only"
        )));
    }
    if config.filing.cache_max_age_days <= 0 {
        errors.push(ConfigError::invalid(format!(
            "filing.cache_max_age_days must be positive, got {}",
            config.filing.cache_max_age_days
        )));
    }
    if let Some(hours) = config.filing.duplicate_window_hours
        && hours <= 0
    {
        errors.push(ConfigError::invalid(format!(
            "filing.duplicate_window_hours must be positive, got {hours}"
        )));
    }
    if !(1..=12).contains(&config.filing.period_options) {
        errors.push(ConfigError::invalid(format!(
            "filing.period_options must be between 1 and 12, got {}",
            config.filing.period_options
        )));
    }
}

fn check_channel(config: &NilEasyConfig, errors: &mut Vec<ConfigError>) {
    let channel = &config.channel;
    let required: &[(&str, &Option<String>)] = match channel.provider {
        ChannelProvider::Log => &[],
        ChannelProvider::Twilio => &[
            ("channel.twilio_account_sid", &channel.twilio_account_sid),
            ("channel.twilio_auth_token", &channel.twilio_auth_token),
            ("channel.twilio_whatsapp_number", &channel.twilio_whatsapp_number),
        ],
        ChannelProvider::CloudApi => &[
            ("channel.cloud_access_token", &channel.cloud_access_token),
            ("channel.cloud_phone_number_id", &channel.cloud_phone_number_id),
        ],
    };
    for (key, value) in required {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            errors.push(ConfigError::invalid(format!(
                "{key} is required when channel.provider = \"{}\"",
                channel.provider
            )));
        }
    }

    if channel.validate_twilio_signature && channel.twilio_auth_token.is_none() {
        errors.push(ConfigError::invalid(
            "channel.validate_twilio_signature needs channel.twilio_auth_token",
        ));
    }
}
