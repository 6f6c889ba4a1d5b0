// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the NilEasy configuration system.

use figment::Jail;
use nileasy_config::diagnostic::ConfigError;
use nileasy_config::{
    ChannelProvider, Environment, load_and_validate_str, load_config, load_config_from_str,
};
use serial_test::serial;

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[app]
environment = "production"
log_level = "debug"
public_base_url = "https://nileasy.example.in"

[server]
bind_address = "0.0.0.0"
port = 9000
api_token = "flow-token"

[storage]
database_path = "/tmp/nileasy-test.db"
inactive_user_days = 30

[portal]
timeout_secs = 5

[shortlink]
enabled = false

[filing]
sms_number = "14409"
duplicate_window_hours = 48
period_options = 6

[channel]
provider = "twilio"
twilio_account_sid = "AC123"
twilio_auth_token = "secret"
twilio_whatsapp_number = "+14155238886"

[limits]
gstin_lookups_per_hour = 10
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.app.environment, Environment::Production);
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.api_token.as_deref(), Some("flow-token"));
    assert_eq!(config.storage.inactive_user_days, 30);
    assert_eq!(config.portal.timeout_secs, 5);
    assert!(!config.shortlink.enabled);
    assert_eq!(config.filing.duplicate_window_hours, Some(48));
    assert_eq!(config.filing.period_options, 6);
    assert_eq!(config.channel.provider, ChannelProvider::Twilio);
    assert_eq!(config.limits.gstin_lookups_per_hour, 10);
    // Untouched keys keep their defaults.
    assert_eq!(config.portal.captcha_ttl_minutes, 15);
}

#[test]
fn unknown_key_gets_suggestion_and_span() {
    let toml = "[filing]\nsms_numbr = \"14409\"\n";
    let errors = load_and_validate_str(toml).unwrap_err();
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key,
                suggestion,
                span,
                ..
            } => Some((key.clone(), suggestion.clone(), *span)),
            _ => None,
        })
        .expect("unknown key error");
    assert_eq!(unknown.0, "sms_numbr");
    assert_eq!(unknown.1.as_deref(), Some("sms_number"));
    let span = unknown.2.expect("span into inline source");
    assert_eq!(&toml[span.offset()..span.offset() + span.len()], "sms_numbr");
}

#[test]
fn wrong_type_is_reported() {
    let errors = load_and_validate_str("[server]\nport = \"eighty\"\n").unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("port")))
    );
}

#[test]
fn validation_errors_surface_through_loader() {
    let errors = load_and_validate_str("[channel]\nprovider = \"cloud_api\"\n").unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn empty_string_gives_defaults() {
    let config = load_config_from_str("").expect("defaults");
    assert_eq!(config.server.port, 8000);
    assert_eq!(config.filing.sms_number, "14409");
}

#[test]
#[serial]
fn env_vars_override_files() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "nileasy.toml",
            "[server]\nport = 9100\n\n[app]\nlog_level = \"warn\"\n",
        )?;
        jail.set_env("NILEASY_APP_LOG_LEVEL", "debug");
        jail.set_env("NILEASY_CHANNEL_TWILIO_ACCOUNT_SID", "AC999");

        let config = load_config()?;
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.app.log_level, "debug");
        assert_eq!(config.channel.twilio_account_sid.as_deref(), Some("AC999"));
        Ok(())
    });
}

#[test]
#[serial]
fn local_file_is_picked_up() {
    Jail::expect_with(|jail| {
        jail.create_file("nileasy.toml", "[app]\nlog_level = \"warn\"\n")?;
        let config = load_config()?;
        assert_eq!(config.app.log_level, "warn");
        Ok(())
    });
}
