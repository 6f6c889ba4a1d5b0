// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./nileasy.toml` > `~/.config/nileasy/nileasy.toml` > `/etc/nileasy/nileasy.toml`
//! with environment variable overrides via `NILEASY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use tracing::debug;

use crate::model::NilEasyConfig;

const SYSTEM_CONFIG_PATH: &str = "/etc/nileasy/nileasy.toml";

/// Top-level config sections, used to map `NILEASY_<SECTION>_<KEY>` env vars.
const SECTIONS: &[&str] = &[
    "app",
    "server",
    "storage",
    "portal",
    "shortlink",
    "filing",
    "channel",
    "limits",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/nileasy/nileasy.toml` (system-wide)
/// 3. `~/.config/nileasy/nileasy.toml` (user XDG config)
/// 4. `./nileasy.toml` (local directory)
/// 5. `NILEASY_*` environment variables
pub fn load_config() -> Result<NilEasyConfig, figment::Error> {
    let files: Vec<String> = config_file_candidates()
        .into_iter()
        .filter(|path| path.is_file())
        .map(|path| path.display().to_string())
        .collect();
    let env_keys = std::env::vars()
        .filter(|(key, _)| key.starts_with("NILEASY_"))
        .count();
    debug!(?files, env_keys, "loading configuration");
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<NilEasyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(NilEasyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<NilEasyConfig, figment::Error> {
    debug!(path = %path.display(), "loading configuration");
    Figment::new()
        .merge(Serialized::defaults(NilEasyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    config_file_candidates()
        .into_iter()
        .fold(
            Figment::new().merge(Serialized::defaults(NilEasyConfig::default())),
            |figment, path| figment.merge(Toml::file(path)),
        )
        .merge(env_provider())
}

/// Config files in merge order, whether or not they exist.
pub(crate) fn config_file_candidates() -> Vec<PathBuf> {
    [
        Some(PathBuf::from(SYSTEM_CONFIG_PATH)),
        user_config_path(),
        Some(PathBuf::from("nileasy.toml")),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// `~/.config/nileasy/nileasy.toml`, when a config dir is known.
pub(crate) fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("nileasy").join("nileasy.toml"))
}

/// Environment provider mapping `NILEASY_FILING_SMS_NUMBER` to `filing.sms_number`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores survive intact.
fn env_provider() -> Env {
    Env::prefixed("NILEASY_").map(|key| env_key_to_path(key.as_str()).into())
}

fn env_key_to_path(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    for section in SECTIONS {
        if let Some(rest) = lower.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    lower
}
