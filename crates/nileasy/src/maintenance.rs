// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline commands: `check-config`, `cleanup` and `cache`.

use std::io::IsTerminal;

use chrono::{DateTime, Duration, Utc};
use nileasy_config::NilEasyConfig;
use nileasy_core::user::CacheStats;
use nileasy_core::{NilEasyError, SessionStore, StorageAdapter};
use nileasy_gst::Gstin;
use nileasy_storage::SqliteStorage;
use serde::Serialize;

/// What one sweep changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub expired_users: u64,
    pub purged_entries: u64,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired_users == 0 && self.purged_entries == 0
    }
}

/// Soft-expires users idle for `inactive_user_days` and purges expired
/// captcha sessions and rate-limit windows.
pub async fn sweep<S>(
    storage: &S,
    now: DateTime<Utc>,
    inactive_user_days: u32,
) -> Result<SweepReport, NilEasyError>
where
    S: StorageAdapter + SessionStore + ?Sized,
{
    let cutoff = now - Duration::days(i64::from(inactive_user_days));
    let expired_users = storage.expire_inactive_users(cutoff, now).await?;
    let purged_entries = storage.purge_expired(now).await?;
    Ok(SweepReport {
        expired_users,
        purged_entries,
    })
}

async fn open_storage(config: &NilEasyConfig) -> Result<SqliteStorage, NilEasyError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

/// `nileasy check-config`
pub fn print_config_summary(config: &NilEasyConfig) {
    println!();
    println!("  nileasy configuration OK");
    println!("  {}", "-".repeat(35));
    println!("    Environment:   {}", config.app.environment);
    println!(
        "    Listen:        {}:{}",
        config.server.bind_address, config.server.port
    );
    println!("    Public URL:    {}", config.app.public_base_url);
    println!("    Database:      {}", config.storage.database_path);
    println!("    Channel:       {}", config.channel.provider);
    println!(
        "    Shortener:     {}",
        if config.shortlink.enabled {
            config.shortlink.api_url.as_str()
        } else {
            "disabled"
        }
    );
    println!("    SMS number:    {}", config.filing.sms_number);
    println!(
        "    API token:     {}",
        if config.server.api_token.is_some() {
            "set"
        } else {
            "not set (API open)"
        }
    );
    println!();
}

/// `nileasy cleanup`
pub async fn run_cleanup(config: &NilEasyConfig) -> Result<(), NilEasyError> {
    let storage = open_storage(config).await?;
    let report = sweep(&storage, Utc::now(), config.storage.inactive_user_days).await;
    storage.close().await?;
    let report = report?;
    println!(
        "expired {} inactive user(s), purged {} cache entr{}",
        report.expired_users,
        report.purged_entries,
        if report.purged_entries == 1 { "y" } else { "ies" }
    );
    Ok(())
}

/// `nileasy cache invalidate <GSTIN>`
pub async fn run_cache_invalidate(config: &NilEasyConfig, raw: &str) -> Result<(), NilEasyError> {
    let gstin = Gstin::parse(raw)?;
    let storage = open_storage(config).await?;
    let cleared = storage.invalidate_cached_profile(gstin.as_str()).await;
    storage.close().await?;
    match cleared? {
        0 => println!("no cached profile for {}", gstin.as_str()),
        n => println!("invalidated {n} cached profile(s) for {}", gstin.as_str()),
    }
    Ok(())
}

/// `nileasy cache stats`
pub async fn run_cache_stats(
    config: &NilEasyConfig,
    json: bool,
    plain: bool,
) -> Result<(), NilEasyError> {
    let storage = open_storage(config).await?;
    let stats = storage.profile_cache_stats(Utc::now()).await;
    storage.close().await?;
    let stats = stats?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print!("{}", render_stats(&stats, use_color));
    }
    Ok(())
}

fn render_stats(stats: &CacheStats, use_color: bool) -> String {
    let total = if use_color {
        use colored::Colorize;
        stats.total.to_string().green().bold().to_string()
    } else {
        stats.total.to_string()
    };
    format!(
        "\n  nileasy profile cache\n  {}\n    Cached profiles: {total}\n    Last 7 days:     {}\n    Last 30 days:    {}\n    Older:           {}\n\n",
        "-".repeat(35),
        stats.last_7_days,
        stats.last_30_days,
        stats.older,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use nileasy_core::user::{BusinessProfile, UserRecord};
    use nileasy_core::types::BusinessDetails;
    use nileasy_core::Clock;
    use nileasy_test_utils::{TEST_GSTIN, TEST_PHONE, TestHarness};

    fn details() -> BusinessDetails {
        BusinessDetails {
            business_name: "Uber India".into(),
            legal_name: "Uber India Private Limited".into(),
            address: "12 MG Road, Bengaluru".into(),
            registration_date: "01/07/2017".into(),
            status: "Active".into(),
        }
    }

    #[tokio::test]
    async fn sweep_expires_idle_users_and_purges_entries() {
        let h = TestHarness::builder().build().await.unwrap();
        let start = h.clock.now();

        let user = UserRecord::for_phone(TEST_PHONE, None, start);
        h.storage.create_user(&user).await.unwrap();
        h.storage
            .put("captcha:old", b"{}".to_vec(), start + Duration::minutes(15))
            .await
            .unwrap();

        let report = sweep(h.storage.as_ref(), start + Duration::days(1), 30)
            .await
            .unwrap();
        assert_eq!(report.expired_users, 0);
        assert_eq!(report.purged_entries, 1);

        let report = sweep(h.storage.as_ref(), start + Duration::days(31), 30)
            .await
            .unwrap();
        assert_eq!(report.expired_users, 1);
        let stored = h.storage.get_user(TEST_PHONE).await.unwrap().unwrap();
        assert!(stored.expired_at.is_some());

        let report = sweep(h.storage.as_ref(), start + Duration::days(32), 30)
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn stats_render_counts() {
        let h = TestHarness::builder().build().await.unwrap();
        let now = h.clock.now();
        let mut user = UserRecord::for_phone(TEST_PHONE, None, now);
        user.gstin = Some(TEST_GSTIN.into());
        user.profile = Some(BusinessProfile::from_details(details(), now));
        h.storage.create_user(&user).await.unwrap();

        let stats = h.storage.profile_cache_stats(now).await.unwrap();
        let text = render_stats(&stats, false);
        assert!(text.contains("Cached profiles: 1"));
        assert!(text.contains("Last 7 days:     1"));
    }
}
