// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage wrapper that loses every compare-and-swap.
//!
//! Before each `save_user` it writes the stored record once more, as if a
//! second turn for the same user had landed first. The wrapped save then
//! fails on the version check.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nileasy_core::types::{AdapterType, HealthStatus};
use nileasy_core::user::{
    BusinessProfile, CacheStats, FilingAttempt, FilingStatus, GeneratedLink, NewFiling,
    NewGeneratedLink, UserRecord,
};
use nileasy_core::{NilEasyError, PluginAdapter, StorageAdapter};
use nileasy_gst::{Period, ReturnType};
use nileasy_storage::SqliteStorage;

pub struct RacingStorage {
    inner: Arc<SqliteStorage>,
    races: AtomicUsize,
}

impl RacingStorage {
    pub fn new(inner: Arc<SqliteStorage>) -> Self {
        Self {
            inner,
            races: AtomicUsize::new(0),
        }
    }

    /// Concurrent writes injected so far.
    pub fn races(&self) -> usize {
        self.races.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for RacingStorage {
    fn name(&self) -> &str {
        "racing-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for RacingStorage {
    async fn initialize(&self) -> Result<(), NilEasyError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), NilEasyError> {
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, NilEasyError> {
        self.inner.get_user(id).await
    }

    async fn find_user_by_gstin(&self, gstin: &str) -> Result<Option<UserRecord>, NilEasyError> {
        self.inner.find_user_by_gstin(gstin).await
    }

    async fn create_user(&self, user: &UserRecord) -> Result<(), NilEasyError> {
        self.inner.create_user(user).await
    }

    async fn save_user(&self, user: &UserRecord) -> Result<i64, NilEasyError> {
        if let Some(stored) = self.inner.get_user(&user.id).await? {
            self.inner.save_user(&stored).await?;
            self.races.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.save_user(user).await
    }

    async fn expire_inactive_users(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, NilEasyError> {
        self.inner.expire_inactive_users(cutoff, now).await
    }

    async fn record_filing(&self, filing: &NewFiling) -> Result<FilingAttempt, NilEasyError> {
        self.inner.record_filing(filing).await
    }

    async fn update_filing_status(
        &self,
        id: i64,
        status: FilingStatus,
        arn: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FilingAttempt, NilEasyError> {
        self.inner.update_filing_status(id, status, arn, now).await
    }

    async fn find_completed_filing(
        &self,
        gstin: &str,
        return_type: ReturnType,
        period: Period,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<FilingAttempt>, NilEasyError> {
        self.inner
            .find_completed_filing(gstin, return_type, period, since)
            .await
    }

    async fn record_generated_link(
        &self,
        link: &NewGeneratedLink,
    ) -> Result<GeneratedLink, NilEasyError> {
        self.inner.record_generated_link(link).await
    }

    async fn mark_link_clicked(&self, short_code: &str) -> Result<bool, NilEasyError> {
        self.inner.mark_link_clicked(short_code).await
    }

    async fn find_cached_profile(
        &self,
        gstin: &str,
        not_before: DateTime<Utc>,
    ) -> Result<Option<BusinessProfile>, NilEasyError> {
        self.inner.find_cached_profile(gstin, not_before).await
    }

    async fn invalidate_cached_profile(&self, gstin: &str) -> Result<u64, NilEasyError> {
        self.inner.invalidate_cached_profile(gstin).await
    }

    async fn profile_cache_stats(&self, now: DateTime<Utc>) -> Result<CacheStats, NilEasyError> {
        self.inner.profile_cache_stats(now).await
    }
}
