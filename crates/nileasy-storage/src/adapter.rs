// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the storage and session-store traits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use nileasy_config::model::StorageConfig;
use nileasy_core::user::{
    BusinessProfile, CacheStats, FilingAttempt, FilingStatus, GeneratedLink, NewFiling,
    NewGeneratedLink, UserRecord,
};
use nileasy_core::{
    AdapterType, HealthStatus, NilEasyError, PluginAdapter, SessionStore, StorageAdapter,
};
use nileasy_gst::{Period, ReturnType};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on [`StorageAdapter::initialize`]; every other
/// call fails until then.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    fn db(&self) -> Result<&Database, NilEasyError> {
        self.db.get().ok_or_else(|| NilEasyError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        let ping = db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await;
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), NilEasyError> {
        let db =
            Database::open_with_options(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| NilEasyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), NilEasyError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Users ---

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, NilEasyError> {
        let db = self.db()?;
        let Some(mut user) = queries::users::get_user(db, id).await? else {
            return Ok(None);
        };
        user.filings = queries::filings::list_for_user(db, id).await?;
        user.generated_links = queries::links::list_for_user(db, id).await?;
        Ok(Some(user))
    }

    async fn find_user_by_gstin(&self, gstin: &str) -> Result<Option<UserRecord>, NilEasyError> {
        match queries::users::find_user_id_by_gstin(self.db()?, gstin).await? {
            Some(id) => self.get_user(&id).await,
            None => Ok(None),
        }
    }

    async fn create_user(&self, user: &UserRecord) -> Result<(), NilEasyError> {
        queries::users::create_user(self.db()?, user).await
    }

    async fn save_user(&self, user: &UserRecord) -> Result<i64, NilEasyError> {
        queries::users::save_user(self.db()?, user).await
    }

    async fn expire_inactive_users(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, NilEasyError> {
        queries::users::expire_inactive(self.db()?, cutoff, now).await
    }

    // --- Filing attempts ---

    async fn record_filing(&self, filing: &NewFiling) -> Result<FilingAttempt, NilEasyError> {
        queries::filings::record_filing(self.db()?, filing).await
    }

    async fn update_filing_status(
        &self,
        id: i64,
        status: FilingStatus,
        arn: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FilingAttempt, NilEasyError> {
        queries::filings::update_status(self.db()?, id, status, arn, now).await
    }

    async fn find_completed_filing(
        &self,
        gstin: &str,
        return_type: ReturnType,
        period: Period,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<FilingAttempt>, NilEasyError> {
        queries::filings::find_completed(self.db()?, gstin, return_type, period, since).await
    }

    // --- Generated links ---

    async fn record_generated_link(
        &self,
        link: &NewGeneratedLink,
    ) -> Result<GeneratedLink, NilEasyError> {
        queries::links::record(self.db()?, link).await
    }

    async fn mark_link_clicked(&self, short_code: &str) -> Result<bool, NilEasyError> {
        queries::links::mark_clicked(self.db()?, short_code).await
    }

    // --- Business profile cache ---

    async fn find_cached_profile(
        &self,
        gstin: &str,
        not_before: DateTime<Utc>,
    ) -> Result<Option<BusinessProfile>, NilEasyError> {
        queries::users::find_cached_profile(self.db()?, gstin, not_before).await
    }

    async fn invalidate_cached_profile(&self, gstin: &str) -> Result<u64, NilEasyError> {
        queries::users::invalidate_cached_profile(self.db()?, gstin).await
    }

    async fn profile_cache_stats(&self, now: DateTime<Utc>) -> Result<CacheStats, NilEasyError> {
        queries::users::profile_cache_stats(self.db()?, now).await
    }
}

#[async_trait]
impl SessionStore for SqliteStorage {
    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NilEasyError> {
        queries::kv::put(self.db()?, key, value, expires_at).await
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>, NilEasyError> {
        queries::kv::get(self.db()?, key, now).await
    }

    async fn remove(&self, key: &str) -> Result<bool, NilEasyError> {
        queries::kv::remove(self.db()?, key).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, NilEasyError> {
        queries::kv::purge_expired(self.db()?, now).await
    }
}
