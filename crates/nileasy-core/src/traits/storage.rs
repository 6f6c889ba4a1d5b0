// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the user aggregate and its history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nileasy_gst::{Period, ReturnType};

use crate::error::NilEasyError;
use crate::traits::adapter::PluginAdapter;
use crate::user::{
    BusinessProfile, CacheStats, FilingAttempt, FilingStatus, GeneratedLink, NewFiling,
    NewGeneratedLink, UserRecord,
};

/// Persistence for user records, filing attempts and generated links.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), NilEasyError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), NilEasyError>;

    // --- Users ---

    /// Loads a user with its filing and link history.
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, NilEasyError>;

    /// Most recently active user bound to `gstin`.
    async fn find_user_by_gstin(&self, gstin: &str) -> Result<Option<UserRecord>, NilEasyError>;

    /// Inserts a new user. Fails with `Conflict` if the id exists.
    async fn create_user(&self, user: &UserRecord) -> Result<(), NilEasyError>;

    /// Compare-and-swap save keyed on `user.version`.
    ///
    /// Returns the new version, or `Conflict` if the stored version moved on.
    /// History lists are not written here.
    async fn save_user(&self, user: &UserRecord) -> Result<i64, NilEasyError>;

    /// Stamps `expired_at = now` on users inactive since before `cutoff`.
    /// Already-expired users are left alone.
    async fn expire_inactive_users(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, NilEasyError>;

    // --- Filing attempts ---

    /// Creates a filing attempt, or returns the open attempt for the same
    /// (gstin, return type, period) if one exists. An open attempt held by
    /// another user record moves to `filing.user_id`.
    async fn record_filing(&self, filing: &NewFiling) -> Result<FilingAttempt, NilEasyError>;

    /// Advances a filing's status. Backwards moves are rejected.
    async fn update_filing_status(
        &self,
        id: i64,
        status: FilingStatus,
        arn: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<FilingAttempt, NilEasyError>;

    /// Latest completed filing for the triple, optionally completed at or after `since`.
    async fn find_completed_filing(
        &self,
        gstin: &str,
        return_type: ReturnType,
        period: Period,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<FilingAttempt>, NilEasyError>;

    // --- Generated links ---

    async fn record_generated_link(
        &self,
        link: &NewGeneratedLink,
    ) -> Result<GeneratedLink, NilEasyError>;

    /// Flags the link with `short_code` as clicked. Returns whether one matched.
    async fn mark_link_clicked(&self, short_code: &str) -> Result<bool, NilEasyError>;

    // --- Business profile cache ---

    /// Freshest cached profile for `gstin` verified at or after `not_before`.
    async fn find_cached_profile(
        &self,
        gstin: &str,
        not_before: DateTime<Utc>,
    ) -> Result<Option<BusinessProfile>, NilEasyError>;

    /// Drops cached profiles for `gstin`. Returns the number of users touched.
    async fn invalidate_cached_profile(&self, gstin: &str) -> Result<u64, NilEasyError>;

    /// Ages of cached profiles. `last_30_days` includes the last seven days.
    async fn profile_cache_stats(&self, now: DateTime<Utc>) -> Result<CacheStats, NilEasyError>;
}
