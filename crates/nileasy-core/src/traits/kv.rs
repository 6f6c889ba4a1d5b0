// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-value store with explicit expiry, used for captcha sessions and
//! rate-limit windows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NilEasyError;

/// A key-value store whose entries carry an `expires_at` timestamp.
///
/// Expiry is checked on read against the caller-supplied `now`, so
/// behavior does not depend on the wall clock.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Inserts or replaces `key`.
    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NilEasyError>;

    /// Returns the value if present and `expires_at > now`.
    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>, NilEasyError>;

    /// Removes `key`. Returns whether it existed.
    async fn remove(&self, key: &str) -> Result<bool, NilEasyError>;

    /// Deletes all entries expired at `now`. Returns the number removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, NilEasyError>;
}
