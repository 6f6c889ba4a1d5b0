// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value entries.

use chrono::{DateTime, Utc};
use nileasy_core::NilEasyError;
use rusqlite::{OptionalExtension, params};

use super::ts;
use crate::database::{Database, map_tr_err};

pub async fn put(
    db: &Database,
    key: &str,
    value: Vec<u8>,
    expires_at: DateTime<Utc>,
) -> Result<(), NilEasyError> {
    let key = key.to_string();
    let expires_at = ts(expires_at);
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO kv_entries (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
                params![key, value, expires_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Value for `key` unless it has expired at `now`.
pub async fn get(
    db: &Database,
    key: &str,
    now: DateTime<Utc>,
) -> Result<Option<Vec<u8>>, NilEasyError> {
    let key = key.to_string();
    let now = ts(now);
    db.connection()
        .call(move |conn| -> Result<Option<Vec<u8>>, rusqlite::Error> {
            conn.query_row(
                "SELECT value FROM kv_entries WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn remove(db: &Database, key: &str) -> Result<bool, NilEasyError> {
    let key = key.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}

pub async fn purge_expired(db: &Database, now: DateTime<Utc>) -> Result<u64, NilEasyError> {
    let now = ts(now);
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute("DELETE FROM kv_entries WHERE expires_at <= ?1", params![now])
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed as u64)
}
