// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User record CRUD, compare-and-swap saves and the business-profile cache.

use chrono::{DateTime, Duration, Utc};
use nileasy_core::NilEasyError;
use nileasy_core::user::{BusinessProfile, CacheStats, SessionData, UserRecord};
use rusqlite::{OptionalExtension, Row, params};

use super::{conversion_err, is_constraint_violation, parse_col, parse_ts, parse_ts_opt, ts, ts_opt};
use crate::database::{Database, map_tr_err};

const USER_COLUMNS: &str = "id, phone, name, gstin, business_name, legal_name, address, \
     registration_date, business_status, profile_verified_at, current_state, session_data, \
     last_updated_status, version, created_at, updated_at, last_active_at, expired_at";

/// Profile columns in row order, starting at `offset`.
fn profile_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Option<BusinessProfile>> {
    let business_name: Option<String> = row.get(offset)?;
    let verified_at: Option<String> = row.get(offset + 5)?;
    let (Some(business_name), Some(verified_at)) = (business_name, verified_at) else {
        return Ok(None);
    };
    Ok(Some(BusinessProfile {
        business_name,
        legal_name: row.get::<_, Option<String>>(offset + 1)?.unwrap_or_default(),
        address: row.get::<_, Option<String>>(offset + 2)?.unwrap_or_default(),
        registration_date: row.get::<_, Option<String>>(offset + 3)?.unwrap_or_default(),
        status: row.get::<_, Option<String>>(offset + 4)?.unwrap_or_default(),
        verified_at: parse_ts(offset + 5, &verified_at)?,
    }))
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let session_raw: String = row.get(11)?;
    let session_data: SessionData =
        serde_json::from_str(&session_raw).map_err(|e| conversion_err(11, e))?;
    let milestone: Option<String> = row.get(12)?;

    Ok(UserRecord {
        id: row.get(0)?,
        phone: row.get(1)?,
        name: row.get(2)?,
        gstin: row.get(3)?,
        profile: profile_from_row(row, 4)?,
        current_state: parse_col(10, &row.get::<_, String>(10)?)?,
        session_data,
        last_updated_status: milestone.map(|m| parse_col(12, &m)).transpose()?,
        filings: Vec::new(),
        generated_links: Vec::new(),
        version: row.get(13)?,
        created_at: parse_ts(14, &row.get::<_, String>(14)?)?,
        updated_at: parse_ts(15, &row.get::<_, String>(15)?)?,
        last_active_at: parse_ts(16, &row.get::<_, String>(16)?)?,
        expired_at: parse_ts_opt(17, row.get(17)?)?,
    })
}

/// Owned column values for an insert or update, built outside the DB thread.
struct UserParams {
    id: String,
    phone: Option<String>,
    name: Option<String>,
    gstin: Option<String>,
    business_name: Option<String>,
    legal_name: Option<String>,
    address: Option<String>,
    registration_date: Option<String>,
    business_status: Option<String>,
    profile_verified_at: Option<String>,
    current_state: String,
    session_data: String,
    last_updated_status: Option<String>,
    version: i64,
    created_at: String,
    updated_at: String,
    last_active_at: String,
    expired_at: Option<String>,
}

impl UserParams {
    fn from_user(user: &UserRecord) -> Result<Self, NilEasyError> {
        let profile = user.profile.as_ref();
        Ok(Self {
            id: user.id.clone(),
            phone: user.phone.clone(),
            name: user.name.clone(),
            gstin: user.gstin.clone(),
            business_name: profile.map(|p| p.business_name.clone()),
            legal_name: profile.map(|p| p.legal_name.clone()),
            address: profile.map(|p| p.address.clone()),
            registration_date: profile.map(|p| p.registration_date.clone()),
            business_status: profile.map(|p| p.status.clone()),
            profile_verified_at: profile.map(|p| ts(p.verified_at)),
            current_state: user.current_state.to_string(),
            session_data: serde_json::to_string(&user.session_data)?,
            last_updated_status: user.last_updated_status.map(|m| m.to_string()),
            version: user.version,
            created_at: ts(user.created_at),
            updated_at: ts(user.updated_at),
            last_active_at: ts(user.last_active_at),
            expired_at: ts_opt(user.expired_at),
        })
    }
}

/// Insert a new user. Returns `Conflict` if the id is taken.
pub async fn create_user(db: &Database, user: &UserRecord) -> Result<(), NilEasyError> {
    let p = UserParams::from_user(user)?;
    let id = p.id.clone();
    let inserted = db
        .connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let result = conn.execute(
                &format!(
                    "INSERT INTO users ({USER_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
                ),
                params![
                    p.id,
                    p.phone,
                    p.name,
                    p.gstin,
                    p.business_name,
                    p.legal_name,
                    p.address,
                    p.registration_date,
                    p.business_status,
                    p.profile_verified_at,
                    p.current_state,
                    p.session_data,
                    p.last_updated_status,
                    p.version,
                    p.created_at,
                    p.updated_at,
                    p.last_active_at,
                    p.expired_at,
                ],
            );
            match result {
                Ok(_) => Ok(true),
                Err(e) if is_constraint_violation(&e) => Ok(false),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)?;

    if inserted {
        Ok(())
    } else {
        Err(NilEasyError::Conflict {
            resource: "user".into(),
            id,
        })
    }
}

/// Load a user row (without history).
pub async fn get_user(db: &Database, id: &str) -> Result<Option<UserRecord>, NilEasyError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<UserRecord>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Id of the most recently active user bound to `gstin`.
pub async fn find_user_id_by_gstin(
    db: &Database,
    gstin: &str,
) -> Result<Option<String>, NilEasyError> {
    let gstin = gstin.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<String>, rusqlite::Error> {
            conn.query_row(
                "SELECT id FROM users WHERE gstin = ?1 ORDER BY last_active_at DESC LIMIT 1",
                params![gstin],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Compare-and-swap save. Writes only if the stored version still equals
/// `user.version`, and returns the bumped version.
pub async fn save_user(db: &Database, user: &UserRecord) -> Result<i64, NilEasyError> {
    let p = UserParams::from_user(user)?;
    let id = p.id.clone();
    let expected = p.version;
    let updated = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE users SET
                    phone = ?2, name = ?3, gstin = ?4, business_name = ?5, legal_name = ?6,
                    address = ?7, registration_date = ?8, business_status = ?9,
                    profile_verified_at = ?10, current_state = ?11, session_data = ?12,
                    last_updated_status = ?13, updated_at = ?14, last_active_at = ?15,
                    expired_at = ?16, version = version + 1
                 WHERE id = ?1 AND version = ?17",
                params![
                    p.id,
                    p.phone,
                    p.name,
                    p.gstin,
                    p.business_name,
                    p.legal_name,
                    p.address,
                    p.registration_date,
                    p.business_status,
                    p.profile_verified_at,
                    p.current_state,
                    p.session_data,
                    p.last_updated_status,
                    p.updated_at,
                    p.last_active_at,
                    p.expired_at,
                    p.version,
                ],
            )
        })
        .await
        .map_err(map_tr_err)?;

    if updated == 1 {
        Ok(expected + 1)
    } else {
        Err(NilEasyError::Conflict {
            resource: "user".into(),
            id,
        })
    }
}

/// Stamp `expired_at` on users idle since before `cutoff`.
pub async fn expire_inactive(
    db: &Database,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<u64, NilEasyError> {
    let (cutoff, now) = (ts(cutoff), ts(now));
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE users SET expired_at = ?2, version = version + 1
                 WHERE expired_at IS NULL AND last_active_at < ?1",
                params![cutoff, now],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed as u64)
}

/// Freshest cached profile for `gstin` verified at or after `not_before`.
pub async fn find_cached_profile(
    db: &Database,
    gstin: &str,
    not_before: DateTime<Utc>,
) -> Result<Option<BusinessProfile>, NilEasyError> {
    let gstin = gstin.to_string();
    let not_before = ts(not_before);
    let found = db
        .connection()
        .call(move |conn| -> Result<Option<Option<BusinessProfile>>, rusqlite::Error> {
            conn.query_row(
                "SELECT business_name, legal_name, address, registration_date, business_status,
                        profile_verified_at
                 FROM users
                 WHERE gstin = ?1 AND business_name IS NOT NULL AND profile_verified_at >= ?2
                 ORDER BY profile_verified_at DESC LIMIT 1",
                params![gstin, not_before],
                |row| profile_from_row(row, 0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(found.flatten())
}

/// Clear cached profile columns for every user bound to `gstin`.
pub async fn invalidate_cached_profile(db: &Database, gstin: &str) -> Result<u64, NilEasyError> {
    let gstin = gstin.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE users SET business_name = NULL, legal_name = NULL, address = NULL,
                    registration_date = NULL, business_status = NULL,
                    profile_verified_at = NULL, version = version + 1
                 WHERE gstin = ?1 AND profile_verified_at IS NOT NULL",
                params![gstin],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed as u64)
}

/// Age buckets of cached profiles relative to `now`.
pub async fn profile_cache_stats(
    db: &Database,
    now: DateTime<Utc>,
) -> Result<CacheStats, NilEasyError> {
    let week_ago = ts(now - Duration::days(7));
    let month_ago = ts(now - Duration::days(30));
    let (total, last_7_days, last_30_days) = db
        .connection()
        .call(move |conn| -> Result<(i64, i64, i64), rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*),
                        COALESCE(SUM(profile_verified_at >= ?1), 0),
                        COALESCE(SUM(profile_verified_at >= ?2), 0)
                 FROM users WHERE profile_verified_at IS NOT NULL",
                params![week_ago, month_ago],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
        })
        .await
        .map_err(map_tr_err)?;

    Ok(CacheStats {
        total: total as u64,
        last_7_days: last_7_days as u64,
        last_30_days: last_30_days as u64,
        older: (total - last_30_days) as u64,
    })
}
