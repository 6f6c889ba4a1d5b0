// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filing attempt history.

use chrono::{DateTime, Utc};
use nileasy_core::NilEasyError;
use nileasy_core::user::{FilingAttempt, FilingStatus, NewFiling};
use nileasy_gst::{Period, ReturnType};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{conversion_err, parse_col, parse_ts, parse_ts_opt, ts, ts_opt};
use crate::database::{Database, map_tr_err};

const FILING_COLUMNS: &str =
    "id, user_id, gstin, return_type, period, status, arn, created_at, updated_at, completed_at";

pub(crate) fn filing_from_row(row: &Row<'_>) -> rusqlite::Result<FilingAttempt> {
    Ok(FilingAttempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        gstin: row.get(2)?,
        return_type: parse_col::<ReturnType>(3, &row.get::<_, String>(3)?)?,
        period: Period::from_code(&row.get::<_, String>(4)?).map_err(|e| conversion_err(4, e))?,
        status: parse_col(5, &row.get::<_, String>(5)?)?,
        arn: row.get(6)?,
        created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
        updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
        completed_at: parse_ts_opt(9, row.get(9)?)?,
    })
}

fn fetch(conn: &Connection, id: i64) -> rusqlite::Result<Option<FilingAttempt>> {
    conn.query_row(
        &format!("SELECT {FILING_COLUMNS} FROM filings WHERE id = ?1"),
        params![id],
        filing_from_row,
    )
    .optional()
}

/// Create an attempt, or return the open one for the same triple.
///
/// The open attempt is shared by every record holding the GSTIN. When a
/// different record asks for it, ownership moves to that record so a user's
/// `filings` only ever lists its own rows.
pub async fn record_filing(db: &Database, filing: &NewFiling) -> Result<FilingAttempt, NilEasyError> {
    let user_id = filing.user_id.clone();
    let gstin = filing.gstin.clone();
    let return_type = filing.return_type.as_key();
    let period = filing.period.code();
    let created_at = ts(filing.created_at);

    db.connection()
        .call(move |conn| -> Result<FilingAttempt, rusqlite::Error> {
            let tx = conn.transaction()?;
            let open = tx
                .query_row(
                    &format!(
                        "SELECT {FILING_COLUMNS} FROM filings
                         WHERE gstin = ?1 AND return_type = ?2 AND period = ?3
                           AND status NOT IN ('completed', 'failed')"
                    ),
                    params![gstin, return_type, period],
                    filing_from_row,
                )
                .optional()?;
            if let Some(existing) = open {
                if existing.user_id == user_id {
                    return Ok(existing);
                }
                tx.execute(
                    "UPDATE filings SET user_id = ?2 WHERE id = ?1",
                    params![existing.id, user_id],
                )?;
                let moved = fetch(&tx, existing.id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
                tx.commit()?;
                return Ok(moved);
            }

            tx.execute(
                "INSERT INTO filings (user_id, gstin, return_type, period, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, 'initiated', ?5, ?5)",
                params![user_id, gstin, return_type, period, created_at],
            )?;
            let id = tx.last_insert_rowid();
            let created = fetch(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(created)
        })
        .await
        .map_err(map_tr_err)
}

enum StatusUpdate {
    Missing,
    Rejected(FilingStatus),
    Applied(FilingAttempt),
}

/// Move a filing forward. `arn`, when given, replaces the stored one.
pub async fn update_status(
    db: &Database,
    id: i64,
    status: FilingStatus,
    arn: Option<&str>,
    now: DateTime<Utc>,
) -> Result<FilingAttempt, NilEasyError> {
    let arn = arn.map(str::to_string);
    let now_ts = ts(now);
    let completed_at = ts_opt((status == FilingStatus::Completed).then_some(now));

    let outcome = db
        .connection()
        .call(move |conn| -> Result<StatusUpdate, rusqlite::Error> {
            let tx = conn.transaction()?;
            let Some(current) = fetch(&tx, id)? else {
                return Ok(StatusUpdate::Missing);
            };
            if !current.status.can_advance_to(status) {
                return Ok(StatusUpdate::Rejected(current.status));
            }
            tx.execute(
                "UPDATE filings SET status = ?2, arn = COALESCE(?3, arn), updated_at = ?4,
                    completed_at = COALESCE(completed_at, ?5)
                 WHERE id = ?1",
                params![id, status.to_string(), arn, now_ts, completed_at],
            )?;
            let updated = fetch(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
            tx.commit()?;
            Ok(StatusUpdate::Applied(updated))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        StatusUpdate::Applied(filing) => Ok(filing),
        StatusUpdate::Missing => Err(NilEasyError::not_found("filing", id.to_string())),
        StatusUpdate::Rejected(current) => Err(NilEasyError::validation(format!(
            "filing {id} cannot move from {current} to {status}"
        ))),
    }
}

/// All attempts for a user, oldest first.
pub async fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<FilingAttempt>, NilEasyError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<FilingAttempt>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {FILING_COLUMNS} FROM filings WHERE user_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![user_id], filing_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Latest completed attempt for the triple, optionally completed at or after `since`.
pub async fn find_completed(
    db: &Database,
    gstin: &str,
    return_type: ReturnType,
    period: Period,
    since: Option<DateTime<Utc>>,
) -> Result<Option<FilingAttempt>, NilEasyError> {
    let gstin = gstin.to_string();
    let return_type = return_type.as_key();
    let period = period.code();
    let since = ts_opt(since);
    db.connection()
        .call(move |conn| -> Result<Option<FilingAttempt>, rusqlite::Error> {
            conn.query_row(
                &format!(
                    "SELECT {FILING_COLUMNS} FROM filings
                     WHERE gstin = ?1 AND return_type = ?2 AND period = ?3
                       AND status = 'completed'
                       AND (?4 IS NULL OR completed_at >= ?4)
                     ORDER BY completed_at DESC LIMIT 1"
                ),
                params![gstin, return_type, period, since],
                filing_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
