// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generated SMS link history and click tracking.

use nileasy_core::NilEasyError;
use nileasy_core::user::{GeneratedLink, NewGeneratedLink};
use nileasy_gst::Period;
use rusqlite::{Row, params};

use super::{conversion_err, parse_col, parse_ts, ts};
use crate::database::{Database, map_tr_err};

const LINK_COLUMNS: &str = "id, user_id, kind, gstin, return_type, period, short_url, short_code, \
     sms_text, clicked, created_at";

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<GeneratedLink> {
    Ok(GeneratedLink {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: parse_col(2, &row.get::<_, String>(2)?)?,
        gstin: row.get(3)?,
        return_type: parse_col(4, &row.get::<_, String>(4)?)?,
        period: Period::from_code(&row.get::<_, String>(5)?).map_err(|e| conversion_err(5, e))?,
        short_url: row.get(6)?,
        short_code: row.get(7)?,
        sms_text: row.get(8)?,
        clicked: row.get(9)?,
        created_at: parse_ts(10, &row.get::<_, String>(10)?)?,
    })
}

/// Append a generated link.
pub async fn record(db: &Database, link: &NewGeneratedLink) -> Result<GeneratedLink, NilEasyError> {
    let link = link.clone();
    db.connection()
        .call(move |conn| -> Result<GeneratedLink, rusqlite::Error> {
            conn.execute(
                "INSERT INTO generated_links
                    (user_id, kind, gstin, return_type, period, short_url, short_code, sms_text, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    link.user_id,
                    link.kind.to_string(),
                    link.gstin,
                    link.return_type.as_key(),
                    link.period.code(),
                    link.short_url,
                    link.short_code,
                    link.sms_text,
                    ts(link.created_at),
                ],
            )?;
            let id = conn.last_insert_rowid();
            conn.query_row(
                &format!("SELECT {LINK_COLUMNS} FROM generated_links WHERE id = ?1"),
                params![id],
                link_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

/// All links for a user, oldest first.
pub async fn list_for_user(db: &Database, user_id: &str) -> Result<Vec<GeneratedLink>, NilEasyError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<GeneratedLink>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LINK_COLUMNS} FROM generated_links WHERE user_id = ?1 ORDER BY id"
            ))?;
            let rows = stmt.query_map(params![user_id], link_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Flag links with `short_code` as clicked. Returns whether any matched.
pub async fn mark_clicked(db: &Database, short_code: &str) -> Result<bool, NilEasyError> {
    let short_code = short_code.to_string();
    let changed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "UPDATE generated_links SET clicked = 1 WHERE short_code = ?1",
                params![short_code],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(changed > 0)
}
