// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for NilEasy.
//!
//! WAL-mode SQLite with embedded refinery migrations, a single writer via
//! `tokio-rusqlite`, and typed queries for users, filing attempts,
//! generated links and expiring key-value entries.

pub mod adapter;
pub mod database;
pub mod migrations;
pub mod queries;

pub use adapter::SqliteStorage;
pub use database::Database;
