// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for integration testing.
//!
//! `TestHarness` bundles a temp SQLite database with the mock adapters and a
//! manual clock, so flow and gateway tests can assemble the real services on
//! top of it.

use std::sync::Arc;

use nileasy_config::NilEasyConfig;
use nileasy_config::model::StorageConfig;
use nileasy_core::{NilEasyError, StorageAdapter};
use nileasy_storage::SqliteStorage;

use crate::clock::ManualClock;
use crate::mock_channel::MockChannel;
use crate::mock_portal::MockTaxPortal;
use crate::mock_shortener::MockShortener;

/// GSTIN registered with the harness portal.
pub const TEST_GSTIN: &str = "29AABCU9603R1ZX";
/// Trade name registered for [`TEST_GSTIN`].
pub const TEST_BUSINESS: &str = "Uber India";
/// Phone used by the harness chat user.
pub const TEST_PHONE: &str = "+919876543210";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: NilEasyConfig,
    today: (i32, u32, u32),
    text_only_channel: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: NilEasyConfig::default(),
            today: (2026, 3, 15),
            text_only_channel: false,
        }
    }

    /// Replace the configuration. The storage path is always overridden.
    pub fn with_config(mut self, config: NilEasyConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the manual clock at 10:00 UTC on this day.
    pub fn on_day(mut self, year: i32, month: u32, day: u32) -> Self {
        self.today = (year, month, day);
        self
    }

    /// Use a channel without media or button support.
    pub fn with_text_only_channel(mut self) -> Self {
        self.text_only_channel = true;
        self
    }

    /// Build the test harness, creating the temp database.
    pub async fn build(self) -> Result<TestHarness, NilEasyError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| NilEasyError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("test.db");

        let mut config = self.config;
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            ..config.storage
        };

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let (year, month, day) = self.today;
        Ok(TestHarness {
            storage,
            portal: Arc::new(MockTaxPortal::new().with_taxpayer(TEST_GSTIN, TEST_BUSINESS)),
            shortener: Arc::new(MockShortener::new()),
            channel: Arc::new(if self.text_only_channel {
                MockChannel::text_only()
            } else {
                MockChannel::new()
            }),
            clock: Arc::new(ManualClock::on(year, month, day)),
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// Temp storage, mock adapters and a manual clock.
pub struct TestHarness {
    /// SQLite storage (temp DB, cleaned up on drop). Also the session store.
    pub storage: Arc<SqliteStorage>,
    /// Portal knowing [`TEST_GSTIN`].
    pub portal: Arc<MockTaxPortal>,
    pub shortener: Arc<MockShortener>,
    pub channel: Arc<MockChannel>,
    pub clock: Arc<ManualClock>,
    pub config: NilEasyConfig,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }
}
