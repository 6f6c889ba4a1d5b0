// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock link shortener.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use nileasy_core::types::{AdapterType, HealthStatus, ShortLink};
use nileasy_core::{
    ExternalErrorKind, ExternalService, LinkShortener, NilEasyError, PluginAdapter,
};

/// Issues sequential short links (`https://sho.rt/s1`, `s2`, ...) and
/// records each request. Can be told to fail.
#[derive(Default)]
pub struct MockShortener {
    failing: AtomicBool,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockShortener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switches every following call to fail with `Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// `(number, body)` pairs received so far.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl PluginAdapter for MockShortener {
    fn name(&self) -> &str {
        "mock-shortener"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LinkShortener
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        Ok(())
    }
}

#[async_trait]
impl LinkShortener for MockShortener {
    async fn shorten_sms(&self, number: &str, body: &str) -> Result<ShortLink, NilEasyError> {
        let count = {
            let mut requests = self.requests.lock().unwrap_or_else(|e| e.into_inner());
            requests.push((number.to_string(), body.to_string()));
            requests.len()
        };
        if self.failing.load(Ordering::SeqCst) {
            return Err(NilEasyError::external(
                ExternalService::LinkShortener,
                ExternalErrorKind::Unavailable,
                "mock shortener offline",
            ));
        }
        let short_code = format!("s{count}");
        Ok(ShortLink {
            short_url: format!("https://sho.rt/{short_code}"),
            short_code,
        })
    }
}
