// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sliding-window rate limiting backed by the session store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use nileasy_core::{Clock, NilEasyError, SessionStore};
use tracing::warn;

/// Allows at most `limit` hits per `window` for each key.
pub struct RateLimiter {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    namespace: String,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
        namespace: &str,
        limit: u32,
        window: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            namespace: namespace.to_string(),
            limit,
            window,
        }
    }

    /// Record a hit for `key`, failing with `RateLimited` if the window is full.
    /// Rejected hits are not recorded.
    pub async fn check(&self, key: &str) -> Result<(), NilEasyError> {
        let now = self.clock.now();
        let store_key = format!("ratelimit:{}:{key}", self.namespace);
        let window_start = now - self.window;

        let mut hits: Vec<DateTime<Utc>> = match self.store.get(&store_key, now).await? {
            Some(raw) => serde_json::from_slice(&raw)?,
            None => Vec::new(),
        };
        hits.retain(|at| *at > window_start);

        if hits.len() >= self.limit as usize {
            warn!(namespace = %self.namespace, "rate limit hit");
            return Err(NilEasyError::RateLimited {
                message: format!(
                    "at most {} {} requests per {} minutes",
                    self.limit,
                    self.namespace,
                    self.window.num_minutes()
                ),
            });
        }

        hits.push(now);
        self.store
            .put(&store_key, serde_json::to_vec(&hits)?, now + self.window)
            .await
    }
}
