// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nileasy_core::{NilEasyError, SessionStore};

/// A [`SessionStore`] backed by a concurrent map.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, (Vec<u8>, DateTime<Utc>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        value: Vec<u8>,
        expires_at: DateTime<Utc>,
    ) -> Result<(), NilEasyError> {
        self.entries.insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn get(&self, key: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>, NilEasyError> {
        Ok(self
            .entries
            .get(key)
            .filter(|entry| entry.1 > now)
            .map(|entry| entry.0.clone()))
    }

    async fn remove(&self, key: &str) -> Result<bool, NilEasyError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, NilEasyError> {
        let before = self.entries.len();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - self.entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn honours_expiry() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store.put("a", b"1".to_vec(), now + Duration::minutes(1)).await.unwrap();
        store.put("b", b"2".to_vec(), now - Duration::minutes(1)).await.unwrap();

        assert_eq!(store.get("a", now).await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("b", now).await.unwrap(), None);
        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.remove("a").await.unwrap());
        assert!(store.is_empty());
    }
}
