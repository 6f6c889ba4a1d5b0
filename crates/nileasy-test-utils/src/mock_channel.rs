// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` and captures outbound messages
//! for assertion in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use nileasy_core::types::{
    AdapterType, ChannelCapabilities, HealthStatus, MessageId, OutboundMessage,
};
use nileasy_core::{ChannelAdapter, NilEasyError, PluginAdapter};

/// A mock messaging channel.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    capabilities: ChannelCapabilities,
}

impl MockChannel {
    /// A channel that supports media and buttons.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            capabilities: ChannelCapabilities {
                supports_media: true,
                supports_buttons: true,
            },
        }
    }

    /// A channel limited to plain text.
    pub fn text_only() -> Self {
        Self {
            capabilities: ChannelCapabilities {
                supports_media: false,
                supports_buttons: false,
            },
            ..Self::new()
        }
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, NilEasyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), NilEasyError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        self.capabilities
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NilEasyError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(MessageId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_captures_outbound_messages() {
        let channel = MockChannel::new();
        let msg_id = channel
            .send(OutboundMessage::text("+919876543210", "hello"))
            .await
            .unwrap();
        assert!(msg_id.0.starts_with("mock-msg-"));

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "hello");

        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }

    #[test]
    fn text_only_has_no_rich_features() {
        let caps = MockChannel::text_only().capabilities();
        assert!(!caps.supports_media);
        assert!(!caps.supports_buttons);
    }
}
