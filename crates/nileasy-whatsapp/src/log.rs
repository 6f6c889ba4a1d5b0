// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A channel that logs replies instead of delivering them.

use async_trait::async_trait;
use nileasy_core::phone::mask_phone;
use nileasy_core::types::{ChannelCapabilities, MessageId, OutboundMessage};
use nileasy_core::{AdapterType, ChannelAdapter, HealthStatus, NilEasyError, PluginAdapter};
use tracing::info;

#[derive(Debug, Default)]
pub struct LogChannel;

impl LogChannel {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PluginAdapter for LogChannel {
    fn name(&self) -> &str {
        "log"
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
impl ChannelAdapter for LogChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_media: true,
            supports_buttons: true,
        }
    }

    async fn send(&self, msg: OutboundMessage) -> Result<MessageId, NilEasyError> {
        info!(
            to = %mask_phone(&msg.to),
            media = msg.media_url.as_deref().unwrap_or("-"),
            buttons = msg.buttons.len(),
            "reply:\n{}",
            msg.text
        );
        Ok(MessageId(format!("log-{}", uuid::Uuid::new_v4())))
    }
}
