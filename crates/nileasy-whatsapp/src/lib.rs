// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp plumbing for NilEasy.
//!
//! Inbound: [`webhook::parse_webhook`] turns Twilio form posts and JSON
//! gateway events into a normalized [`InboundMessage`](nileasy_core::types::InboundMessage),
//! and [`signature`] checks Twilio request signatures.
//!
//! Outbound: [`ChannelAdapter`] implementations for Twilio, the Meta Cloud
//! API and a log-only channel used in development.

pub mod cloud;
pub mod log;
pub mod signature;
pub mod twilio;
pub mod webhook;

use std::sync::Arc;

use nileasy_config::ChannelProvider;
use nileasy_config::model::ChannelConfig;
use nileasy_core::{ChannelAdapter, NilEasyError};

pub use cloud::CloudApiChannel;
pub use log::LogChannel;
pub use twilio::TwilioChannel;
pub use webhook::parse_webhook;

/// Builds the channel selected by `config.provider`.
pub fn build_channel(config: &ChannelConfig) -> Result<Arc<dyn ChannelAdapter>, NilEasyError> {
    let channel: Arc<dyn ChannelAdapter> = match config.provider {
        ChannelProvider::Log => Arc::new(LogChannel::new()),
        ChannelProvider::Twilio => Arc::new(TwilioChannel::new(config)?),
        ChannelProvider::CloudApi => Arc::new(CloudApiChannel::new(config)?),
    };
    tracing::info!(provider = %config.provider, "outbound channel ready");
    Ok(channel)
}

/// Maps a transport failure into a channel error.
pub(crate) fn transport_err(provider: &str, e: reqwest::Error) -> NilEasyError {
    let what = if e.is_timeout() { "timed out" } else { "request failed" };
    NilEasyError::Channel {
        message: format!("{provider} {what}"),
        source: Some(Box::new(e)),
    }
}
