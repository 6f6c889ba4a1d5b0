// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! What a handler hands back to the state machine.

use nileasy_core::ConversationState;
use nileasy_core::types::{ChannelCapabilities, OutboundMessage, ReplyButton};

/// A reply not yet addressed to anyone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub media_url: Option<String>,
    pub buttons: Vec<ReplyButton>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            media_url: None,
            buttons: Vec::new(),
        }
    }

    pub fn with_media(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }

    pub fn with_buttons<I, S, T>(mut self, buttons: I) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        self.buttons = buttons
            .into_iter()
            .map(|(id, title)| ReplyButton::new(id, title))
            .collect();
        self
    }

    /// Addresses the reply to `to`.
    ///
    /// Media on a channel that cannot attach it is turned into a link in
    /// the body. Button fallback is left to the channel.
    pub fn into_outbound(self, to: &str, caps: ChannelCapabilities) -> OutboundMessage {
        let mut text = self.text;
        let mut media_url = self.media_url;
        if !caps.supports_media
            && let Some(url) = media_url.take()
        {
            text.push_str(&format!("\n\n{url}"));
        }
        OutboundMessage {
            to: to.to_string(),
            text,
            media_url,
            buttons: self.buttons,
        }
    }
}

/// Result of handling one input in one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub next: ConversationState,
    pub replies: Vec<Reply>,
    /// The input was rejected and counts against the state's retry budget.
    pub invalid_input: bool,
}

impl Outcome {
    /// Move to `next` (or stay, when `next` is the current state).
    pub fn go(next: ConversationState, reply: Reply) -> Self {
        Self {
            next,
            replies: vec![reply],
            invalid_input: false,
        }
    }

    /// Stay in `state` with an informational reply. Not counted as a retry.
    pub fn stay(state: ConversationState, reply: Reply) -> Self {
        Self::go(state, reply)
    }

    /// Stay in `state` and count the input as invalid.
    pub fn invalid(state: ConversationState, reply: Reply) -> Self {
        Self {
            next: state,
            replies: vec![reply],
            invalid_input: true,
        }
    }

    /// Count the input as invalid without replying. The state machine
    /// supplies the reply once the retry budget runs out.
    pub fn rejected(state: ConversationState) -> Self {
        Self {
            next: state,
            replies: Vec::new(),
            invalid_input: true,
        }
    }

    /// Move to `next` without saying anything. Used when the next state
    /// produces the reply itself.
    pub fn silent(next: ConversationState) -> Self {
        Self {
            next,
            replies: Vec::new(),
            invalid_input: false,
        }
    }

    /// Prepends `reply` to the outgoing replies.
    pub fn preceded_by(mut self, reply: Reply) -> Self {
        self.replies.insert(0, reply);
        self
    }
}
