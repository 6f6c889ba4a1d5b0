// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One inbound message, one conversation turn.

use std::sync::Arc;

use nileasy_core::phone::mask_phone;
use nileasy_core::types::{InboundMessage, OutboundMessage};
use nileasy_core::user::UserRecord;
use nileasy_core::{ChannelAdapter, MessageId, NilEasyError, PluginAdapter};
use tracing::{debug, error, info, warn};

use crate::context::FlowContext;
use crate::machine::ConversationMachine;
use crate::messages;
use crate::outcome::Reply;

/// Loads the sender's record, runs the state machine, saves the record
/// with a version check and delivers the replies.
///
/// The dispatcher never retries. A lost version check asks the user to
/// send their message again.
pub struct Dispatcher {
    machine: ConversationMachine,
    channel: Arc<dyn ChannelAdapter>,
}

impl Dispatcher {
    pub fn new(ctx: Arc<FlowContext>, channel: Arc<dyn ChannelAdapter>) -> Self {
        info!(channel = channel.name(), "dispatcher initialized");
        Self {
            machine: ConversationMachine::new(ctx),
            channel,
        }
    }

    pub fn context(&self) -> &FlowContext {
        self.machine.context()
    }

    /// Runs one turn for `msg` and returns the addressed replies.
    pub async fn handle(&self, msg: &InboundMessage) -> Vec<OutboundMessage> {
        let replies = match self.turn(msg).await {
            Ok(replies) => replies,
            Err(NilEasyError::Conflict { .. }) => {
                warn!(
                    phone = %mask_phone(&msg.phone),
                    "user record changed during turn, asking to resend"
                );
                vec![messages::please_resend()]
            }
            Err(e) => {
                error!(phone = %mask_phone(&msg.phone), error = %e, "turn failed");
                let detail = self
                    .context()
                    .settings
                    .expose_error_details
                    .then(|| e.to_string());
                vec![messages::internal_error(detail.as_deref())]
            }
        };

        let caps = self.channel.capabilities();
        replies
            .into_iter()
            .map(|reply| reply.into_outbound(&msg.phone, caps))
            .collect()
    }

    /// Handles `msg` and sends every reply through the channel.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Result<Vec<MessageId>, NilEasyError> {
        let outbound = self.handle(msg).await;
        let mut delivered = Vec::with_capacity(outbound.len());
        for message in outbound {
            delivered.push(self.channel.send(message).await?);
        }
        Ok(delivered)
    }

    async fn turn(&self, msg: &InboundMessage) -> Result<Vec<Reply>, NilEasyError> {
        let ctx = self.context();
        let now = ctx.clock.now();

        let mut user = match ctx.storage.get_user(&msg.phone).await? {
            Some(user) => user,
            None => {
                let user = UserRecord::for_phone(&msg.phone, msg.name.clone(), now);
                ctx.storage.create_user(&user).await?;
                info!(phone = %mask_phone(&msg.phone), "new user");
                user
            }
        };
        if msg.name.is_some() {
            user.name = msg.name.clone();
        }

        let from = user.current_state;
        let replies = self.machine.advance(&mut user, msg.input(), now).await;
        user.last_active_at = now;
        user.updated_at = now;
        ctx.storage.save_user(&user).await?;

        debug!(
            phone = %mask_phone(&msg.phone),
            from = %from,
            to = %user.current_state,
            replies = replies.len(),
            "turn complete"
        );
        Ok(replies)
    }
}
