// SPDX-FileCopyrightText: 2026 NilEasy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The filing conversation.
//!
//! [`Dispatcher`] turns one inbound chat message into a conversation turn:
//! it loads the sender's record, lets the [`ConversationMachine`] route the
//! input to the handler for the current state, saves the record with a
//! version check and sends the replies. [`FilingApi`] exposes the same
//! building blocks without a conversation, for callers that keep their
//! own state.

pub mod api;
pub mod context;
pub mod dispatcher;
mod handlers;
pub mod machine;
pub mod messages;
pub mod outcome;

pub use api::FilingApi;
pub use context::{FlowContext, FlowSettings};
pub use dispatcher::Dispatcher;
pub use machine::ConversationMachine;
pub use outcome::{Outcome, Reply};
