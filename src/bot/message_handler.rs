//! Message Handler module for private user messages and support chat replies

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{debug, Instrument};

use crate::channel::OutboundChannel;
use crate::errors::{error_logging, AppResult, RelayError};
use crate::localization::t_lang;
use crate::observability;
use crate::relay::{InboundContent, SupportRelay, SupportTicket, SupportUser, TEAM_LANGUAGE};

use super::command_handlers::handle_unknown_command;
use super::BotState;

/// Entry point for every message that is not a known command
pub async fn message_handler(bot: Bot, msg: Message, state: Arc<BotState>) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id.0);
    let span = observability::telegram_span("message_handler", user_id);
    let start_time = Instant::now();

    let content = InboundContent::from_message(&msg);
    observability::record_telegram_message(content.kind());

    let result = route_message(&bot, &msg, content, &state).instrument(span).await;
    if let Err(e) = result {
        error_logging::log_internal_error(&e, "message_handler", "route_message", user_id);
    }

    observability::record_request_metrics("telegram_message", start_time.elapsed());
    Ok(())
}

fn is_command(content: &InboundContent) -> bool {
    matches!(content, InboundContent::Text(text) if text.starts_with('/'))
}

/// Where an incoming message goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A team member answering a support envelope
    SupportReply,
    UnknownCommand,
    /// Private message from a user, possibly a support request
    UserMessage,
    Ignore,
}

/// Decide how to handle a message from its chat and content
pub fn route_for(
    in_support_chat: bool,
    is_private: bool,
    is_reply: bool,
    content: &InboundContent,
) -> Route {
    if in_support_chat {
        if is_reply && content.is_forwardable() {
            Route::SupportReply
        } else if is_command(content) {
            Route::UnknownCommand
        } else {
            // Team chatter
            Route::Ignore
        }
    } else if !is_private {
        Route::Ignore
    } else if is_command(content) {
        Route::UnknownCommand
    } else {
        Route::UserMessage
    }
}

async fn route_message(
    bot: &Bot,
    msg: &Message,
    content: InboundContent,
    state: &BotState,
) -> Result<()> {
    let route = route_for(
        msg.chat.id == state.relay.support_chat(),
        msg.chat.is_private(),
        msg.reply_to_message().is_some(),
        &content,
    );
    debug!(route = ?route, chat_id = %msg.chat.id, "Routing message");

    match route {
        Route::SupportReply => handle_support_reply(bot, msg, &content, state).await,
        Route::UnknownCommand => handle_unknown_command(bot, msg, state).await,
        Route::UserMessage => handle_user_message(bot, msg, &content, state).await,
        Route::Ignore => Ok(()),
    }
}

/// Forward a private message to support when the user asked for it
async fn handle_user_message(
    bot: &Bot,
    msg: &Message,
    content: &InboundContent,
    state: &BotState,
) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user = SupportUser::from(from);
    let language = state.relay.language(user.id);

    let key = process_user_message(&state.relay, &user, content).await?;
    bot.send_message(msg.chat.id, t_lang(&state.localization, key, language))
        .await?;
    Ok(())
}

/// Submit the message when the user is awaiting support and pick the acknowledgement
pub async fn process_user_message<C: OutboundChannel>(
    relay: &SupportRelay<C>,
    user: &SupportUser,
    content: &InboundContent,
) -> AppResult<&'static str> {
    if !relay.is_awaiting(user.id).await? {
        debug!(user_id = %user.id, "Message outside of a support request");
        return Ok("support-use-command");
    }
    Ok(user_ack_key(&relay.submit(user, content).await))
}

/// Message shown to the user after a submission attempt
pub fn user_ack_key(result: &Result<SupportTicket, RelayError>) -> &'static str {
    match result {
        Ok(_) => "support-forwarded",
        Err(RelayError::UnsupportedContentKind) => "support-unsupported-content",
        Err(_) => "support-forward-failed",
    }
}

/// Route a team member's reply in the support chat back to the user
async fn handle_support_reply(
    bot: &Bot,
    msg: &Message,
    content: &InboundContent,
    state: &BotState,
) -> Result<()> {
    let Some(actor) = msg.from.as_ref() else {
        return Ok(());
    };
    let anchor = msg.reply_to_message().map(|anchor| anchor.id);

    let key = match state.relay.reply(actor.id, anchor, content).await {
        Ok(_) => "team-reply-sent",
        Err(e) => team_error_key(&e),
    };

    bot.send_message(msg.chat.id, t_lang(&state.localization, key, TEAM_LANGUAGE))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Message shown to the team for a rejected reply
pub fn team_error_key(error: &RelayError) -> &'static str {
    match error {
        RelayError::Unauthorized => "team-not-authorized-reply",
        RelayError::NoReplyTarget => "team-reply-not-anchored",
        RelayError::UnknownSession => "team-unknown-session",
        RelayError::Transport(_) | RelayError::UnsupportedContentKind => "team-reply-failed",
    }
}
