//! Command Handlers module for processing bot commands

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{ParseMode, User};
use teloxide::utils::command::BotCommands;
use tracing::{debug, Instrument};

use crate::errors::error_logging;
use crate::language::Language;
use crate::localization::t_lang;
use crate::observability;

use super::ui_builder::{
    create_quick_access_keyboard, create_support_request_keyboard, create_welcome_keyboard,
    format_session_list, format_welcome_message,
};
use super::BotState;

/// Commands understood by the bot
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "contact the support team")]
    Support,
    #[command(description = "learn what this bot is for")]
    About,
    #[command(description = "list support sessions (support team only)")]
    List,
}

/// Entry point for parsed commands; failures are logged, never propagated
pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState>,
) -> Result<()> {
    let user_id = msg.from.as_ref().map(|user| user.id.0);
    let span = observability::telegram_span("command_handler", user_id);
    let start_time = Instant::now();

    observability::record_telegram_message("command");
    debug!(user_id = ?user_id, command = ?cmd, "Received command");

    let result = dispatch_command(&bot, &msg, &cmd, &state).instrument(span).await;
    if let Err(e) = result {
        error_logging::log_internal_error(&e, "command_handler", &format!("{:?}", cmd), user_id);
    }

    observability::record_request_metrics("telegram_command", start_time.elapsed());
    Ok(())
}

async fn dispatch_command(bot: &Bot, msg: &Message, cmd: &Command, state: &BotState) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    match cmd {
        Command::Start => handle_start_command(bot, msg.chat.id, user, state).await,
        Command::Support => {
            let language = state.relay.language(user.id);
            send_support_intro(bot, msg.chat.id, state, language).await
        }
        Command::About => {
            let language = state.relay.language(user.id);
            send_about(bot, msg.chat.id, state, language).await
        }
        Command::List => handle_list_command(bot, msg.chat.id, user, state).await,
    }
}

/// Handle the /start command; the user's language is reset to Russian
pub async fn handle_start_command(
    bot: &Bot,
    chat_id: ChatId,
    user: &User,
    state: &BotState,
) -> Result<()> {
    state.relay.set_language(user.id, Language::Ru);
    send_start_message(bot, chat_id, user, state, Language::Ru).await
}

/// Send the welcome message and the quick access keyboard
pub async fn send_start_message(
    bot: &Bot,
    chat_id: ChatId,
    user: &User,
    state: &BotState,
    language: Language,
) -> Result<()> {
    let localization = &state.localization;

    bot.send_message(
        chat_id,
        format_welcome_message(localization, language, &user.first_name),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(create_welcome_keyboard(localization, language, &state.website))
    .await?;

    bot.send_message(chat_id, t_lang(localization, "welcome-quick-access", language))
        .reply_markup(create_quick_access_keyboard(localization, language, &state.website))
        .await?;

    Ok(())
}

/// Explain how to reach support and offer the request button
pub async fn send_support_intro(
    bot: &Bot,
    chat_id: ChatId,
    state: &BotState,
    language: Language,
) -> Result<()> {
    bot.send_message(chat_id, t_lang(&state.localization, "support-intro", language))
        .reply_markup(create_support_request_keyboard(&state.localization, language))
        .await?;
    Ok(())
}

pub async fn send_about(
    bot: &Bot,
    chat_id: ChatId,
    state: &BotState,
    language: Language,
) -> Result<()> {
    bot.send_message(chat_id, t_lang(&state.localization, "about-text", language))
        .await?;
    Ok(())
}

/// Ask for the support message and arm the user's support request
pub async fn prompt_support_message(
    bot: &Bot,
    chat_id: ChatId,
    user: &User,
    state: &BotState,
) -> Result<()> {
    let language = state.relay.language(user.id);
    bot.send_message(
        chat_id,
        t_lang(&state.localization, "support-request-prompt", language),
    )
    .await?;

    state.relay.begin_support_request(user.id).await?;
    Ok(())
}

/// Handle the /list command (support team only)
async fn handle_list_command(
    bot: &Bot,
    chat_id: ChatId,
    user: &User,
    state: &BotState,
) -> Result<()> {
    let language = crate::relay::TEAM_LANGUAGE;

    let text = match state.relay.list_sessions(user.id) {
        Ok(sessions) => format_session_list(&state.localization, language, &sessions),
        Err(_) => t_lang(&state.localization, "team-not-authorized-command", language),
    };

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Reply to a `/command` this bot does not know
pub async fn handle_unknown_command(bot: &Bot, msg: &Message, state: &BotState) -> Result<()> {
    let language = msg
        .from
        .as_ref()
        .map(|user| state.relay.language(user.id))
        .unwrap_or_default();

    bot.send_message(msg.chat.id, t_lang(&state.localization, "unknown-command", language))
        .await?;
    Ok(())
}
