//! Callback Handler module for processing inline keyboard callback queries

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, MaybeInaccessibleMessage};
use tracing::{debug, warn, Instrument};

use crate::errors::error_logging;
use crate::observability;

use super::super::command_handlers::{
    prompt_support_message, send_about, send_start_message, send_support_intro,
};
use super::super::BotState;
use super::CallbackAction;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, state: Arc<BotState>) -> Result<()> {
    let span = observability::telegram_span("callback_handler", Some(q.from.id.0));
    let start_time = Instant::now();
    observability::record_telegram_message("callback");

    let result = handle_callback(&bot, &q, &state).instrument(span).await;
    if let Err(e) = result {
        error_logging::log_internal_error(
            &e,
            "callback_handler",
            q.data.as_deref().unwrap_or(""),
            Some(q.from.id.0),
        );
    }

    // Answer the callback query to remove the loading state
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        error_logging::log_network_error(&e, "answer_callback_query", None, Some(q.from.id.0));
    }

    observability::record_request_metrics("telegram_callback", start_time.elapsed());
    Ok(())
}

async fn handle_callback(bot: &Bot, q: &CallbackQuery, state: &BotState) -> Result<()> {
    let data = q.data.as_deref().unwrap_or("");
    let action = match data.parse::<CallbackAction>() {
        Ok(action) => action,
        Err(e) => {
            warn!(user_id = %q.from.id, error = %e, "Ignoring unknown callback");
            return Ok(());
        }
    };
    debug!(user_id = %q.from.id, action = ?action, "Handling callback action");

    // Respond in the chat of the message that carried the keyboard
    let chat_id = match &q.message {
        Some(MaybeInaccessibleMessage::Regular(msg)) => msg.chat.id,
        Some(MaybeInaccessibleMessage::Inaccessible(msg)) => msg.chat.id,
        None => ChatId::from(q.from.id),
    };
    let user = &q.from;

    match action {
        CallbackAction::SetLanguage(language) => {
            state.relay.set_language(user.id, language);
            send_start_message(bot, chat_id, user, state, language).await
        }
        CallbackAction::Support => {
            let language = state.relay.language(user.id);
            send_support_intro(bot, chat_id, state, language).await
        }
        CallbackAction::About => {
            let language = state.relay.language(user.id);
            send_about(bot, chat_id, state, language).await
        }
        CallbackAction::SendSupportRequest => {
            prompt_support_message(bot, chat_id, user, state).await
        }
    }
}
