//! Outbound channel abstraction.
//!
//! [`OutboundChannel`] is the only way the relay and the order poller talk to
//! Telegram, which lets tests substitute a recording implementation.
//! [`teloxide::Bot`] implements it with HTML rich formatting.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, FileId, InputFile, MessageId, ParseMode};

use crate::errors::TransportError;

/// Sends rich-formatted messages and reports the identifier of the sent message
#[async_trait]
pub trait OutboundChannel: Send + Sync {
    /// Sends an HTML text message.
    async fn send_text(&self, chat_id: ChatId, body: &str) -> Result<MessageId, TransportError>;
    /// Sends an already-uploaded photo with an HTML caption.
    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &FileId,
        caption: &str,
    ) -> Result<MessageId, TransportError>;
}

#[async_trait]
impl OutboundChannel for Bot {
    async fn send_text(&self, chat_id: ChatId, body: &str) -> Result<MessageId, TransportError> {
        let sent = self
            .send_message(chat_id, body)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(sent.id)
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &FileId,
        caption: &str,
    ) -> Result<MessageId, TransportError> {
        let sent = Requester::send_photo(self, chat_id, InputFile::file_id(file_id.clone()))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await?;
        Ok(sent.id)
    }
}
