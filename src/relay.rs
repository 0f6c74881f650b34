//! Message relay between end users and the support team.
//!
//! Users write to the bot privately. Once they asked to contact support, their
//! next text or photo is wrapped in an envelope and posted into the support
//! chat. Team members answer by replying to that envelope. The reply is routed
//! back to the user through the [`SupportSessionRegistry`].

use std::collections::HashSet;
use std::sync::Arc;

use teloxide::types::{ChatId, FileId, Message, MessageId, User, UserId};
use teloxide::utils::html;
use tracing::{debug, info, warn};

use crate::channel::OutboundChannel;
use crate::dialogue::ConversationTracker;
use crate::errors::{error_logging, AppResult, RelayError};
use crate::language::{Language, LanguagePreferences};
use crate::localization::{t_lang, LocalizationManager};
use crate::observability;
use crate::orders::truncate_message;
use crate::registry::{SessionEntry, SupportSessionRegistry};

/// Locale of everything the support team reads
pub const TEAM_LANGUAGE: Language = Language::En;

/// User text kept in an envelope; Telegram allows 4096 visible characters per message
pub const MAX_TEXT_BODY_CHARS: usize = 3_800;

/// Caption text kept in an envelope; Telegram allows 1024 visible characters per caption
pub const MAX_CAPTION_BODY_CHARS: usize = 800;

/// Content of an inbound message, as far as the relay cares
#[derive(Debug, Clone, PartialEq)]
pub enum InboundContent {
    Text(String),
    Photo {
        file_id: FileId,
        caption: Option<String>,
    },
    /// Stickers, documents, voice notes, ...
    Other,
}

impl InboundContent {
    /// Classify a Telegram message; photos keep their largest size
    pub fn from_message(msg: &Message) -> Self {
        if let Some(text) = msg.text() {
            return InboundContent::Text(text.to_string());
        }

        if let Some(largest) = msg.photo().and_then(|sizes| sizes.last()) {
            return InboundContent::Photo {
                file_id: largest.file.id.clone(),
                caption: msg.caption().map(str::to_string),
            };
        }

        InboundContent::Other
    }

    pub fn is_forwardable(&self) -> bool {
        !matches!(self, InboundContent::Other)
    }

    /// Label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            InboundContent::Text(_) => "text",
            InboundContent::Photo { .. } => "photo",
            InboundContent::Other => "other",
        }
    }
}

/// The end user behind a support request
#[derive(Debug, Clone, PartialEq)]
pub struct SupportUser {
    pub id: UserId,
    pub first_name: String,
    pub username: Option<String>,
}

impl From<&User> for SupportUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            username: user.username.clone(),
        }
    }
}

/// A request successfully posted into the support chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportTicket {
    /// Identifier of the envelope in the support chat
    pub message_id: MessageId,
}

/// Owns all per-user state of the support flow and forwards messages both ways
pub struct SupportRelay<C> {
    channel: Arc<C>,
    localization: Arc<LocalizationManager>,
    languages: LanguagePreferences,
    conversations: ConversationTracker,
    registry: SupportSessionRegistry,
    support_chat: ChatId,
    team: HashSet<UserId>,
}

impl<C: OutboundChannel> SupportRelay<C> {
    pub fn new(
        channel: Arc<C>,
        localization: Arc<LocalizationManager>,
        support_chat: ChatId,
        team: HashSet<UserId>,
        conversations: ConversationTracker,
        registry: SupportSessionRegistry,
    ) -> Self {
        Self {
            channel,
            localization,
            languages: LanguagePreferences::new(),
            conversations,
            registry,
            support_chat,
            team,
        }
    }

    pub fn support_chat(&self) -> ChatId {
        self.support_chat
    }

    pub fn registry(&self) -> &SupportSessionRegistry {
        &self.registry
    }

    pub fn language(&self, user_id: UserId) -> Language {
        self.languages.get(user_id)
    }

    pub fn set_language(&self, user_id: UserId, language: Language) {
        self.languages.set(user_id, language);
    }

    pub fn is_team_member(&self, user_id: UserId) -> bool {
        self.team.contains(&user_id)
    }

    /// Arm the user so that their next text or photo goes to support
    pub async fn begin_support_request(&self, user_id: UserId) -> AppResult<()> {
        self.conversations.begin_support_request(user_id).await?;
        debug!(user_id = %user_id, "User is now awaiting a support message");
        Ok(())
    }

    pub async fn is_awaiting(&self, user_id: UserId) -> AppResult<bool> {
        self.conversations.is_awaiting(user_id).await
    }

    /// Forward a user's message to the support chat.
    ///
    /// The caller has checked that the user is awaiting a support message.
    /// Only a successful send records a session and returns the user to idle.
    pub async fn submit(
        &self,
        user: &SupportUser,
        content: &InboundContent,
    ) -> Result<SupportTicket, RelayError> {
        let result = self.forward_to_support(user, content).await;
        match &result {
            Ok(ticket) => {
                observability::record_support_request("forwarded");
                info!(
                    user_id = %user.id,
                    message_id = %ticket.message_id,
                    kind = content.kind(),
                    "Support request forwarded"
                );
            }
            Err(e) => observability::record_support_request(e.kind()),
        }
        result
    }

    async fn forward_to_support(
        &self,
        user: &SupportUser,
        content: &InboundContent,
    ) -> Result<SupportTicket, RelayError> {
        let message_id = match content {
            InboundContent::Other => return Err(RelayError::UnsupportedContentKind),
            InboundContent::Text(body) => {
                let body = html::escape(&truncate_message(body, MAX_TEXT_BODY_CHARS));
                let envelope = self.support_envelope(user, &body);
                self.channel.send_text(self.support_chat, &envelope).await
            }
            InboundContent::Photo { file_id, caption } => {
                let body = self.photo_caption(caption, TEAM_LANGUAGE);
                let envelope = self.support_envelope(user, &body);
                self.channel
                    .send_photo(self.support_chat, file_id, &envelope)
                    .await
            }
        }
        .map_err(|e| {
            error_logging::log_network_error(
                &e,
                "forward_support_request",
                Some(self.support_chat.0),
                Some(user.id.0),
            );
            RelayError::from(e)
        })?;

        self.registry.record(message_id, user.id);
        let stats = self.registry.stats();
        observability::update_registry_size(stats.entries, stats.evicted);

        if let Err(e) = self.conversations.finish(user.id).await {
            // Already delivered; at worst the next message is forwarded too
            error_logging::log_internal_error(
                &e,
                "relay",
                "finish_support_request",
                Some(user.id.0),
            );
        }

        Ok(SupportTicket { message_id })
    }

    /// Send a team member's reply back to the user behind `anchor`
    pub async fn reply(
        &self,
        actor: UserId,
        anchor: Option<MessageId>,
        content: &InboundContent,
    ) -> Result<UserId, RelayError> {
        let result = self.forward_to_user(actor, anchor, content).await;
        match &result {
            Ok(user_id) => {
                observability::record_support_reply("delivered");
                info!(
                    actor = %actor,
                    user_id = %user_id,
                    kind = content.kind(),
                    "Support reply delivered"
                );
            }
            Err(e) => {
                observability::record_support_reply(e.kind());
                warn!(actor = %actor, anchor = ?anchor, reason = %e, "Support reply rejected");
            }
        }
        result
    }

    async fn forward_to_user(
        &self,
        actor: UserId,
        anchor: Option<MessageId>,
        content: &InboundContent,
    ) -> Result<UserId, RelayError> {
        if !self.is_team_member(actor) {
            return Err(RelayError::Unauthorized);
        }
        let anchor = anchor.ok_or(RelayError::NoReplyTarget)?;
        let user_id = self
            .registry
            .resolve(anchor)
            .ok_or(RelayError::UnknownSession)?;

        let language = self.language(user_id);
        let label = t_lang(&self.localization, "support-reply-label", language);
        let chat_id = ChatId::from(user_id);

        match content {
            InboundContent::Text(body) => {
                let body = truncate_message(body, MAX_TEXT_BODY_CHARS);
                let text = format!("{}\n\n{}", label, html::escape(&body));
                self.channel.send_text(chat_id, &text).await?;
            }
            InboundContent::Photo { file_id, caption } => {
                let text = format!("{}\n\n{}", label, self.photo_caption(caption, language));
                self.channel.send_photo(chat_id, file_id, &text).await?;
            }
            InboundContent::Other => {
                self.channel.send_text(chat_id, &label).await?;
            }
        }

        Ok(user_id)
    }

    /// Sessions for the operator listing; team members only
    pub fn list_sessions(&self, actor: UserId) -> Result<Vec<SessionEntry>, RelayError> {
        if !self.is_team_member(actor) {
            return Err(RelayError::Unauthorized);
        }
        Ok(self.registry.list_all())
    }

    /// Envelope posted into the support chat; `body` is already escaped
    pub fn support_envelope(&self, user: &SupportUser, body: &str) -> String {
        let label = |key: &str| t_lang(&self.localization, key, TEAM_LANGUAGE);

        let name = if user.first_name.trim().is_empty() {
            t_lang(&self.localization, "user-fallback-name", TEAM_LANGUAGE)
        } else {
            user.first_name.clone()
        };

        let mut envelope = format!(
            "{}\n\n{} <a href=\"tg://user?id={}\">{}</a>",
            label("envelope-new-request"),
            label("envelope-from"),
            user.id,
            html::escape(&name)
        );
        if let Some(username) = &user.username {
            envelope.push_str(&format!(" (@{})", html::escape(username)));
        }
        envelope.push_str(&format!(
            "\n{} <code>{}</code>\n{} {}",
            label("envelope-user-id"),
            user.id,
            label("envelope-message"),
            body
        ));
        envelope
    }

    fn photo_caption(&self, caption: &Option<String>, language: Language) -> String {
        match caption {
            Some(caption) if !caption.trim().is_empty() => {
                html::escape(&truncate_message(caption, MAX_CAPTION_BODY_CHARS))
            }
            _ => t_lang(&self.localization, "photo-attached", language),
        }
    }
}
