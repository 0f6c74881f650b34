//! Support dialogue module for tracking whether a user's next message is a support request.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::{ChatId, UserId};

use crate::errors::{AppError, AppResult};

/// Represents the conversation state of a single user
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum SupportDialogueState {
    #[default]
    Idle,
    AwaitingSupportMessage {
        requested_at: DateTime<Utc>,
    },
}

/// Type alias for our support dialogue
pub type SupportDialogue = Dialogue<SupportDialogueState, InMemStorage<SupportDialogueState>>;

/// Tracks the support dialogue of every user that talked to the bot.
///
/// Dialogues are keyed by the user's private chat, whose id equals the user id.
/// With a non-zero `request_ttl`, a user left awaiting longer than the TTL reads
/// as idle again and the stale state is dropped on the next access.
#[derive(Clone)]
pub struct ConversationTracker {
    storage: Arc<InMemStorage<SupportDialogueState>>,
    request_ttl: Option<Duration>,
}

impl ConversationTracker {
    /// Create a tracker; `request_ttl` of `None` keeps pending requests forever
    pub fn new(request_ttl: Option<Duration>) -> Self {
        Self {
            storage: InMemStorage::new(),
            request_ttl,
        }
    }

    fn dialogue(&self, user_id: UserId) -> SupportDialogue {
        SupportDialogue::new(self.storage.clone(), ChatId::from(user_id))
    }

    /// Current state of the user, with expired requests reported as idle
    pub async fn state(&self, user_id: UserId) -> AppResult<SupportDialogueState> {
        let dialogue = self.dialogue(user_id);
        let state = dialogue
            .get()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read dialogue: {}", e)))?
            .unwrap_or_default();

        if let SupportDialogueState::AwaitingSupportMessage { requested_at } = &state {
            if self.is_expired(*requested_at) {
                tracing::debug!(user_id = %user_id, "Support request prompt expired");
                self.set(user_id, SupportDialogueState::Idle).await?;
                return Ok(SupportDialogueState::Idle);
            }
        }

        Ok(state)
    }

    /// Whether the user's next private message should be forwarded to support
    pub async fn is_awaiting(&self, user_id: UserId) -> AppResult<bool> {
        Ok(matches!(
            self.state(user_id).await?,
            SupportDialogueState::AwaitingSupportMessage { .. }
        ))
    }

    /// Move the user to `AwaitingSupportMessage`
    pub async fn begin_support_request(&self, user_id: UserId) -> AppResult<()> {
        self.set(
            user_id,
            SupportDialogueState::AwaitingSupportMessage {
                requested_at: Utc::now(),
            },
        )
        .await
    }

    /// Move the user back to `Idle` after their request was forwarded
    pub async fn finish(&self, user_id: UserId) -> AppResult<()> {
        self.set(user_id, SupportDialogueState::Idle).await
    }

    async fn set(&self, user_id: UserId, state: SupportDialogueState) -> AppResult<()> {
        self.dialogue(user_id)
            .update(state)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to update dialogue: {}", e)))
    }

    fn is_expired(&self, requested_at: DateTime<Utc>) -> bool {
        match self.request_ttl {
            Some(ttl) => Utc::now() - requested_at > ttl,
            None => false,
        }
    }
}

impl Default for ConversationTracker {
    fn default() -> Self {
        Self::new(None)
    }
}
