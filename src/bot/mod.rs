//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `callbacks`: Inline keyboard callback actions and their handler
//! - `command_handlers`: `/start`, `/support`, `/about`, `/list` and unknown commands
//! - `message_handler`: Private user messages and team replies in the support chat
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callbacks;
pub mod command_handlers;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;

use anyhow::Result;
use reqwest::Url;
use teloxide::Bot;

use crate::localization::LocalizationManager;
use crate::relay::SupportRelay;

/// Shared dependencies of every handler
pub struct BotState {
    pub relay: Arc<SupportRelay<Bot>>,
    pub localization: Arc<LocalizationManager>,
    pub website: Url,
}

impl BotState {
    pub fn new(
        relay: Arc<SupportRelay<Bot>>,
        localization: Arc<LocalizationManager>,
        website_url: &str,
    ) -> Result<Self> {
        let website = Url::parse(website_url)
            .map_err(|e| anyhow::anyhow!("Invalid website URL '{}': {}", website_url, e))?;
        Ok(Self {
            relay,
            localization,
            website,
        })
    }
}

// Re-export main handler functions for use in main.rs
pub use callbacks::callback_handler::callback_handler;
pub use callbacks::CallbackAction;
pub use command_handlers::{command_handler, Command};
pub use message_handler::message_handler;
