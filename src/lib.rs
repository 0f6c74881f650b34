//! # Support Relay Telegram Bot
//!
//! A Telegram bot that relays messages between users and a support team chat,
//! and posts order status notifications polled from the shop database.

pub mod bot;
pub mod channel;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod language;
pub mod localization;
pub mod observability;
pub mod observability_config;
pub mod orders;
pub mod poller;
pub mod registry;
pub mod relay;

// Re-export types for easier access
pub use channel::OutboundChannel;
pub use errors::{AppError, AppResult, RelayError, TransportError};
pub use language::Language;
pub use relay::{InboundContent, SupportRelay, SupportUser};
