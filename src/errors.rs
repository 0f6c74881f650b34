//! # Application Error Types
//!
//! This module defines the error types used throughout the support relay bot.
//! `AppError` covers infrastructure failures (configuration, database, network),
//! while `RelayError` is the closed set of outcomes a relay operation can be
//! rejected with.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (identifiers, inputs, etc.)
    Validation(String),
    /// Database operation errors
    Database(String),
    /// Network/communication errors
    Network(String),
    /// Internal application errors
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Database(msg) => write!(f, "[DATABASE] {}", msg),
            AppError::Network(msg) => write!(f, "[NETWORK] {}", msg),
            AppError::Internal(msg) => write!(f, "[INTERNAL] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<TransportError> for AppError {
    fn from(err: TransportError) -> Self {
        AppError::Network(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Failure reported by the outbound messaging transport
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError(pub String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport failure: {}", self.0)
    }
}

impl std::error::Error for TransportError {}

impl From<teloxide::RequestError> for TransportError {
    fn from(err: teloxide::RequestError) -> Self {
        TransportError(err.to_string())
    }
}

/// Reasons a relay operation can be rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RelayError {
    /// The user sent something other than text or a photo while a submission was expected
    UnsupportedContentKind,
    /// The actor is not a member of the support team
    Unauthorized,
    /// The support message does not reply to another message
    NoReplyTarget,
    /// The anchor message is not a known support session
    UnknownSession,
    /// The outbound send failed
    Transport(TransportError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::UnsupportedContentKind => write!(f, "unsupported content kind"),
            RelayError::Unauthorized => write!(f, "actor is not a support team member"),
            RelayError::NoReplyTarget => write!(f, "support message is not a reply"),
            RelayError::UnknownSession => write!(f, "anchor message has no support session"),
            RelayError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RelayError {}

impl From<TransportError> for RelayError {
    fn from(err: TransportError) -> Self {
        RelayError::Transport(err)
    }
}

impl RelayError {
    /// Short label used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::UnsupportedContentKind => "unsupported_content",
            RelayError::Unauthorized => "unauthorized",
            RelayError::NoReplyTarget => "no_reply_target",
            RelayError::UnknownSession => "unknown_session",
            RelayError::Transport(_) => "transport_failure",
        }
    }
}

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log database operation errors with contextual information
    pub fn log_database_error(
        error: &impl std::fmt::Display,
        operation: &str,
        additional_context: Option<&[(&str, &dyn std::fmt::Display)]>,
    ) {
        let additional_context = additional_context.map(|ctx| {
            ctx.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ")
        });
        error!(
            error = %error,
            operation = %operation,
            additional_context = ?additional_context,
            "Database operation failed"
        );
    }

    /// Log network/communication errors with connection context
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
        user_id: Option<u64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            user_id = ?user_id,
            "Network operation failed"
        );
    }

    /// Log internal application errors with component context
    pub fn log_internal_error(
        error: &impl std::fmt::Display,
        component: &str,
        operation: &str,
        user_id: Option<u64>,
    ) {
        error!(
            error = %error,
            component = %component,
            operation = %operation,
            user_id = ?user_id,
            "Internal application error"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(
        error: &impl std::fmt::Display,
        config_key: &str,
        operation: &str,
    ) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}
