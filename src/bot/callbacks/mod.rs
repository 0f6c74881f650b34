//! Callbacks module for handling inline keyboard callback queries
//!
//! - `callback_handler`: Routes a callback query to the matching action
//! - `callback_types`: The closed set of actions a button can carry

pub mod callback_handler;
pub mod callback_types;

pub use callback_types::CallbackAction;
