//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the Telegram bot.
//! The handlers are organized in a testable way, allowing integration tests
//! to use the same handler tree as production code.

mod access;
mod callbacks;
mod commands;
mod messages;
mod schema;
mod types;

pub use access::notify_admin;
pub use schema::schema;
pub use types::{is_whitelisted, HandlerDeps, HandlerError, UserInfo};
