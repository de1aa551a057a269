//! ytgram - Telegram bot for downloading media via yt-dlp
//!
//! This library holds all bot functionality, organized into focused modules:
//! - `core` - configuration, errors, logging, activity trail, external clients
//! - `download` - yt-dlp probing, quality bucketing, fetching, queueing
//! - `storage` - JSON-file-backed user preferences
//! - `telegram` - bot setup, dispatcher schema, handlers, media delivery
//! - `panel` - read-only admin web panel

pub mod cli;
pub mod core;
pub mod download;
pub mod panel;
pub mod storage;
pub mod telegram;

pub use crate::core::error::{AppError, AppResult};
