//! /start and /help command handlers

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::access::{deny_user, notify_admin};
use super::types::{is_whitelisted, HandlerDeps, UserInfo};
use crate::core::error::AppResult;

const WELCOME: &str = "👋 Hi! Send me a link to a video and I'll download it for you.\n\n\
    I understand YouTube, TikTok, Instagram, Twitter/X, SoundCloud and \
    everything else yt-dlp supports.\n\n\
    After a link I'll show the available formats, you pick video or audio \
    and a quality, and the file lands right here in the chat.";

const HELP: &str = "<b>How to use this bot</b>\n\n\
    1. Send a link to a video or track.\n\
    2. Pick <b>Video</b> or <b>Audio</b>.\n\
    3. Pick a quality. Your last choice is remembered and marked as \
    <i>(Preferred)</i> next time.\n\n\
    Videos arrive as mp4, audio as mp3 (192 kbps). Photo slide posts are \
    packed into a zip archive.\n\n\
    Files are limited to 50 MB by the Telegram Bot API.";

pub async fn handle_start(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let user = UserInfo::from_message(msg);

    if !is_whitelisted(user.user_id) {
        notify_admin(
            bot,
            &format!("🚪 unauthorized /start from {} ({})", user.display(), user.user_id),
        )
        .await;
        deny_user(bot, msg, deps).await;
        return Ok(());
    }

    let text = deps.translator.translate(WELCOME, user.lang()).await;
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub async fn handle_help(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let user = UserInfo::from_message(msg);

    if !is_whitelisted(user.user_id) {
        deny_user(bot, msg, deps).await;
        return Ok(());
    }

    bot.send_message(msg.chat.id, HELP)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
