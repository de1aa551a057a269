//! Inline keyboard callback flow: format pick, quality pick, cancel.

use teloxide::prelude::*;
use teloxide::types::{ChatId, MessageId, ParseMode};

use super::messages::record;
use super::types::{is_whitelisted, HandlerDeps, UserInfo};
use crate::core::activity::ActivityKind;
use crate::core::error::AppResult;
use crate::download::fetch::FetchRequest;
use crate::download::formats::{MediaKind, Quality};
use crate::download::queue::{DownloadTask, EnqueueError};
use crate::telegram::html;
use crate::telegram::keyboard::{format_keyboard, quality_keyboard, CallbackData};
use crate::telegram::session::DownloadSession;

const SESSION_EXPIRED: &str = "⌛️ This menu has expired. Send the link again.";
const CALLBACK_DENIED: &str = "🚫 Sorry, this bot is private.";

fn user_from_query(q: &CallbackQuery) -> UserInfo {
    UserInfo {
        user_id: i64::try_from(q.from.id.0).unwrap_or(0),
        username: q.from.username.clone(),
        first_name: Some(q.from.first_name.clone()),
        language_code: q.from.language_code.clone(),
    }
}

pub async fn handle_callback(bot: &Bot, q: &CallbackQuery, deps: &HandlerDeps) -> AppResult<()> {
    let user = user_from_query(q);

    // Anyone in a group can tap a keyboard, not just whoever requested it
    if !is_whitelisted(user.user_id) {
        log::warn!("denied callback from {} ({})", user.display(), user.user_id);
        let denial = deps.translator.translate(CALLBACK_DENIED, user.lang()).await;
        bot.answer_callback_query(q.id.clone())
            .text(denial)
            .show_alert(true)
            .await?;
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;

    let Some(data) = q.data.as_deref().and_then(CallbackData::parse) else {
        return Ok(());
    };
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    record(
        deps,
        ActivityKind::ButtonSelection,
        &user,
        &[("button", &q.data.clone().unwrap_or_default())],
    )
    .await;

    match data {
        CallbackData::Cancel => {
            deps.sessions.remove(chat_id);
            bot.edit_message_text(chat_id, message_id, "❌ Cancelled.").await?;
        }
        CallbackData::FormatBack => {
            let Some(session) = deps.sessions.get(chat_id) else {
                return expired(bot, chat_id, message_id).await;
            };
            let prefs = deps.prefs.get(user.user_id).await;
            bot.edit_message_text(
                chat_id,
                message_id,
                format!(
                    "🎞 {}\n\nWhat should I download?",
                    html::bold(&html::escape(&session.title))
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(format_keyboard(&session.formats, &prefs))
            .await?;
        }
        CallbackData::Format(kind) => {
            let Some(session) = deps.sessions.get(chat_id) else {
                return expired(bot, chat_id, message_id).await;
            };
            deps.prefs.set_format(user.user_id, kind).await?;
            record(deps, ActivityKind::FormatPreference, &user, &[("format", &kind.to_string())]).await;

            let prefs = deps.prefs.get(user.user_id).await;
            let menu = session.formats.menu(kind);
            if menu.is_empty() {
                bot.edit_message_text(chat_id, message_id, format!("No {} formats available here.", kind))
                    .reply_markup(format_keyboard(&session.formats, &prefs))
                    .await?;
                return Ok(());
            }
            bot.edit_message_text(
                chat_id,
                message_id,
                format!(
                    "🎞 {}\n\nPick a {} quality:",
                    html::bold(&html::escape(&session.title)),
                    kind
                ),
            )
            .parse_mode(ParseMode::Html)
            .reply_markup(quality_keyboard(kind, menu, &prefs))
            .await?;
        }
        CallbackData::VideoQuality(quality) => {
            enqueue_pick(bot, deps, &user, chat_id, message_id, MediaKind::Video, quality).await?;
        }
        CallbackData::AudioQuality(quality) => {
            enqueue_pick(bot, deps, &user, chat_id, message_id, MediaKind::Audio, quality).await?;
        }
    }

    Ok(())
}

async fn expired(bot: &Bot, chat_id: ChatId, message_id: MessageId) -> AppResult<()> {
    bot.edit_message_text(chat_id, message_id, SESSION_EXPIRED).await?;
    Ok(())
}

async fn enqueue_pick(
    bot: &Bot,
    deps: &HandlerDeps,
    user: &UserInfo,
    chat_id: ChatId,
    message_id: MessageId,
    kind: MediaKind,
    quality: Quality,
) -> AppResult<()> {
    let Some(session) = deps.sessions.get(chat_id) else {
        return expired(bot, chat_id, message_id).await;
    };
    let Some(choice) = session.formats.choice(kind, quality).cloned() else {
        return expired(bot, chat_id, message_id).await;
    };

    deps.prefs.set_quality(user.user_id, kind, quality).await?;
    record(
        deps,
        ActivityKind::FormatPreference,
        user,
        &[("format", &kind.to_string()), ("quality", &quality.to_string())],
    )
    .await;

    let task = DownloadTask {
        request: FetchRequest {
            url: session.url.clone(),
            kind,
            format_id: choice.format_id.clone(),
            chat_id: chat_id.0,
        },
        quality,
        title: session.title.clone(),
        uploader: session.uploader.clone(),
        user_id: user.user_id,
        chat_id,
        status_message: message_id,
        thumbnail_url: session.thumbnail_url.clone(),
        probe_secs: session.probe_secs,
    };

    match deps.queue.enqueue(task).await {
        Ok(position) => {
            deps.sessions.remove(chat_id);
            record(
                deps,
                ActivityKind::DownloadStart,
                user,
                &[
                    ("url", &session.url),
                    ("format", &kind.to_string()),
                    ("quality", &quality.to_string()),
                ],
            )
            .await;
            let status = if position <= 1 {
                "⏬ Downloading...".to_string()
            } else {
                format!("⏬ Queued at position {}...", position)
            };
            bot.edit_message_text(chat_id, message_id, status).await?;
        }
        Err(EnqueueError::Duplicate) => {
            bot.edit_message_text(chat_id, message_id, "This download is already in progress.")
                .await?;
        }
        Err(EnqueueError::Full) => {
            bot.edit_message_text(
                chat_id,
                message_id,
                "😮‍💨 The download queue is full right now. Try again in a few minutes.",
            )
            .await?;
        }
    }

    Ok(())
}
