//! URL message flow: validate, probe, offer formats.

use std::time::Instant;

use teloxide::prelude::*;
use teloxide::types::ParseMode;

use super::access::deny_user;
use super::types::{is_whitelisted, HandlerDeps, UserInfo};
use crate::core::activity::ActivityKind;
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::utils::{extract_url, strip_hashtags_mentions};
use crate::download::formats::FormatTable;
use crate::download::metadata;
use crate::telegram::html;
use crate::telegram::keyboard::format_keyboard;
use crate::telegram::session::DownloadSession;

const NO_URL_REMINDER: &str = "Send me a link to a video or track and I'll download it for you.";

pub async fn handle_text_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let user = UserInfo::from_message(msg);

    if !is_whitelisted(user.user_id) {
        deny_user(bot, msg, deps).await;
        return Ok(());
    }

    let text = msg.text().unwrap_or_default();
    let Some(url) = extract_url(text) else {
        let reminder = deps.translator.translate(NO_URL_REMINDER, user.lang()).await;
        bot.send_message(msg.chat.id, reminder).await?;
        return Ok(());
    };

    if url.len() > config::validation::MAX_URL_LENGTH {
        bot.send_message(msg.chat.id, "That link is too long to be a valid media URL.")
            .await?;
        return Ok(());
    }
    // Reject things the regex caught that still are not fetchable URLs
    let parsed = url::Url::parse(url)?;
    let url = parsed.as_str().to_string();

    record(deps, ActivityKind::UrlRequest, &user, &[("url", &url)]).await;

    let status = bot
        .send_message(msg.chat.id, "⏳ Fetching media info...")
        .await?;

    if deps.cobalt.matches_url(&url).await {
        log::info!("cobalt instance covers {}, still probing via yt-dlp", url);
    }

    let probe_started = Instant::now();
    let info = match metadata::probe(&url).await {
        Ok(info) => info,
        Err(e) => {
            record(deps, ActivityKind::ProcessingError, &user, &[("url", &url), ("error", &e.to_string())]).await;
            bot.edit_message_text(
                msg.chat.id,
                status.id,
                format!("❌ Could not read that link:\n<code>{}</code>", html::escape(&e.to_string())),
            )
            .parse_mode(ParseMode::Html)
            .await?;
            return Ok(());
        }
    };
    let probe_secs = probe_started.elapsed().as_secs_f64();

    let table = match FormatTable::build(&info.formats) {
        Ok(table) => table,
        Err(e) => {
            record(deps, ActivityKind::ProcessingError, &user, &[("url", &url), ("error", &e.to_string())]).await;
            bot.edit_message_text(msg.chat.id, status.id, "❌ No downloadable formats found for that link.")
                .await?;
            return Ok(());
        }
    };

    // Social titles are mostly tag soup; drop the tags before the title
    // shows up in menus and captions.
    let mut title = strip_hashtags_mentions(&info.display_title());
    if title.is_empty() {
        title = info.display_title();
    }
    record(
        deps,
        ActivityKind::VideoInfo,
        &user,
        &[
            ("url", &url),
            ("title", &title),
            ("extractor", info.extractor.as_deref().unwrap_or("unknown")),
        ],
    )
    .await;

    let prefs = deps.prefs.get(user.user_id).await;
    let session = DownloadSession {
        url,
        title: title.clone(),
        uploader: info.uploader.clone(),
        thumbnail_url: info.pick_thumbnail().map(|t| t.url.clone()),
        formats: table.clone(),
        menu_message: status.id,
        probe_secs,
    };
    deps.sessions.insert(msg.chat.id, session);

    bot.edit_message_text(
        msg.chat.id,
        status.id,
        format!("🎞 {}\n\nWhat should I download?", html::bold(&html::escape(&title))),
    )
    .parse_mode(ParseMode::Html)
    .reply_markup(format_keyboard(&table, &prefs))
    .await?;

    Ok(())
}

pub(super) async fn record(deps: &HandlerDeps, kind: ActivityKind, user: &UserInfo, fields: &[(&str, &str)]) {
    if let Err(e) = deps.activity.record(kind, user.user_id, fields).await {
        log::warn!("failed to record activity: {}", e);
    }
}
