//! Whitelist rejection flow.
//!
//! A denied user gets a (translated) refusal, the admin gets the original
//! message forwarded quietly, and the offending message is marked with a
//! reaction so it stands out in the chat history.

use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, ReactionType};

use super::types::{HandlerDeps, UserInfo};
use crate::core::config;

const DENIED_MESSAGE: &str =
    "🚫 Sorry, this bot is private. Your request was forwarded to the owner, \
     who may grant you access.";

/// Full refusal flow for a non-whitelisted sender
pub async fn deny_user(bot: &Bot, msg: &Message, deps: &HandlerDeps) {
    let user = UserInfo::from_message(msg);
    log::warn!("denied user {} ({})", user.display(), user.user_id);

    let text = deps.translator.translate(DENIED_MESSAGE, user.lang()).await;
    if let Err(e) = bot
        .send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .await
    {
        log::warn!("failed to send denial to {}: {}", msg.chat.id, e);
    }

    if let Some(admin_id) = *config::ADMIN_ID {
        let forward = bot
            .forward_message(ChatId(admin_id), msg.chat.id, msg.id)
            .disable_notification(true)
            .await;
        if let Err(e) = forward {
            log::warn!("failed to forward denied message to admin: {}", e);
        }
    }

    let reaction = bot
        .set_message_reaction(msg.chat.id, msg.id)
        .reaction(vec![ReactionType::Emoji {
            emoji: "🖕".to_string(),
        }])
        .await;
    if let Err(e) = reaction {
        // Reactions are unavailable in some chats; not worth surfacing
        log::debug!("could not set denial reaction: {}", e);
    }
}

/// Plain-text admin notification, fire and forget
pub async fn notify_admin(bot: &Bot, text: &str) {
    if let Some(admin_id) = *config::ADMIN_ID {
        if let Err(e) = bot
            .send_message(ChatId(admin_id), text)
            .disable_notification(true)
            .await
        {
            log::warn!("failed to notify admin: {}", e);
        }
    }
}
