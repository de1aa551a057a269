//! Bot initialization and message addressing.
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation (stock or self-hosted Bot API server)
//! - Message addressing logic for group chats (mentions, replies)

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::types::{ChatKind, MessageEntityKind, UserId};
use teloxide::utils::command::BotCommands;

use crate::core::config;
use crate::core::error::AppResult;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "I can:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
}

/// Creates a Bot instance against the stock or a self-hosted Bot API server
///
/// Uploads of large video files over slow links take a while; the HTTP
/// client timeout has to cover a full upload, not a single round trip.
pub fn create_bot() -> AppResult<Bot> {
    let client = ClientBuilder::new()
        .timeout(config::network::telegram_timeout())
        .connect_timeout(config::network::connect_timeout())
        .build()?;

    let bot = Bot::with_client(config::BOT_TOKEN.clone(), client);
    let bot = if let Some(root) = config::TELEGRAM_API_ROOT.as_deref() {
        log::info!("using custom Bot API server: {}", root);
        let url = url::Url::parse(root)?;
        bot.set_api_url(url)
    } else {
        bot
    };

    Ok(bot)
}

/// Registers the command list shown in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> AppResult<()> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}

/// Checks if a message is addressed to the bot
///
/// Private chats always are. In groups, only replies to the bot and
/// messages mentioning @username count.
pub fn is_message_addressed_to_bot(msg: &Message, bot_username: Option<&str>, bot_id: UserId) -> bool {
    if matches!(msg.chat.kind, ChatKind::Private(_)) {
        return true;
    }

    if let Some(reply_to) = msg.reply_to_message() {
        if let Some(from) = &reply_to.from {
            if from.id == bot_id {
                return true;
            }
        }
    }

    if let (Some(text), Some(entities)) = (msg.text(), msg.entities()) {
        // Entity offsets are UTF-16 code units, not byte indices; slicing
        // the str directly panics on text with emoji before the mention.
        let utf16: Vec<u16> = text.encode_utf16().collect();
        for entity in entities {
            if matches!(entity.kind, MessageEntityKind::Mention) {
                let end = (entity.offset + entity.length).min(utf16.len());
                let start = entity.offset.min(end);
                let mention = String::from_utf16_lossy(&utf16[start..end]);
                let mention_username = mention.strip_prefix('@').unwrap_or(&mention);
                if let Some(username) = bot_username {
                    if mention_username.eq_ignore_ascii_case(username) {
                        return true;
                    }
                }
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group_message(text: &str, offset: usize, length: usize) -> Message {
        serde_json::from_value(serde_json::json!({
            "message_id": 1,
            "date": 1700000000,
            "chat": { "id": -100123, "type": "supergroup", "title": "group" },
            "from": { "id": 5, "is_bot": false, "first_name": "A" },
            "text": text,
            "entities": [ { "type": "mention", "offset": offset, "length": length } ]
        }))
        .unwrap()
    }

    #[test]
    fn test_mention_after_emoji_is_matched() {
        // "Hi 👋 @testbot": the emoji is two UTF-16 units, so the mention
        // starts at 6 in entity coordinates but at byte 7 in the str.
        let msg = group_message("Hi 👋 @testbot", 6, 8);
        assert!(is_message_addressed_to_bot(&msg, Some("testbot"), UserId(42)));
        assert!(!is_message_addressed_to_bot(&msg, Some("otherbot"), UserId(42)));
    }

    #[test]
    fn test_out_of_range_entity_does_not_panic() {
        let msg = group_message("@x", 0, 99);
        assert!(!is_message_addressed_to_bot(&msg, Some("testbot"), UserId(42)));
    }

    #[test]
    fn test_command_descriptions() {
        let commands = Command::descriptions();
        let command_list = format!("{}", commands);

        assert!(command_list.contains("I can"));
        assert!(command_list.contains("start"));
        assert!(command_list.contains("help"));
    }
}
