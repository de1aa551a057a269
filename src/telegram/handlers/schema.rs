//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;

use super::callbacks::handle_callback;
use super::commands::{handle_help, handle_start};
use super::messages::handle_text_message;
use super::types::{HandlerDeps, HandlerError};
use crate::core::config;
use crate::telegram::bot::{is_message_addressed_to_bot, Command};

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Returns a handler tree for teloxide's Dispatcher. The same schema is
/// used in production and in integration tests.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callbacks = deps;

    dptree::entry()
        .branch(command_handler(deps_commands))
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callbacks))
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter_command::<Command>()
        .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                let result = match cmd {
                    Command::Start => handle_start(&bot, &msg, &deps).await,
                    Command::Help => handle_help(&bot, &msg, &deps).await,
                };
                if let Err(e) = result {
                    log::error!("command handler failed in chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_filter = deps.clone();
    Update::filter_message()
        .filter(move |msg: Message| {
            if msg.text().is_none() {
                return false;
            }
            let addressed = is_message_addressed_to_bot(
                &msg,
                deps_filter.bot_username.as_deref(),
                deps_filter.bot_id,
            );
            // Group traffic is ignored entirely unless enabled
            addressed && (msg.chat.is_private() || *config::ALLOW_GROUPS)
        })
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_text_message(&bot, &msg, &deps).await {
                    log::error!("message handler failed in chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            if let Err(e) = handle_callback(&bot, &q, &deps).await {
                log::error!("callback handler failed: {}", e);
            }
            Ok(())
        }
    })
}
