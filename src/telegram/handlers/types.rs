//! Handler types, dependencies, and whitelist helpers

use std::sync::Arc;

use teloxide::prelude::*;

use crate::core::activity::ActivityLog;
use crate::core::cobalt::CobaltClient;
use crate::core::config;
use crate::core::translate::Translator;
use crate::download::queue::DownloadQueue;
use crate::storage::prefs::PrefStore;
use crate::telegram::session::Sessions;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub prefs: Arc<PrefStore>,
    pub sessions: Arc<Sessions>,
    pub queue: Arc<DownloadQueue>,
    pub translator: Arc<Translator>,
    pub cobalt: Arc<CobaltClient>,
    pub activity: Arc<ActivityLog>,
    pub bot_username: Option<String>,
    pub bot_id: UserId,
}

/// User info extracted once per update for logging and admin notifications
#[derive(Clone)]
pub struct UserInfo {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language_code: Option<String>,
}

impl UserInfo {
    pub fn from_message(msg: &Message) -> Self {
        Self {
            user_id: msg
                .from
                .as_ref()
                .and_then(|u| i64::try_from(u.id.0).ok())
                .unwrap_or(msg.chat.id.0),
            username: msg.from.as_ref().and_then(|u| u.username.clone()),
            first_name: msg.from.as_ref().map(|u| u.first_name.clone()),
            language_code: msg.from.as_ref().and_then(|u| u.language_code.clone()),
        }
    }

    pub fn lang(&self) -> &str {
        self.language_code.as_deref().unwrap_or("en")
    }

    /// "@name" when a username exists, the numeric id otherwise
    pub fn display(&self) -> String {
        match &self.username {
            Some(name) => format!("@{}", name),
            None => self.user_id.to_string(),
        }
    }
}

/// An empty whitelist opens the bot to everyone
pub fn is_whitelisted(user_id: i64) -> bool {
    config::WHITELISTED_IDS.is_empty() || config::WHITELISTED_IDS.contains(&user_id)
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_empty_whitelist_allows_anyone() {
        // WHITELISTED_IDS is unset in the test environment
        assert!(super::is_whitelisted(123456));
    }
}
