//! In-flight download sessions, one per chat.
//!
//! A session is created when a probe succeeds and the format keyboard goes
//! out, and removed on cancel, on delivery, or when a new URL replaces it.
//! Callback taps arriving after removal get the "session expired" reply.

use dashmap::DashMap;
use teloxide::types::{ChatId, MessageId};

use crate::download::formats::FormatTable;

#[derive(Debug, Clone)]
pub struct DownloadSession {
    pub url: String,
    pub title: String,
    pub uploader: Option<String>,
    pub thumbnail_url: Option<String>,
    pub formats: FormatTable,
    /// The bot's menu/status message being edited through the flow
    pub menu_message: MessageId,
    /// How long the metadata probe took, carried into the final caption
    pub probe_secs: f64,
}

#[derive(Default)]
pub struct Sessions {
    inner: DashMap<ChatId, DownloadSession>,
}

impl Sessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, chat: ChatId, session: DownloadSession) {
        self.inner.insert(chat, session);
    }

    pub fn get(&self, chat: ChatId) -> Option<DownloadSession> {
        self.inner.get(&chat).map(|s| s.clone())
    }

    pub fn remove(&self, chat: ChatId) -> Option<DownloadSession> {
        self.inner.remove(&chat).map(|(_, s)| s)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
