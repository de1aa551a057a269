//! Bounded download queue.
//!
//! Downloads run one at a time: yt-dlp plus ffmpeg saturate a small host,
//! and serialized fetches avoid extractor rate limits. The queue rejects
//! duplicates (same chat, same URL, same kind) while a matching task is
//! queued or running, and rejects everything once full.

use std::collections::{HashSet, VecDeque};

use teloxide::types::{ChatId, MessageId};
use tokio::sync::Mutex;

use crate::core::config;
use crate::download::fetch::FetchRequest;
use crate::download::formats::Quality;

/// One accepted download order with everything delivery needs
#[derive(Debug, Clone)]
pub struct DownloadTask {
    pub request: FetchRequest,
    pub quality: Quality,
    pub title: String,
    pub uploader: Option<String>,
    pub user_id: i64,
    pub chat_id: ChatId,
    /// The bot's status message, edited as the task progresses
    pub status_message: MessageId,
    pub thumbnail_url: Option<String>,
    /// How long the metadata probe took, reported in the final caption
    pub probe_secs: f64,
}

impl DownloadTask {
    fn dedup_key(&self) -> String {
        format!("{}|{}|{}", self.chat_id.0, self.request.kind, self.request.url)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueError {
    Full,
    Duplicate,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<DownloadTask>,
    in_flight: HashSet<String>,
}

/// FIFO queue with an in-flight set for duplicate suppression
#[derive(Default)]
pub struct DownloadQueue {
    state: Mutex<QueueState>,
}

impl DownloadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a task and returns its 1-based queue position
    pub async fn enqueue(&self, task: DownloadTask) -> Result<usize, EnqueueError> {
        let mut state = self.state.lock().await;
        if state.pending.len() >= config::queue::MAX_QUEUE_SIZE {
            return Err(EnqueueError::Full);
        }
        let key = task.dedup_key();
        if state.in_flight.contains(&key) {
            return Err(EnqueueError::Duplicate);
        }
        state.in_flight.insert(key);
        state.pending.push_back(task);
        Ok(state.pending.len())
    }

    /// Pops the next task. The caller must call [`Self::finish`] when done,
    /// otherwise the duplicate guard stays armed for that key.
    pub async fn next(&self) -> Option<DownloadTask> {
        self.state.lock().await.pending.pop_front()
    }

    pub async fn finish(&self, task: &DownloadTask) {
        self.state.lock().await.in_flight.remove(&task.dedup_key());
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.lock().await.pending.is_empty()
    }
}
