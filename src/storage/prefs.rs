//! Per-user format and quality preferences, persisted as JSON.
//!
//! Preferences only pre-select buttons; the user can always pick something
//! else, and the latest pick becomes the new preference.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::error::AppResult;
use crate::download::formats::{MediaKind, Quality};
use crate::storage::jsonstore::JsonStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPrefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<MediaKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_quality: Option<Quality>,
}

type PrefsMap = HashMap<i64, UserPrefs>;

pub struct PrefStore {
    store: JsonStore<PrefsMap>,
}

impl PrefStore {
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        Ok(Self {
            store: JsonStore::load(path)?,
        })
    }

    pub async fn get(&self, user_id: i64) -> UserPrefs {
        self.store.read(|m| m.get(&user_id).cloned().unwrap_or_default()).await
    }

    pub async fn set_format(&self, user_id: i64, kind: MediaKind) -> AppResult<()> {
        self.store
            .update(|m| m.entry(user_id).or_default().format = Some(kind))
            .await
    }

    pub async fn set_quality(&self, user_id: i64, kind: MediaKind, quality: Quality) -> AppResult<()> {
        self.store
            .update(|m| {
                let prefs = m.entry(user_id).or_default();
                match kind {
                    MediaKind::Video => prefs.video_quality = Some(quality),
                    MediaKind::Audio => prefs.audio_quality = Some(quality),
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_unknown_user_gets_defaults() {
        let dir = tempdir().unwrap();
        let store = PrefStore::load(dir.path().join("prefs.json")).unwrap();
        assert_eq!(store.get(123).await, UserPrefs::default());
    }

    #[tokio::test]
    async fn test_quality_is_tracked_per_kind() {
        let dir = tempdir().unwrap();
        let store = PrefStore::load(dir.path().join("prefs.json")).unwrap();

        store.set_format(1, MediaKind::Video).await.unwrap();
        store.set_quality(1, MediaKind::Video, Quality::High).await.unwrap();
        store.set_quality(1, MediaKind::Audio, Quality::Low).await.unwrap();

        let prefs = store.get(1).await;
        assert_eq!(prefs.format, Some(MediaKind::Video));
        assert_eq!(prefs.video_quality, Some(Quality::High));
        assert_eq!(prefs.audio_quality, Some(Quality::Low));
    }
}
