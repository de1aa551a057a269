//! Preference persistence across process restarts (simulated by reloading
//! the store from the same file).

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use ytgram::download::formats::{MediaKind, Quality};
use ytgram::storage::prefs::PrefStore;

#[tokio::test]
async fn test_preferences_survive_reload() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("user-preferences.json");

    {
        let store = PrefStore::load(&path).unwrap();
        store.set_format(42, MediaKind::Audio).await.unwrap();
        store.set_quality(42, MediaKind::Audio, Quality::High).await.unwrap();
        store.set_format(7, MediaKind::Video).await.unwrap();
    }

    let store = PrefStore::load(&path).unwrap();
    let user42 = store.get(42).await;
    assert_eq!(user42.format, Some(MediaKind::Audio));
    assert_eq!(user42.audio_quality, Some(Quality::High));
    assert_eq!(user42.video_quality, None);

    let user7 = store.get(7).await;
    assert_eq!(user7.format, Some(MediaKind::Video));
}

#[tokio::test]
async fn test_store_file_is_readable_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("user-preferences.json");

    let store = PrefStore::load(&path).unwrap();
    store.set_format(1, MediaKind::Video).await.unwrap();
    store.set_quality(1, MediaKind::Video, Quality::Low).await.unwrap();

    // Operators hand-edit this file; it stays plain JSON with lowercase names
    let raw = fs_err::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["1"]["format"], "video");
    assert_eq!(parsed["1"]["video_quality"], "low");
}

#[tokio::test]
async fn test_latest_choice_wins() {
    let dir = tempdir().unwrap();
    let store = PrefStore::load(dir.path().join("p.json")).unwrap();

    store.set_quality(5, MediaKind::Video, Quality::High).await.unwrap();
    store.set_quality(5, MediaKind::Video, Quality::Low).await.unwrap();
    assert_eq!(store.get(5).await.video_quality, Some(Quality::Low));
}
