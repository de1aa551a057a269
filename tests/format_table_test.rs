//! End-to-end checks of the probe-to-keyboard pipeline: a realistic yt-dlp
//! info dump goes through deserialization, quality bucketing and keyboard
//! construction.

use pretty_assertions::assert_eq;

use ytgram::download::formats::{FormatTable, MediaKind, Quality};
use ytgram::download::metadata::VideoInfo;
use ytgram::storage::prefs::UserPrefs;
use ytgram::telegram::keyboard::{format_keyboard, quality_keyboard, CallbackData};

/// Trimmed but structurally faithful `yt-dlp -j` output for a YouTube video
const YOUTUBE_DUMP: &str = r#"{
    "id": "dQw4w9WgXcQ",
    "title": "Never Gonna Give You Up #music @rick",
    "uploader": "Rick Astley",
    "duration": 212.0,
    "webpage_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
    "extractor": "youtube",
    "thumbnails": [
        { "url": "https://i.ytimg.com/default.jpg", "width": 120, "height": 90 },
        { "url": "https://i.ytimg.com/mq.jpg", "width": 320, "height": 180 },
        { "url": "https://i.ytimg.com/max.jpg", "width": 1280, "height": 720 }
    ],
    "formats": [
        { "format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none" },
        { "format_id": "249", "ext": "webm", "vcodec": "none", "acodec": "opus",
          "abr": 47.6, "filesize": 1300000 },
        { "format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2",
          "abr": 129.5, "filesize": 3400000 },
        { "format_id": "251", "ext": "webm", "vcodec": "none", "acodec": "opus",
          "abr": 274.6, "filesize": 3900000 },
        { "format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2",
          "height": 360, "tbr": 545.4, "filesize": 14500000 },
        { "format_id": "22", "ext": "mp4", "vcodec": "avc1.64001F", "acodec": "mp4a.40.2",
          "height": 720, "tbr": 1342.1, "filesize_approx": 35600000.0 },
        { "format_id": "137+140", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "mp4a.40.2",
          "height": 1080, "tbr": 4500.2, "filesize_approx": 119000000.0 },
        { "format_id": "248", "ext": "webm", "vcodec": "vp9", "acodec": "none",
          "height": 1080, "tbr": 2200.0 }
    ]
}"#;

fn table() -> FormatTable {
    let info: VideoInfo = serde_json::from_str(YOUTUBE_DUMP).unwrap();
    FormatTable::build(&info.formats).unwrap()
}

#[test]
fn test_video_ladder_from_dump() {
    let table = table();
    assert_eq!(table.video.get(Quality::High).unwrap().format_id, "137+140");
    assert_eq!(table.video.get(Quality::Medium).unwrap().format_id, "22");
    // Nothing at or below 480p except 360p
    assert_eq!(table.video.get(Quality::Low).unwrap().format_id, "18");
}

#[test]
fn test_audio_ladder_from_dump() {
    let table = table();
    assert_eq!(table.audio.get(Quality::High).unwrap().format_id, "251");
    assert_eq!(table.audio.get(Quality::Medium).unwrap().format_id, "140");
    assert_eq!(table.audio.get(Quality::Low).unwrap().format_id, "249");
}

#[test]
fn test_storyboard_and_video_only_streams_excluded() {
    let table = table();
    for (_, choice) in table.video.iter() {
        assert_ne!(choice.format_id, "248");
        assert_ne!(choice.format_id, "sb0");
    }
    for (_, choice) in table.audio.iter() {
        assert_ne!(choice.format_id, "sb0");
    }
}

#[test]
fn test_thumbnail_selection_from_dump() {
    let info: VideoInfo = serde_json::from_str(YOUTUBE_DUMP).unwrap();
    assert_eq!(info.pick_thumbnail().unwrap().url, "https://i.ytimg.com/mq.jpg");
}

#[test]
fn test_keyboard_buttons_roundtrip_through_callback_codec() {
    let table = table();
    let prefs = UserPrefs::default();

    let format_kb = format_keyboard(&table, &prefs);
    let quality_kb = quality_keyboard(MediaKind::Video, &table.video, &prefs);

    for button in format_kb.inline_keyboard.iter().flatten().chain(quality_kb.inline_keyboard.iter().flatten()) {
        let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind else {
            panic!("unexpected non-callback button: {:?}", button);
        };
        assert!(
            CallbackData::parse(data).is_some(),
            "button payload {:?} does not parse",
            data
        );
    }
}

#[test]
fn test_preferred_quality_is_marked() {
    let table = table();
    let prefs = UserPrefs {
        format: Some(MediaKind::Video),
        video_quality: Some(Quality::Medium),
        ..Default::default()
    };

    let quality_kb = quality_keyboard(MediaKind::Video, &table.video, &prefs);
    let marked: Vec<&str> = quality_kb
        .inline_keyboard
        .iter()
        .flatten()
        .filter(|b| b.text.ends_with("(Preferred)"))
        .map(|b| b.text.as_str())
        .collect();
    assert_eq!(marked.len(), 1);
    assert!(marked[0].starts_with("Medium"));
}
