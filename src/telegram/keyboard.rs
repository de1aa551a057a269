//! Inline keyboards and the callback-data codec.
//!
//! Callback payloads are short prefix-tagged strings (`format:video`,
//! `vq:high`, `aq:low`, `cancel`) parsed back into [`CallbackData`] by the
//! callback handler. Unknown payloads parse to `None` and are ignored.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::download::formats::{FormatTable, MediaKind, Quality, QualityMenu};
use crate::storage::prefs::UserPrefs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    Format(MediaKind),
    /// Back from the quality menu to the format menu
    FormatBack,
    VideoQuality(Quality),
    AudioQuality(Quality),
    Cancel,
}

impl CallbackData {
    pub fn encode(self) -> String {
        match self {
            CallbackData::Format(kind) => format!("format:{}", kind),
            CallbackData::FormatBack => "format:back".to_string(),
            CallbackData::VideoQuality(q) => format!("vq:{}", q),
            CallbackData::AudioQuality(q) => format!("aq:{}", q),
            CallbackData::Cancel => "cancel".to_string(),
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        if data == "cancel" {
            return Some(CallbackData::Cancel);
        }
        let (prefix, rest) = data.split_once(':')?;
        match prefix {
            "format" if rest == "back" => Some(CallbackData::FormatBack),
            "format" => rest.parse().ok().map(CallbackData::Format),
            "vq" => rest.parse().ok().map(CallbackData::VideoQuality),
            "aq" => rest.parse().ok().map(CallbackData::AudioQuality),
            _ => None,
        }
    }
}

fn preferred_suffix(is_preferred: bool) -> &'static str {
    if is_preferred {
        " (Preferred)"
    } else {
        ""
    }
}

/// First menu after a successful probe: pick video or audio
pub fn format_keyboard(table: &FormatTable, prefs: &UserPrefs) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    if !table.video.is_empty() {
        rows.push(vec![InlineKeyboardButton::callback(
            format!(
                "🎬 Video{}",
                preferred_suffix(prefs.format == Some(MediaKind::Video))
            ),
            CallbackData::Format(MediaKind::Video).encode(),
        )]);
    }
    if !table.audio.is_empty() {
        rows.push(vec![InlineKeyboardButton::callback(
            format!(
                "🎵 Audio{}",
                preferred_suffix(prefs.format == Some(MediaKind::Audio))
            ),
            CallbackData::Format(MediaKind::Audio).encode(),
        )]);
    }
    rows.push(vec![InlineKeyboardButton::callback(
        "❌ Cancel",
        CallbackData::Cancel.encode(),
    )]);

    InlineKeyboardMarkup::new(rows)
}

/// Second menu: pick a quality for the chosen kind
pub fn quality_keyboard(kind: MediaKind, menu: &QualityMenu, prefs: &UserPrefs) -> InlineKeyboardMarkup {
    let preferred = match kind {
        MediaKind::Video => prefs.video_quality,
        MediaKind::Audio => prefs.audio_quality,
    };

    let mut rows: Vec<Vec<InlineKeyboardButton>> = menu
        .iter()
        .map(|(quality, choice)| {
            let data = match kind {
                MediaKind::Video => CallbackData::VideoQuality(quality),
                MediaKind::Audio => CallbackData::AudioQuality(quality),
            };
            vec![InlineKeyboardButton::callback(
                format!(
                    "{} ({}){}",
                    quality.label(),
                    choice.label,
                    preferred_suffix(preferred == Some(quality))
                ),
                data.encode(),
            )]
        })
        .collect();

    rows.push(vec![
        InlineKeyboardButton::callback("⬅️ Back", CallbackData::FormatBack.encode()),
        InlineKeyboardButton::callback("❌ Cancel", CallbackData::Cancel.encode()),
    ]);

    InlineKeyboardMarkup::new(rows)
}
