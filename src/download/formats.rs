//! Quality menu construction from raw yt-dlp format lists.
//!
//! The bot never shows the raw format table to users. Instead it partitions
//! formats into muxed video (both codecs present) and audio-only tracks,
//! ranks them, and exposes at most three picks per kind: High, Medium, Low.
//! Duplicate picks collapse, so a source with a single usable format shows a
//! single button.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::core::error::{AppError, AppResult};
use crate::core::utils::format_file_size;
use crate::download::metadata::RawFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
    Medium,
    Low,
}

impl Quality {
    pub fn label(self) -> &'static str {
        match self {
            Quality::High => "High",
            Quality::Medium => "Medium",
            Quality::Low => "Low",
        }
    }
}

/// One selectable download target
#[derive(Debug, Clone, PartialEq)]
pub struct FormatChoice {
    pub format_id: String,
    /// Button text fragment, e.g. "1080p, 42.1 MB" or "192 kbps"
    pub label: String,
    pub filesize: Option<u64>,
}

/// Ordered quality picks for one media kind
#[derive(Debug, Clone, Default)]
pub struct QualityMenu {
    entries: Vec<(Quality, FormatChoice)>,
}

impl QualityMenu {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, quality: Quality) -> Option<&FormatChoice> {
        self.entries.iter().find(|(q, _)| *q == quality).map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quality, &FormatChoice)> {
        self.entries.iter().map(|(q, c)| (*q, c))
    }

    fn push_unique(&mut self, quality: Quality, choice: FormatChoice) {
        // A pick that resolves to an already-listed format adds no option
        if !self.entries.iter().any(|(_, c)| c.format_id == choice.format_id) {
            self.entries.push((quality, choice));
        }
    }
}

/// Quality menus for both kinds, built once per probed URL
#[derive(Debug, Clone, Default)]
pub struct FormatTable {
    pub video: QualityMenu,
    pub audio: QualityMenu,
}

#[derive(Debug, Clone)]
struct VideoCandidate {
    format_id: String,
    height: u32,
    tbr: f64,
    filesize: Option<u64>,
}

#[derive(Debug, Clone)]
struct AudioCandidate {
    format_id: String,
    abr: f64,
    filesize: Option<u64>,
}

impl FormatTable {
    /// Builds the menus. Errors only when not a single format is usable for
    /// either kind; such URLs have nothing the bot could offer.
    pub fn build(formats: &[RawFormat]) -> AppResult<Self> {
        let mut videos: Vec<VideoCandidate> = formats
            .iter()
            .filter(|f| f.has_video() && f.has_audio())
            .filter_map(|f| {
                Some(VideoCandidate {
                    format_id: f.format_id.clone()?,
                    height: f.height?,
                    tbr: f.tbr.filter(|t| *t > 0.0)?,
                    filesize: f.size_estimate(),
                })
            })
            .collect();
        videos.sort_by(|a, b| {
            b.height
                .cmp(&a.height)
                .then(b.tbr.partial_cmp(&a.tbr).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut audios: Vec<AudioCandidate> = formats
            .iter()
            .filter(|f| f.has_audio() && !f.has_video())
            .filter_map(|f| {
                Some(AudioCandidate {
                    format_id: f.format_id.clone()?,
                    abr: f.abr.filter(|a| *a > 0.0)?,
                    filesize: f.size_estimate(),
                })
            })
            .collect();
        audios.sort_by(|a, b| b.abr.partial_cmp(&a.abr).unwrap_or(std::cmp::Ordering::Equal));

        if videos.is_empty() && audios.is_empty() {
            return Err(AppError::Validation(
                "no downloadable formats with known quality".to_string(),
            ));
        }

        Ok(Self {
            video: Self::bucket_video(&videos),
            audio: Self::bucket_audio(&audios),
        })
    }

    /// High prefers 1080p+, settling for 720p+ and finally the best there
    /// is. Medium aims at the 720p neighborhood, Low at 480p and below.
    fn bucket_video(sorted: &[VideoCandidate]) -> QualityMenu {
        let mut menu = QualityMenu::default();
        let Some(best) = sorted.first() else { return menu };
        let worst = sorted.last().unwrap_or(best);

        let high = sorted
            .iter()
            .find(|v| v.height >= 1080)
            .or_else(|| sorted.iter().find(|v| v.height >= 720))
            .unwrap_or(best);
        let medium = sorted
            .iter()
            .find(|v| v.height <= 720)
            .or_else(|| sorted.iter().find(|v| v.height <= 1080))
            .unwrap_or(worst);
        let low = sorted
            .iter()
            .find(|v| v.height <= 480)
            .or_else(|| sorted.iter().find(|v| v.height <= 720))
            .unwrap_or(worst);

        menu.push_unique(Quality::High, Self::video_choice(high));
        menu.push_unique(Quality::Medium, Self::video_choice(medium));
        menu.push_unique(Quality::Low, Self::video_choice(low));
        menu
    }

    /// High wants 256 kbps or better, Medium the 128..256 band, Low the
    /// best pick at or under 128 kbps. Each bucket falls back to the one
    /// above it; the dedup then collapses identical picks.
    fn bucket_audio(sorted: &[AudioCandidate]) -> QualityMenu {
        let mut menu = QualityMenu::default();
        let Some(best) = sorted.first() else { return menu };

        let high = sorted.iter().find(|a| a.abr >= 256.0).unwrap_or(best);
        let medium = sorted
            .iter()
            .find(|a| a.abr >= 128.0 && a.abr < 256.0)
            .unwrap_or(high);
        let low = sorted.iter().find(|a| a.abr <= 128.0).unwrap_or(medium);

        menu.push_unique(Quality::High, Self::audio_choice(high));
        menu.push_unique(Quality::Medium, Self::audio_choice(medium));
        menu.push_unique(Quality::Low, Self::audio_choice(low));
        menu
    }

    fn video_choice(v: &VideoCandidate) -> FormatChoice {
        let label = match v.filesize {
            Some(size) => format!("{}p, {}", v.height, format_file_size(size)),
            None => format!("{}p", v.height),
        };
        FormatChoice {
            format_id: v.format_id.clone(),
            label,
            filesize: v.filesize,
        }
    }

    fn audio_choice(a: &AudioCandidate) -> FormatChoice {
        let label = match a.filesize {
            Some(size) => format!("{} kbps, {}", a.abr.round() as u32, format_file_size(size)),
            None => format!("{} kbps", a.abr.round() as u32),
        };
        FormatChoice {
            format_id: a.format_id.clone(),
            label,
            filesize: a.filesize,
        }
    }

    pub fn menu(&self, kind: MediaKind) -> &QualityMenu {
        match kind {
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }

    pub fn choice(&self, kind: MediaKind, quality: Quality) -> Option<&FormatChoice> {
        self.menu(kind).get(quality)
    }
}
