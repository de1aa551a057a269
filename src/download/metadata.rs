//! Metadata probing via `yt-dlp -j`.
//!
//! One probe per URL request: spawn yt-dlp, parse the single-line JSON dump
//! into [`VideoInfo`], and hand the format list to the quality bucketing.

use std::process::Stdio;

use serde::Deserialize;
use tokio::process::Command;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

/// One entry of yt-dlp's `formats` array. Fields the bucketing does not
/// consult are simply not deserialized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFormat {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub filesize: Option<u64>,
    #[serde(default)]
    pub filesize_approx: Option<f64>,
    #[serde(default)]
    pub format_note: Option<String>,
}

impl RawFormat {
    /// yt-dlp reports an absent codec as the literal string "none"
    pub fn has_video(&self) -> bool {
        matches!(&self.vcodec, Some(c) if c != "none" && !c.is_empty())
    }

    pub fn has_audio(&self) -> bool {
        matches!(&self.acodec, Some(c) if c != "none" && !c.is_empty())
    }

    /// Exact size when known, yt-dlp's estimate otherwise
    pub fn size_estimate(&self) -> Option<u64> {
        self.filesize
            .or_else(|| self.filesize_approx.map(|s| s.max(0.0) as u64))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Thumbnail {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// The subset of `yt-dlp -j` output the bot consumes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

impl VideoInfo {
    pub fn display_title(&self) -> String {
        self.title.clone().unwrap_or_else(|| "Untitled".to_string())
    }

    /// Largest thumbnail whose sides both fit Telegram's 320px limit
    pub fn pick_thumbnail(&self) -> Option<&Thumbnail> {
        let max = config::thumbnails::MAX_SIDE;
        self.thumbnails
            .iter()
            .filter(|t| t.width.map_or(false, |w| w <= max) && t.height.map_or(true, |h| h <= max))
            .max_by_key(|t| t.width.unwrap_or(0))
    }
}

/// TikTok's web API needs pinned extractor args or it serves watermarked
/// renditions and empty format lists.
const TIKTOK_EXTRACTOR_ARGS: &str =
    "tiktok:api_hostname=api16-normal-c-useast1a.tiktokv.com;app_info=7355728856979392262";

/// Shared yt-dlp argument prefix (cookies, noise suppression, per-site args)
pub fn base_args(url: &str) -> Vec<String> {
    let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];
    let cookies = config::cookies_file();
    if cookies.exists() {
        args.push("--cookies".to_string());
        args.push(cookies.display().to_string());
    }
    if url.contains("tiktok.com") {
        args.push("--extractor-args".to_string());
        args.push(TIKTOK_EXTRACTOR_ARGS.to_string());
    }
    args
}

/// Runs `yt-dlp -j <url>` with a timeout and parses the info JSON
pub async fn probe(url: &str) -> AppResult<VideoInfo> {
    let mut cmd = Command::new(config::YTDL_BIN.as_str());
    cmd.arg("-j").args(base_args(url)).arg(url);
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = tokio::time::timeout(config::timeouts::probe(), cmd.output())
        .await
        .map_err(|_| AppError::Probe("yt-dlp metadata probe timed out".to_string()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("yt-dlp failed without output");
        return Err(AppError::Probe(reason.trim().to_string()));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    // Warnings occasionally leak into stdout; the info dump is the last
    // line starting with a brace.
    let json_line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| AppError::Probe("yt-dlp produced no info JSON".to_string()))?;

    let info: VideoInfo = serde_json::from_str(json_line)
        .map_err(|e| AppError::Probe(format!("unparseable info JSON: {}", e)))?;
    Ok(info)
}
