//! Running the actual yt-dlp download.
//!
//! Each request downloads into the scratch directory under a unique stem, so
//! collecting the results (and cleaning up after failures) is a prefix scan
//! rather than bookkeeping inside yt-dlp's output parsing.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::process::Command;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::download::formats::MediaKind;
use crate::download::metadata::base_args;

/// One download order, produced by the quality-pick callback
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub kind: MediaKind,
    pub format_id: String,
    pub chat_id: i64,
}

/// Files that landed on disk for one request
#[derive(Debug)]
pub struct FetchedMedia {
    /// All outputs, largest first. Usually one; photo slide posts yield several.
    pub files: Vec<PathBuf>,
    pub total_bytes: u64,
    pub elapsed: Duration,
}

impl FetchedMedia {
    pub fn primary(&self) -> &PathBuf {
        // files is never empty; fetch() errors before constructing this
        &self.files[0]
    }
}

fn unique_stem(chat_id: i64) -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(ts) => format!("{}_{}", ts.as_secs(), chat_id),
        Err(_) => format!("{}_{}", uuid::Uuid::new_v4().simple(), chat_id),
    }
}

/// Downloads the requested format and returns everything that appeared
/// under the request's stem. Outputs below the minimum size are treated as
/// failures (error pages saved as media, empty muxes).
pub async fn fetch(request: &FetchRequest) -> AppResult<FetchedMedia> {
    let temp_dir = config::temp_dir();
    fs_err::tokio::create_dir_all(&temp_dir).await?;

    let stem = unique_stem(request.chat_id);
    let template = temp_dir.join(format!("{}.%(ext)s", stem));
    let started = Instant::now();

    let mut cmd = Command::new(config::YTDL_BIN.as_str());
    cmd.args(base_args(&request.url));
    match request.kind {
        MediaKind::Video => {
            // The picked id may already be muxed; merging with bestaudio is
            // a no-op then, and fills in sound for video-only ids.
            cmd.arg("-f")
                .arg(format!("{}+bestaudio/best", request.format_id))
                .arg("--merge-output-format")
                .arg("mp4");
        }
        MediaKind::Audio => {
            // Audio always re-encodes to mp3, so the source pick matters
            // less than grabbing the best stream available.
            cmd.arg("-f")
                .arg("bestaudio/best")
                .arg("-x")
                .arg("--audio-format")
                .arg("mp3")
                .arg("--audio-quality")
                .arg("192K");
        }
    }
    cmd.arg("-o").arg(&template).arg(&request.url);
    cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

    let output = match tokio::time::timeout(config::timeouts::download(), cmd.output()).await {
        Ok(result) => result?,
        Err(_) => {
            cleanup_stem(&stem).await;
            return Err(AppError::Download("download timed out".to_string()));
        }
    };

    if !output.status.success() {
        cleanup_stem(&stem).await;
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("yt-dlp failed without output");
        return Err(AppError::Download(reason.trim().to_string()));
    }

    let mut files: Vec<(PathBuf, u64)> = Vec::new();
    let mut entries = fs_err::tokio::read_dir(&temp_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(&stem) {
            continue;
        }
        let meta = entry.metadata().await?;
        files.push((entry.path(), meta.len()));
    }

    let total_bytes: u64 = files.iter().map(|(_, size)| size).sum();
    if files.is_empty() || total_bytes < config::validation::MIN_FILE_SIZE {
        cleanup_stem(&stem).await;
        return Err(AppError::Download(
            "download produced no usable output".to_string(),
        ));
    }

    files.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(FetchedMedia {
        files: files.into_iter().map(|(p, _)| p).collect(),
        total_bytes,
        elapsed: started.elapsed(),
    })
}

/// Removes every scratch file carrying the given stem. Errors are logged,
/// not propagated: cleanup runs on paths that may already be gone.
pub async fn cleanup_stem(stem: &str) {
    let temp_dir = config::temp_dir();
    let Ok(mut entries) = fs_err::tokio::read_dir(&temp_dir).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(stem) {
                if let Err(e) = fs_err::tokio::remove_file(entry.path()).await {
                    log::warn!("failed to remove scratch file {:?}: {}", entry.path(), e);
                }
            }
        }
    }
}

/// Removes the given result files after a successful (or abandoned) upload
pub async fn cleanup_files(files: &[PathBuf]) {
    for file in files {
        if let Err(e) = fs_err::tokio::remove_file(file).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to remove {:?}: {}", file, e);
            }
        }
    }
}
