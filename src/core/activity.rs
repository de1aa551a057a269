//! Structured user-activity trail
//!
//! Every user-visible event is appended to `user.log` as one pipe-delimited
//! line:
//!
//! ```text
//! 2025-03-14 10:22:31 | DOWNLOAD COMPLETE | user: 12345 | file: clip.mp4 | size: 12.3 MB
//! ```
//!
//! The admin panel tails and aggregates this file, so the format is part of
//! the operator contract: timestamp first, event kind second, `key: value`
//! fields after.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::core::error::AppResult;

/// Event kinds recorded in the activity trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum ActivityKind {
    #[strum(serialize = "URL REQUEST")]
    UrlRequest,
    #[strum(serialize = "VIDEO INFO")]
    VideoInfo,
    #[strum(serialize = "BUTTON SELECTION")]
    ButtonSelection,
    #[strum(serialize = "FORMAT PREFERENCE")]
    FormatPreference,
    #[strum(serialize = "DOWNLOAD START")]
    DownloadStart,
    #[strum(serialize = "DOWNLOAD COMPLETE")]
    DownloadComplete,
    #[strum(serialize = "DOWNLOAD FAILED")]
    DownloadFailed,
    #[strum(serialize = "PROCESSING ERROR")]
    ProcessingError,
}

/// Aggregate counters derived from the trail
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ActivityStats {
    pub total_events: usize,
    pub by_kind: HashMap<String, usize>,
    pub downloads_started: usize,
    pub downloads_completed: usize,
    pub downloads_failed: usize,
    /// completed / started, in percent; 100 when nothing started yet
    pub success_rate: f64,
}

/// Append-only activity log with serialized writers
pub struct ActivityLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ActivityLog {
    /// Opens (or creates) `user.log` under `log_dir`
    pub fn new(log_dir: &Path) -> AppResult<Self> {
        fs_err::create_dir_all(log_dir)?;
        Ok(Self {
            path: log_dir.join("user.log"),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one event line. `fields` are rendered in order as `key: value`.
    pub async fn record(&self, kind: ActivityKind, user_id: i64, fields: &[(&str, &str)]) -> AppResult<()> {
        let mut line = format!(
            "{} | {} | user: {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            kind,
            user_id
        );
        for (key, value) in fields {
            // Field values may carry user text; strip pipes and newlines so
            // one event stays one line.
            let clean = value.replace(['|', '\n', '\r'], " ");
            line.push_str(&format!(" | {}: {}", key, clean.trim()));
        }
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = fs_err::tokio::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    /// Last `limit` lines, newest last, optionally filtered by event kind
    /// and a case-insensitive substring.
    pub async fn tail(
        &self,
        limit: usize,
        kind: Option<ActivityKind>,
        contains: Option<&str>,
    ) -> AppResult<Vec<String>> {
        let content = match fs_err::tokio::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let needle = contains.map(str::to_lowercase);
        let lines: Vec<String> = content
            .lines()
            .filter(|line| match kind {
                Some(k) => line.contains(&format!(" | {} | ", k)),
                None => true,
            })
            .filter(|line| match &needle {
                Some(n) => line.to_lowercase().contains(n),
                None => true,
            })
            .map(str::to_string)
            .collect();

        let skip = lines.len().saturating_sub(limit);
        Ok(lines.into_iter().skip(skip).collect())
    }

    /// Full-file aggregation for the panel statistics view
    pub async fn stats(&self) -> AppResult<ActivityStats> {
        let mut stats = ActivityStats::default();
        let content = match fs_err::tokio::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                stats.success_rate = 100.0;
                return Ok(stats);
            }
            Err(e) => return Err(e.into()),
        };

        for line in content.lines() {
            for kind in ActivityKind::iter() {
                if line.contains(&format!(" | {} | ", kind)) {
                    stats.total_events += 1;
                    *stats.by_kind.entry(kind.to_string()).or_default() += 1;
                    match kind {
                        ActivityKind::DownloadStart => stats.downloads_started += 1,
                        ActivityKind::DownloadComplete => stats.downloads_completed += 1,
                        ActivityKind::DownloadFailed => stats.downloads_failed += 1,
                        _ => {}
                    }
                    break;
                }
            }
        }

        stats.success_rate = if stats.downloads_started == 0 {
            100.0
        } else {
            stats.downloads_completed as f64 / stats.downloads_started as f64 * 100.0
        };
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_record_and_tail() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path()).unwrap();

        log.record(ActivityKind::UrlRequest, 42, &[("url", "https://example.com/v")])
            .await
            .unwrap();
        log.record(ActivityKind::DownloadStart, 42, &[("format", "video high")])
            .await
            .unwrap();
        log.record(ActivityKind::DownloadComplete, 42, &[("file", "v.mp4")])
            .await
            .unwrap();

        let all = log.tail(10, None, None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all[0].contains("| URL REQUEST | user: 42 | url: https://example.com/v"));

        let starts = log.tail(10, Some(ActivityKind::DownloadStart), None).await.unwrap();
        assert_eq!(starts.len(), 1);

        let filtered = log.tail(10, None, Some("V.MP4")).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_tail_limit_keeps_newest() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path()).unwrap();
        for i in 0..5 {
            log.record(ActivityKind::UrlRequest, i, &[]).await.unwrap();
        }
        let last_two = log.tail(2, None, None).await.unwrap();
        assert_eq!(last_two.len(), 2);
        assert!(last_two[1].contains("user: 4"));
    }

    #[tokio::test]
    async fn test_stats_success_rate() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path()).unwrap();
        log.record(ActivityKind::DownloadStart, 1, &[]).await.unwrap();
        log.record(ActivityKind::DownloadStart, 2, &[]).await.unwrap();
        log.record(ActivityKind::DownloadComplete, 1, &[]).await.unwrap();
        log.record(ActivityKind::DownloadFailed, 2, &[]).await.unwrap();

        let stats = log.stats().await.unwrap();
        assert_eq!(stats.downloads_started, 2);
        assert_eq!(stats.downloads_completed, 1);
        assert_eq!(stats.downloads_failed, 1);
        assert!((stats.success_rate - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_empty_log_has_full_success_rate() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path()).unwrap();
        let stats = log.stats().await.unwrap();
        assert_eq!(stats.total_events, 0);
        assert!((stats.success_rate - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_field_values_are_flattened() {
        let dir = tempdir().unwrap();
        let log = ActivityLog::new(dir.path()).unwrap();
        log.record(ActivityKind::ProcessingError, 7, &[("error", "line1\nline2 | tail")])
            .await
            .unwrap();
        let lines = log.tail(10, None, None).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("error: line1 line2   tail"));
    }
}
