//! Uploading fetched media back into the chat.
//!
//! Single video files go out as streams, audio as mp3 with title/performer
//! tags, multi-file results (photo slides) as one zip document. Anything
//! Telegram rejects as its native kind is retried as a plain document.

use std::path::{Path, PathBuf};

use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::utils::{format_file_size, sanitize_filename, strip_hashtags_mentions, truncate_with_notice};
use crate::download::archive::zip_files;
use crate::download::fetch::FetchedMedia;
use crate::download::formats::MediaKind;
use crate::download::queue::DownloadTask;
use crate::telegram::html;

const MAX_CAPTION_CHARS: usize = 1024;

/// Caption shown under the delivered file
pub fn build_caption(task: &DownloadTask, total_bytes: u64, download_secs: f64) -> String {
    let title = strip_hashtags_mentions(&task.title);
    let mut caption = html::bold(&html::escape(&title));
    if let Some(uploader) = &task.uploader {
        caption.push_str(&format!("\n👤 {}", html::escape(uploader)));
    }
    caption.push_str(&format!(
        "\n💾 {} · ⏱ info {:.1}s, download {:.1}s",
        format_file_size(total_bytes),
        task.probe_secs,
        download_secs
    ));
    truncate_with_notice(&caption, MAX_CAPTION_CHARS, "…")
}

fn thumbnail(task: &DownloadTask) -> Option<InputFile> {
    let raw = task.thumbnail_url.as_deref()?;
    url::Url::parse(raw).ok().map(InputFile::url)
}

/// Delivers the fetched files, consuming them from disk on success
pub async fn deliver(bot: &Bot, task: &DownloadTask, media: &FetchedMedia) -> AppResult<()> {
    if media.total_bytes > config::validation::MAX_FILE_SIZE {
        return Err(AppError::Validation(format!(
            "result is {}, above the {} upload limit",
            format_file_size(media.total_bytes),
            format_file_size(config::validation::MAX_FILE_SIZE)
        )));
    }

    let caption = build_caption(task, media.total_bytes, media.elapsed.as_secs_f64());

    if media.files.len() > 1 {
        let archive = archive_path(media.primary(), &task.title);
        let files = media.files.clone();
        let dest = archive.clone();
        tokio::task::spawn_blocking(move || zip_files(&files, &dest))
            .await
            .map_err(|e| AppError::Download(format!("archive task panicked: {}", e)))??;

        let result = bot
            .send_document(task.chat_id, InputFile::file(&archive))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await;
        if let Err(e) = fs_err::tokio::remove_file(&archive).await {
            log::warn!("failed to remove archive {:?}: {}", archive, e);
        }
        result?;
        return Ok(());
    }

    let file = media.primary();
    let sent = match task.request.kind {
        MediaKind::Video => {
            let mut request = bot
                .send_video(task.chat_id, InputFile::file(file))
                .caption(caption.clone())
                .parse_mode(ParseMode::Html)
                .supports_streaming(true);
            if let Some(thumb) = thumbnail(task) {
                request = request.thumbnail(thumb);
            }
            request.await.map(|_| ())
        }
        MediaKind::Audio => {
            let mut request = bot
                .send_audio(task.chat_id, InputFile::file(file))
                .caption(caption.clone())
                .parse_mode(ParseMode::Html)
                .title(strip_hashtags_mentions(&task.title));
            if let Some(uploader) = &task.uploader {
                request = request.performer(uploader.clone());
            }
            if let Some(thumb) = thumbnail(task) {
                request = request.thumbnail(thumb);
            }
            request.await.map(|_| ())
        }
    };

    if let Err(e) = sent {
        log::warn!("native upload rejected ({}), retrying as document", e);
        bot.send_document(task.chat_id, InputFile::file(file))
            .caption(caption)
            .parse_mode(ParseMode::Html)
            .await?;
    }

    Ok(())
}

fn archive_path(primary: &Path, title: &str) -> PathBuf {
    let dir = primary.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}.zip", sanitize_filename(title)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::fetch::FetchRequest;
    use crate::download::formats::Quality;
    use pretty_assertions::assert_eq;
    use teloxide::types::{ChatId, MessageId};

    fn task(title: &str, uploader: Option<&str>) -> DownloadTask {
        DownloadTask {
            request: FetchRequest {
                url: "https://example.com/v".to_string(),
                kind: MediaKind::Video,
                format_id: "18".to_string(),
                chat_id: 1,
            },
            quality: Quality::High,
            title: title.to_string(),
            uploader: uploader.map(str::to_string),
            user_id: 1,
            chat_id: ChatId(1),
            status_message: MessageId(1),
            thumbnail_url: None,
            probe_secs: 1.25,
        }
    }

    #[test]
    fn test_caption_contains_title_size_and_timings() {
        let caption = build_caption(&task("My clip #tag", Some("uploader & co")), 5 * 1024 * 1024, 8.04);
        assert!(caption.starts_with("<b>My clip</b>"));
        assert!(caption.contains("👤 uploader &amp; co"));
        assert!(caption.contains("💾 5.0 MB"));
        assert!(caption.contains("info 1.2s, download 8.0s"));
    }

    #[test]
    fn test_caption_is_bounded() {
        let long_title = "a".repeat(5000);
        let caption = build_caption(&task(&long_title, None), 1024, 1.0);
        assert!(caption.chars().count() <= MAX_CAPTION_CHARS);
        assert!(caption.ends_with('…'));
    }

    #[test]
    fn test_archive_path_uses_sanitized_title() {
        let path = archive_path(Path::new("/tmp/abc/1_2.jpg"), "A/B: slides?");
        assert_eq!(path, PathBuf::from("/tmp/abc/A_B_ slides_.zip"));
    }
}
