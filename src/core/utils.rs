//! Small shared helpers for captions, filenames and sizes

use lazy_regex::regex;

/// Human-readable file size with one decimal (B, KB, MB, GB)
pub fn format_file_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.1} GB", b / GB)
    } else if b >= MB {
        format!("{:.1} MB", b / MB)
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

/// Removes #hashtags and @mentions from a title, collapsing leftover whitespace
pub fn strip_hashtags_mentions(text: &str) -> String {
    let stripped = regex!(r"[#@]\S+").replace_all(text, "");
    regex!(r"\s+").replace_all(stripped.trim(), " ").into_owned()
}

/// Replaces filesystem-hostile characters so a media title can become a filename
pub fn sanitize_filename(title: &str) -> String {
    let cleaned = regex!(r#"[/\\:*?"<>|\x00-\x1f]"#).replace_all(title, "_");
    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "media".to_string()
    } else {
        // Telegram and most filesystems are comfortable well below 255 bytes
        trimmed.chars().take(120).collect()
    }
}

/// Truncates caption text to `max` characters, appending `notice` when cut.
/// The notice fits inside the limit.
pub fn truncate_with_notice(text: &str, max: usize, notice: &str) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(notice.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(notice);
    out
}

/// First http(s) URL in a message text, if any
pub fn extract_url(text: &str) -> Option<&str> {
    regex!(r"https?://[^\s<>]+").find(text).map(|m| m.as_str())
}
