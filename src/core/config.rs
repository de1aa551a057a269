use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN, TELEGRAM_BOT_TOKEN or TELOXIDE_TOKEN
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELEGRAM_BOT_TOKEN"))
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Base URL of the Telegram Bot API server
/// Read from TELEGRAM_API_ROOT environment variable
/// Point this at a local Bot API server to lift the 50 MB upload cap
pub static TELEGRAM_API_ROOT: Lazy<Option<String>> = Lazy::new(|| env::var("TELEGRAM_API_ROOT").ok());

/// Admin user id for notifications about denied users and failures
/// Read from ADMIN_ID environment variable
pub static ADMIN_ID: Lazy<Option<i64>> =
    Lazy::new(|| env::var("ADMIN_ID").ok().and_then(|v| v.trim().parse().ok()));

/// Whitelisted Telegram user ids, comma-separated
/// Read from WHITELISTED_IDS environment variable
/// An empty list means the bot is open to everyone
pub static WHITELISTED_IDS: Lazy<Vec<i64>> = Lazy::new(|| {
    env::var("WHITELISTED_IDS")
        .unwrap_or_default()
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
});

/// Whether the bot responds in group chats (when mentioned or replied to)
/// Read from ALLOW_GROUPS environment variable ("1"/"true" to enable)
pub static ALLOW_GROUPS: Lazy<bool> = Lazy::new(|| {
    matches!(
        env::var("ALLOW_GROUPS").unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
});

/// OpenAI API key for on-demand message translation
/// Read from OPENAI_API_KEY environment variable; translation is skipped when unset
pub static OPENAI_API_KEY: Lazy<Option<String>> =
    Lazy::new(|| env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()));

/// Optional cobalt instance base URL (e.g. <https://cobalt.example.com>)
/// Read from COBALT_INSTANCE_URL environment variable
pub static COBALT_INSTANCE_URL: Lazy<Option<String>> =
    Lazy::new(|| env::var("COBALT_INSTANCE_URL").ok().filter(|v| !v.is_empty()));

/// Storage directory for cookies, caches and temp downloads
/// Read from STORAGE_DIR environment variable, tilde expanded
/// Default: ./storage
pub static STORAGE_DIR: Lazy<PathBuf> = Lazy::new(|| {
    let raw = env::var("STORAGE_DIR").unwrap_or_else(|_| "./storage".to_string());
    PathBuf::from(shellexpand::tilde(&raw).to_string())
});

/// Log directory holding bot.log and user.log
/// Read from LOG_DIR environment variable, tilde expanded
/// Default: ./logs
pub static LOG_DIR: Lazy<PathBuf> = Lazy::new(|| {
    let raw = env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
    PathBuf::from(shellexpand::tilde(&raw).to_string())
});

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// Whether the daily yt-dlp self-update task runs
/// Read from YTDL_AUTOUPDATE environment variable, enabled by default
pub static YTDL_AUTOUPDATE: Lazy<bool> = Lazy::new(|| {
    !matches!(
        env::var("YTDL_AUTOUPDATE").unwrap_or_default().to_lowercase().as_str(),
        "0" | "false" | "no"
    )
});

/// Admin web panel listen port
/// Read from PANEL_PORT environment variable
/// Default: 8501
pub static PANEL_PORT: Lazy<u16> = Lazy::new(|| {
    env::var("PANEL_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8501)
});

/// Netscape-format cookies file passed to yt-dlp, if present in STORAGE_DIR
pub fn cookies_file() -> PathBuf {
    STORAGE_DIR.join("cookies.txt")
}

/// Cached machine-translation results
pub fn translations_file() -> PathBuf {
    STORAGE_DIR.join("saved-translations.json")
}

/// Per-user format and quality preferences
pub fn preferences_file() -> PathBuf {
    STORAGE_DIR.join("user-preferences.json")
}

/// Scratch directory for in-flight downloads
pub fn temp_dir() -> PathBuf {
    STORAGE_DIR.join("temp")
}

/// Input validation limits
pub mod validation {
    /// Maximum accepted URL length in a message
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Hard ceiling on a file the bot will upload (stock Bot API limit)
    pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

    /// Files below this are treated as failed downloads (error pages, empty muxes)
    pub const MIN_FILE_SIZE: u64 = 1024;
}

/// Probe and download timeouts
pub mod timeouts {
    use super::Duration;

    /// yt-dlp metadata probe timeout (seconds)
    pub const PROBE_SECS: u64 = 60;

    /// yt-dlp download timeout (seconds)
    pub const DOWNLOAD_SECS: u64 = 15 * 60;

    pub fn probe() -> Duration {
        Duration::from_secs(PROBE_SECS)
    }

    pub fn download() -> Duration {
        Duration::from_secs(DOWNLOAD_SECS)
    }
}

/// HTTP client tuning for the Telegram connection
pub mod network {
    use super::Duration;

    /// Full-request timeout; must cover a complete large-file upload,
    /// not a single round trip
    pub const TELEGRAM_TIMEOUT_SECS: u64 = 600;

    /// TCP connect timeout
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;

    pub fn telegram_timeout() -> Duration {
        Duration::from_secs(TELEGRAM_TIMEOUT_SECS)
    }

    pub fn connect_timeout() -> Duration {
        Duration::from_secs(CONNECT_TIMEOUT_SECS)
    }
}

/// Queue processing configuration
pub mod queue {
    use super::Duration;

    /// Maximum number of queued downloads before new requests are rejected
    pub const MAX_QUEUE_SIZE: usize = 50;

    /// Interval between queue checks (in milliseconds)
    pub const CHECK_INTERVAL_MS: u64 = 250;

    pub fn check_interval() -> Duration {
        Duration::from_millis(CHECK_INTERVAL_MS)
    }
}

/// Thumbnail selection limits
pub mod thumbnails {
    /// Largest side of a thumbnail the bot attaches to uploads
    pub const MAX_SIDE: u32 = 320;
}

/// Daily yt-dlp self-update schedule (local time)
pub mod updater {
    pub const HOUR: u32 = 4;
    pub const MINUTE: u32 = 20;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_paths_live_under_storage_dir() {
        assert!(cookies_file().starts_with(&*STORAGE_DIR));
        assert!(translations_file().starts_with(&*STORAGE_DIR));
        assert!(preferences_file().starts_with(&*STORAGE_DIR));
        assert!(temp_dir().starts_with(&*STORAGE_DIR));
    }

    #[test]
    fn test_limits_are_sane() {
        assert!(validation::MIN_FILE_SIZE < validation::MAX_FILE_SIZE);
        assert!(network::CONNECT_TIMEOUT_SECS < network::TELEGRAM_TIMEOUT_SECS);
        assert!(updater::HOUR < 24);
        assert!(updater::MINUTE < 60);
    }
}
