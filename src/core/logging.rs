//! Logging initialization
//!
//! Two sinks share one directory:
//! - `bot.log` receives everything the `log` facade emits (mirrored to the terminal)
//! - `user.log` is the structured activity trail, written by [`crate::core::activity`]

use anyhow::Result;
use simplelog::*;
use std::path::Path;

/// Initialize logger for both console and file output
///
/// Creates the log directory if needed and opens `bot.log` inside it.
pub fn init_logger(log_dir: &Path) -> Result<()> {
    fs_err::create_dir_all(log_dir)?;
    let log_file = fs_err::File::create(log_dir.join("bot.log"))
        .map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file.into_parts().0),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs cookies configuration at startup
///
/// yt-dlp silently ignores a missing cookies file, so surface its state here
/// where an operator reading the boot log will see it.
pub fn log_cookies_configuration() {
    let path = crate::core::config::cookies_file();
    if path.exists() {
        log::info!("cookies file: {} (passed to yt-dlp)", path.display());
    } else {
        log::warn!(
            "cookies file not found at {}; age-restricted and logged-in content will fail",
            path.display()
        );
    }
}
