//! yt-dlp binary management: version query and daily self-update.
//!
//! Extractors rot fast; a bot running a week-old yt-dlp starts failing on
//! the biggest sites first. The updater runs `yt-dlp -U` every night and
//! falls back to pip for installs that are not self-updatable (exit code
//! 100, or when the binary says so).

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::core::config;
use crate::core::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    AlreadyCurrent(String),
    Updated(String),
}

/// `yt-dlp --version`, trimmed
pub async fn current_version() -> AppResult<String> {
    let output = Command::new(config::YTDL_BIN.as_str())
        .arg("--version")
        .stdin(Stdio::null())
        .output()
        .await?;
    if !output.status.success() {
        return Err(AppError::Download("yt-dlp --version failed".to_string()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Runs the self-update, falling back to pip when the install is pip-managed
pub async fn update() -> AppResult<UpdateOutcome> {
    let before = current_version().await.unwrap_or_else(|_| "unknown".to_string());

    let output = Command::new(config::YTDL_BIN.as_str())
        .arg("-U")
        .stdin(Stdio::null())
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let pip_managed = output.status.code() == Some(100)
        || stdout.contains("pip")
        || stderr.contains("pip");

    if !output.status.success() && !pip_managed {
        return Err(AppError::Download(format!(
            "yt-dlp -U failed: {}",
            stderr.lines().last().unwrap_or("no output")
        )));
    }

    if pip_managed {
        log::info!("yt-dlp is pip-managed, updating via pip");
        let pip = Command::new("pip3")
            .args(["install", "--upgrade", "yt-dlp"])
            .stdin(Stdio::null())
            .output()
            .await?;
        if !pip.status.success() {
            let err = String::from_utf8_lossy(&pip.stderr);
            return Err(AppError::Download(format!(
                "pip upgrade failed: {}",
                err.lines().last().unwrap_or("no output")
            )));
        }
    }

    let after = current_version().await?;
    if after == before {
        Ok(UpdateOutcome::AlreadyCurrent(after))
    } else {
        Ok(UpdateOutcome::Updated(after))
    }
}

/// Seconds until the next occurrence of the configured update time
fn secs_until_next_run(now: chrono::DateTime<chrono::Local>) -> u64 {
    let today = now
        .date_naive()
        .and_hms_opt(config::updater::HOUR, config::updater::MINUTE, 0);
    let Some(today) = today else {
        // Unreachable with the shipped constants; retry in an hour if the
        // schedule is ever misconfigured.
        return 3600;
    };
    let target = if now.naive_local() < today {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (target - now.naive_local()).to_std().map(|d| d.as_secs()).unwrap_or(3600)
}

/// Background task: update yt-dlp once per day at the configured time
pub fn spawn_auto_update() {
    tokio::spawn(async {
        loop {
            let wait = secs_until_next_run(chrono::Local::now());
            log::info!(
                "next yt-dlp update in {}h {}m",
                wait / 3600,
                (wait % 3600) / 60
            );
            tokio::time::sleep(Duration::from_secs(wait)).await;

            match update().await {
                Ok(UpdateOutcome::Updated(v)) => log::info!("yt-dlp updated to {}", v),
                Ok(UpdateOutcome::AlreadyCurrent(v)) => log::info!("yt-dlp already current ({})", v),
                Err(e) => log::error!("yt-dlp auto-update failed: {}", e),
            }
            // Guard against clock math landing exactly on the boundary
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_wait_before_todays_run() {
        let now = chrono::Local.with_ymd_and_hms(2025, 3, 14, 2, 20, 0).unwrap();
        // 04:20 is two hours away
        assert_eq!(secs_until_next_run(now), 2 * 3600);
    }

    #[test]
    fn test_wait_after_todays_run_rolls_over() {
        let now = chrono::Local.with_ymd_and_hms(2025, 3, 14, 4, 20, 1).unwrap();
        let wait = secs_until_next_run(now);
        assert_eq!(wait, 24 * 3600 - 1);
    }
}
