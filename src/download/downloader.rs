//! Queue worker: turns accepted download tasks into delivered files.

use std::sync::Arc;

use teloxide::prelude::*;

use crate::core::activity::ActivityKind;
use crate::core::config;
use crate::core::error::AppResult;
use crate::core::utils::format_file_size;
use crate::download::fetch;
use crate::download::queue::DownloadTask;
use crate::telegram::send::deliver;
use crate::telegram::HandlerDeps;

/// Endless worker loop, one download at a time. Runs as a background task
/// next to the dispatcher.
pub async fn run_worker(bot: Bot, deps: Arc<HandlerDeps>) {
    log::info!("download worker started");
    loop {
        let Some(task) = deps.queue.next().await else {
            tokio::time::sleep(config::queue::check_interval()).await;
            continue;
        };

        if let Err(e) = process_task(&bot, &task, &deps).await {
            log::error!("download for chat {} failed: {}", task.chat_id, e);
            record_failure(&deps, &task, &e.to_string()).await;
            let note = format!("❌ Download failed:\n{}", e);
            if let Err(edit_err) = bot.edit_message_text(task.chat_id, task.status_message, note).await {
                log::warn!("could not report failure to chat {}: {}", task.chat_id, edit_err);
            }
        }
        deps.queue.finish(&task).await;
    }
}

async fn process_task(bot: &Bot, task: &DownloadTask, deps: &HandlerDeps) -> AppResult<()> {
    let media = fetch::fetch(&task.request).await?;

    let delivered = deliver(bot, task, &media).await;
    fetch::cleanup_files(&media.files).await;
    delivered?;

    record(
        deps,
        task,
        ActivityKind::DownloadComplete,
        &[
            ("url", &task.request.url),
            ("size", &format_file_size(media.total_bytes)),
            ("secs", &format!("{:.1}", media.elapsed.as_secs_f64())),
        ],
    )
    .await;

    // The status message served its purpose; the file carries the caption
    if let Err(e) = bot.delete_message(task.chat_id, task.status_message).await {
        log::debug!("could not delete status message in {}: {}", task.chat_id, e);
    }
    Ok(())
}

async fn record_failure(deps: &HandlerDeps, task: &DownloadTask, error: &str) {
    record(
        deps,
        task,
        ActivityKind::DownloadFailed,
        &[("url", &task.request.url), ("error", error)],
    )
    .await;
}

async fn record(deps: &HandlerDeps, task: &DownloadTask, kind: ActivityKind, fields: &[(&str, &str)]) {
    if let Err(e) = deps.activity.record(kind, task.user_id, fields).await {
        log::warn!("failed to record activity: {}", e);
    }
}
