use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use ytgram::cli::{Cli, Commands};
use ytgram::core::activity::ActivityLog;
use ytgram::core::cobalt::CobaltClient;
use ytgram::core::config;
use ytgram::core::logging::{init_logger, log_cookies_configuration};
use ytgram::core::translate::Translator;
use ytgram::download::downloader::run_worker;
use ytgram::download::formats::FormatTable;
use ytgram::download::queue::DownloadQueue;
use ytgram::download::{metadata, ytdlp};
use ytgram::storage::prefs::PrefStore;
use ytgram::telegram::session::Sessions;
use ytgram::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Catch panics escaping spawned handler futures so the process can keep
    // logging instead of dying silently under a supervisor.
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env before anything reads config
    let _ = dotenv();

    init_logger(&config::LOG_DIR)?;

    match cli.command {
        Some(Commands::UpdateYtdlp { check }) => run_ytdlp_update(check).await,
        Some(Commands::Probe { url, verbose }) => run_probe(url, verbose).await,
        Some(Commands::Run) | None => run_bot().await,
    }
}

async fn run_ytdlp_update(check: bool) -> Result<()> {
    if check {
        let version = ytdlp::current_version().await?;
        println!("yt-dlp {}", version);
        return Ok(());
    }
    match ytdlp::update().await? {
        ytdlp::UpdateOutcome::Updated(v) => println!("updated to yt-dlp {}", v),
        ytdlp::UpdateOutcome::AlreadyCurrent(v) => println!("already current: yt-dlp {}", v),
    }
    Ok(())
}

async fn run_probe(url: String, verbose: bool) -> Result<()> {
    let info = metadata::probe(&url).await?;
    println!("title:     {}", info.display_title());
    if let Some(uploader) = &info.uploader {
        println!("uploader:  {}", uploader);
    }
    if let Some(extractor) = &info.extractor {
        println!("extractor: {}", extractor);
    }
    println!("formats:   {}", info.formats.len());

    match FormatTable::build(&info.formats) {
        Ok(table) => {
            for (quality, choice) in table.video.iter() {
                println!("video {:>6}: {} [{}]", quality.to_string(), choice.label, choice.format_id);
            }
            for (quality, choice) in table.audio.iter() {
                println!("audio {:>6}: {} [{}]", quality.to_string(), choice.label, choice.format_id);
            }
        }
        Err(e) => println!("no quality table: {}", e),
    }

    if verbose {
        for f in &info.formats {
            println!("{:?}", f);
        }
    }
    Ok(())
}

async fn run_bot() -> Result<()> {
    let init_started = std::time::Instant::now();
    log::info!("Starting bot...");

    if config::BOT_TOKEN.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }
    fs_err::create_dir_all(&*config::STORAGE_DIR)?;
    log_cookies_configuration();

    match ytdlp::current_version().await {
        Ok(version) => log::info!("yt-dlp {}", version),
        Err(e) => log::warn!("could not determine yt-dlp version: {}", e),
    }
    if *config::YTDL_AUTOUPDATE {
        ytdlp::spawn_auto_update();
    } else {
        log::info!("yt-dlp auto-update disabled (YTDL_AUTOUPDATE=0)");
    }

    let bot = create_bot()?;
    let bot_info = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", bot_info.username, bot_info.id);
    setup_bot_commands(&bot).await?;

    let cobalt = Arc::new(CobaltClient::new(config::COBALT_INSTANCE_URL.clone()));
    if cobalt.is_configured() {
        cobalt.check_instance().await;
    }

    let activity = Arc::new(ActivityLog::new(&config::LOG_DIR)?);
    let deps = HandlerDeps {
        prefs: Arc::new(PrefStore::load(config::preferences_file())?),
        sessions: Arc::new(Sessions::new()),
        queue: Arc::new(DownloadQueue::new()),
        translator: Arc::new(Translator::new(
            config::OPENAI_API_KEY.clone(),
            config::translations_file(),
        )?),
        cobalt,
        activity: Arc::clone(&activity),
        bot_username: bot_info.username.clone(),
        bot_id: bot_info.id,
    };

    // Admin web panel
    let panel_port = *config::PANEL_PORT;
    let panel_activity = Arc::clone(&activity);
    tokio::spawn(async move {
        if let Err(e) = ytgram::panel::start_panel(panel_port, panel_activity).await {
            log::error!("admin panel error: {}", e);
        }
    });

    // Download worker
    tokio::spawn(run_worker(bot.clone(), Arc::new(deps.clone())));

    let handler = schema(deps);

    log::info!(
        "Bot initialization complete in {:.2}s, starting long polling",
        init_started.elapsed().as_secs_f64()
    );

    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();
    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
