//! Read-only admin web panel.
//!
//! Serves log tails and aggregate download statistics on PANEL_PORT
//! (default 8501) alongside the bot. JSON endpoints plus a minimal HTML
//! index; no mutations, no auth, meant to sit behind the operator's own
//! reverse proxy.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::core::activity::{ActivityKind, ActivityLog};
use crate::core::config;

/// Shared state for the panel server.
#[derive(Clone)]
struct PanelState {
    activity: Arc<ActivityLog>,
    started: Instant,
}

/// Query parameters accepted by both log endpoints
#[derive(Debug, Deserialize)]
struct LogQuery {
    /// Maximum lines returned, newest last
    #[serde(default = "default_lines", alias = "tail")]
    lines: usize,
    /// Log level filter (bot log only), e.g. "ERROR"
    #[serde(default)]
    level: Option<String>,
    /// Activity kind filter (user log only), e.g. "DOWNLOAD COMPLETE"
    #[serde(default)]
    kind: Option<String>,
    /// Case-insensitive substring filter
    #[serde(default)]
    contains: Option<String>,
}

fn default_lines() -> usize {
    200
}

/// Start the panel server. Blocks for the lifetime of the process.
pub async fn start_panel(port: u16, activity: Arc<ActivityLog>) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let state = PanelState {
        activity,
        started: Instant::now(),
    };

    let app = Router::new()
        .route("/", get(index_handler))
        .route("/logs/bot", get(bot_log_handler))
        .route("/logs/user", get(user_log_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    log::info!("admin panel listening on http://{}", addr);
    log::info!("  /logs/bot   - application log tail (JSON)");
    log::info!("  /logs/user  - activity trail tail (JSON)");
    log::info!("  /stats      - download statistics (JSON)");
    log::info!("  /health     - health check");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>ytgram panel</title></head><body>\
         <h1>ytgram admin panel</h1>\
         <ul>\
         <li><a href=\"/logs/bot?lines=200\">bot log</a></li>\
         <li><a href=\"/logs/user?lines=200\">user activity</a></li>\
         <li><a href=\"/stats\">statistics</a></li>\
         <li><a href=\"/health\">health</a></li>\
         </ul></body></html>",
    )
}

async fn bot_log_handler(State(_state): State<PanelState>, Query(q): Query<LogQuery>) -> impl IntoResponse {
    let path = config::LOG_DIR.join("bot.log");
    let content = match fs_err::tokio::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    };

    // simplelog writes the level in brackets, e.g. "12:00:00 [ERROR] ..."
    let level = q.level.as_deref().map(|l| format!("[{}]", l.to_uppercase()));
    let needle = q.contains.as_deref().map(str::to_lowercase);
    let lines: Vec<&str> = content
        .lines()
        .filter(|line| match &level {
            Some(l) => line.contains(l.as_str()),
            None => true,
        })
        .filter(|line| match &needle {
            Some(n) => line.to_lowercase().contains(n),
            None => true,
        })
        .collect();
    let skip = lines.len().saturating_sub(q.lines);

    Json(json!({ "lines": lines[skip..] })).into_response()
}

async fn user_log_handler(State(state): State<PanelState>, Query(q): Query<LogQuery>) -> impl IntoResponse {
    let kind = match q.kind.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<ActivityKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("unknown activity kind: {}", raw) })),
                )
                    .into_response()
            }
        },
    };

    match state.activity.tail(q.lines, kind, q.contains.as_deref()).await {
        Ok(lines) => Json(json!({ "lines": lines })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn stats_handler(State(state): State<PanelState>) -> impl IntoResponse {
    match state.activity.stats().await {
        Ok(stats) => Json(json!({
            "total_events": stats.total_events,
            "by_kind": stats.by_kind,
            "downloads": {
                "started": stats.downloads_started,
                "completed": stats.downloads_completed,
                "failed": stats.downloads_failed,
                "success_rate": format!("{:.1}%", stats.success_rate),
            },
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn health_handler(State(state): State<PanelState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "uptime_secs": state.started.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
