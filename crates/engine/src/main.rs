//! Innkeeper Engine - Main entry point.
//!
//! Reads commands from stdin and writes one JSON object per line to stdout.
//! Logs go to stderr.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use innkeeper_engine::api::{emit, payloads, CommandDispatcher, Flow};
use innkeeper_engine::infrastructure::ports::RepoError;
use innkeeper_engine::infrastructure::{
    clock::SystemClock, config::EngineConfig, json_roster::JsonRosterRepo,
    proxy_client::ProxyClient, talent_cache::FileTalentCache,
};
use innkeeper_engine::use_cases::SyncSettings;
use innkeeper_engine::App;

const HEALTH_ATTEMPTS: u32 = 3;
const HEALTH_RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root, then the working directory.
    load_dotenv_from_repo_root();

    // Initialize logging on stderr; stdout carries the protocol.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innkeeper_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = EngineConfig::from_env();
    tracing::info!(
        data_dir = %config.data_dir.display(),
        server_url = %config.server_url,
        "Starting Innkeeper Engine"
    );

    let proxy = Arc::new(ProxyClient::new(&config)?);
    let repo = Arc::new(JsonRosterRepo::new(config.roster_path()));
    let talent_cache = Arc::new(FileTalentCache::new(config.talent_cache_dir()));
    let app = Arc::new(App::new(
        proxy.clone(),
        repo,
        talent_cache,
        Arc::new(SystemClock::new()),
        SyncSettings::from_config(&config),
    ));

    let (tx, rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_payloads(rx));

    emit(&tx, payloads::ready());

    match app.start().await {
        Ok(count) => tracing::info!(count, "Roster ready"),
        Err(e) => {
            tracing::error!(error = %e, "Startup sweep failed");
            emit(&tx, payloads::error(&e));
        }
    }

    check_server(&proxy, &tx).await;

    let dispatcher = CommandDispatcher::new(app.clone(), tx.clone());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if dispatcher.handle_line(&line).await == Flow::Exit {
            break;
        }
    }

    match app.store.save().await {
        Ok(()) => {}
        Err(RepoError::NotLoaded) => {
            tracing::warn!("Roster was never loaded; leaving the file on disk untouched")
        }
        Err(e) => tracing::error!(error = %e, "Final roster save failed"),
    }

    drop(dispatcher);
    drop(tx);
    writer.await??;

    tracing::info!("Innkeeper Engine stopped");
    Ok(())
}

/// Checks that the proxy answers, reporting connecting/connected/connect_failed.
async fn check_server(proxy: &ProxyClient, out: &UnboundedSender<Value>) {
    emit(out, payloads::status("connecting"));
    for attempt in 1..=HEALTH_ATTEMPTS {
        if proxy.health().await {
            emit(out, payloads::status("connected"));
            return;
        }
        tracing::warn!(attempt, max = HEALTH_ATTEMPTS, "Proxy health check failed");
        if attempt < HEALTH_ATTEMPTS {
            tokio::time::sleep(HEALTH_RETRY_DELAY).await;
        }
    }
    emit(out, payloads::status("connect_failed"));
}

/// Writes payloads to stdout in the order they were emitted.
async fn write_payloads(mut rx: UnboundedReceiver<Value>) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    while let Some(payload) = rx.recv().await {
        let mut line = payload.to_string();
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
    let _ = dotenvy::dotenv();
}
