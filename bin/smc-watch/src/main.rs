use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::Config;
use engine::{BinanceFeed, Dispatcher, Orchestrator, WatchSettings};
use gate::{ForestScorer, QualityGate};
use strategy::{DetectorConfig, SignalComposer};
use telegram_alert::TelegramAlerter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        symbol = %cfg.symbol,
        threshold = cfg.signal_threshold,
        store = %cfg.signal_store,
        "SMC watch starting"
    );

    let detectors = match &cfg.detector_config_path {
        Some(path) => {
            info!(%path, "Loading detector parameters");
            DetectorConfig::load(path)
        }
        None => DetectorConfig::default(),
    };

    // ── Adapters ──────────────────────────────────────────────────────────────
    let feed = Arc::new(
        BinanceFeed::new(&cfg.feed_base_url, cfg.feed_timeout)
            .context("Failed to create candle feed")?,
    );
    let alerter = Arc::new(
        TelegramAlerter::new(&cfg.telegram_token, &cfg.telegram_chat_id)
            .context("Invalid Telegram destination")?,
    );
    let store = store::open_store(&cfg.signal_store)
        .await
        .with_context(|| format!("Failed to open signal store '{}'", cfg.signal_store))?;

    let scorer = ForestScorer::new(&cfg.model_path);
    if !scorer.model_path().exists() {
        warn!(
            path = %scorer.model_path().display(),
            "No quality model yet, every signal will be accepted"
        );
    }
    let gate = QualityGate::new(Arc::new(scorer), cfg.signal_threshold);

    // ── Orchestrator ─────────────────────────────────────────────────────────
    let orchestrator = Orchestrator::new(
        WatchSettings::from(&cfg),
        feed,
        SignalComposer::new(detectors),
        gate,
        Dispatcher::new(alerter, store.clone()),
    );

    // ── Status server ─────────────────────────────────────────────────────────
    let status_state = api::AppState::new(cfg.symbol.clone(), store);
    tokio::spawn(api::serve(status_state, cfg.status_port));

    // ── Run until ctrl-c ──────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watch_task = tokio::spawn(orchestrator.run(shutdown_rx));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, finishing current cycle");
    let _ = shutdown_tx.send(true);

    watch_task.await.context("Signal watch task panicked")?;
    info!("SMC watch stopped");
    Ok(())
}
