use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::watch;

use common::{
    AlertChannel, Candle, CandleFeed, CandleSeries, Error, Result, Signal, SignalStore, SignalType,
};
use engine::{CycleOutcome, CycleReport, CycleState, Dispatcher, Orchestrator, WatchSettings};
use gate::{QualityGate, SignalFeatures, SignalScorer};
use strategy::{DetectorConfig, SignalComposer};

// ─── Test doubles ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct StubFeed {
    /// Interval → candles. A missing interval fails the fetch.
    series: Mutex<HashMap<String, CandleSeries>>,
}

impl StubFeed {
    fn set(&self, interval: &str, candles: CandleSeries) {
        self.series.lock().unwrap().insert(interval.to_string(), candles);
    }

    fn remove(&self, interval: &str) {
        self.series.lock().unwrap().remove(interval);
    }
}

#[async_trait]
impl CandleFeed for StubFeed {
    async fn candles(&self, _symbol: &str, interval: &str, _limit: u32) -> Result<CandleSeries> {
        self.series
            .lock()
            .unwrap()
            .get(interval)
            .cloned()
            .ok_or_else(|| Error::Fetch(format!("HTTP 503 for {interval}")))
    }
}

#[derive(Default)]
struct RecordingAlert {
    fail: bool,
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl AlertChannel for RecordingAlert {
    async fn send(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Dispatch("Telegram returned 400".into()));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct MemoryStore {
    signals: Mutex<Vec<Signal>>,
}

#[async_trait]
impl SignalStore for MemoryStore {
    async fn append(&self, signal: &Signal) -> Result<()> {
        self.signals.lock().unwrap().push(signal.clone());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Signal>> {
        Ok(self.signals.lock().unwrap().clone())
    }
}

struct FixedScore(f64);

impl SignalScorer for FixedScore {
    fn predict(&self, _: &SignalFeatures) -> Result<f64> {
        Ok(self.0)
    }
}

struct Harness {
    feed: Arc<StubFeed>,
    alert: Arc<RecordingAlert>,
    store: Arc<MemoryStore>,
    orchestrator: Orchestrator,
}

fn harness(score: f64, alert_fails: bool) -> Harness {
    let feed = Arc::new(StubFeed::default());
    let alert = Arc::new(RecordingAlert {
        fail: alert_fails,
        ..RecordingAlert::default()
    });
    let store = Arc::new(MemoryStore::default());

    let settings = WatchSettings {
        symbol: "DOGEUSDT".into(),
        short_interval: "5m".into(),
        mid_interval: "15m".into(),
        long_interval: "1h".into(),
        candle_limit: 100,
        poll_interval: Duration::from_secs(3600),
    };
    let orchestrator = Orchestrator::new(
        settings,
        feed.clone(),
        SignalComposer::new(DetectorConfig::default()),
        QualityGate::new(Arc::new(FixedScore(score)), 0.5),
        Dispatcher::new(alert.clone(), store.clone()),
    );

    Harness {
        feed,
        alert,
        store,
        orchestrator,
    }
}

// ─── Candle fixtures ──────────────────────────────────────────────────────────

fn ts(i: usize) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + i as i64 * 300, 0).unwrap()
}

fn candle(i: usize, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Candle {
    Candle {
        timestamp: ts(i),
        open,
        high,
        low,
        close,
        volume,
    }
}

/// Tight range with fading volume, then a spring closing back inside.
fn accumulation_short() -> CandleSeries {
    let mut series: CandleSeries = (0..20)
        .map(|i| candle(i, 0.999, 1.003, 0.997, 1.000, 1000.0 - 10.0 * i as f64))
        .collect();
    series.push(candle(20, 0.996, 1.003, 0.995, 1.002, 500.0));
    series
}

/// Quiet candles then a high-volume bullish reversal candle.
fn reversal_short() -> CandleSeries {
    let mut series: CandleSeries = (0..9)
        .map(|i| candle(i, 100.0, 100.5, 99.5, 100.0, 100.0))
        .collect();
    series.push(candle(9, 100.0, 101.0, 100.0, 100.8, 200.0));
    series
}

fn flat(n: usize, price: f64) -> CandleSeries {
    (0..n).map(|i| candle(i, price, price, price, price, 1.0)).collect()
}

fn falling_long() -> CandleSeries {
    [1.10, 1.08, 1.06]
        .iter()
        .enumerate()
        .map(|(i, &p)| candle(i, p, p, p, p, 1.0))
        .collect()
}

fn load(h: &Harness, short: CandleSeries, long: CandleSeries) {
    h.feed.set("5m", short);
    h.feed.set("15m", flat(5, 100.0));
    h.feed.set("1h", long);
}

// ─── Cycles ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn accumulation_spring_is_dispatched_with_zone_levels() {
    let h = harness(0.9, false);
    load(&h, accumulation_short(), flat(3, 1.0));

    let (state, outcome) = h.orchestrator.run_cycle(CycleState::default()).await;

    assert_eq!(
        outcome,
        CycleOutcome::Analyzed(CycleReport {
            produced: 1,
            accepted: 1,
            rejected: 0,
            delivered: 1,
            vetoed: false,
        })
    );
    assert_eq!(state.last_short, Some(ts(20)));
    assert_eq!(state.last_mid, Some(ts(4)));

    let stored = h.store.load().await.unwrap();
    assert_eq!(stored.len(), 1);
    let signal = &stored[0];
    assert!(signal.id.starts_with("accum_in_"));
    assert_eq!(signal.signal_type, SignalType::Bullish);
    assert_eq!(signal.entry, 1.002);
    assert_eq!(signal.stop_loss, Some(0.996));
    assert_eq!(signal.take_profit, Some(1.003));

    let sent = h.alert.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].contains("SL: 0.996"));
}

#[tokio::test]
async fn spring_on_heavy_volume_dispatches_both_paths() {
    let h = harness(0.9, false);
    let mut short = accumulation_short();
    short[20].volume = 5000.0;
    load(&h, short, flat(3, 1.0));

    let (_, outcome) = h.orchestrator.run_cycle(CycleState::default()).await;

    assert_eq!(
        outcome,
        CycleOutcome::Analyzed(CycleReport {
            produced: 2,
            accepted: 2,
            rejected: 0,
            delivered: 2,
            vetoed: false,
        })
    );

    let stored = h.store.load().await.unwrap();
    assert_eq!(stored.len(), 2);
    let (accumulation, composite) = (&stored[0], &stored[1]);
    assert_eq!(accumulation.id, format!("accum_in_{}", composite.id));
    assert_ne!(accumulation.id, composite.id);
    assert_eq!(accumulation.time, ts(20));
    assert_eq!(composite.time, ts(20));
    assert_eq!(composite.reasoning, "VSA only: VSA Bullish Reversal");

    let sent = h.alert.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].contains(&format!("id: {}", accumulation.id)));
    assert!(sent[1].ends_with(&format!("id: {}", composite.id)));
}

#[tokio::test]
async fn falling_long_timeframe_blocks_bullish_composite() {
    let h = harness(0.9, false);
    load(&h, reversal_short(), falling_long());

    let (_, outcome) = h.orchestrator.run_cycle(CycleState::default()).await;

    let CycleOutcome::Analyzed(report) = outcome else {
        panic!("expected an analysed cycle, got {outcome:?}");
    };
    assert!(report.vetoed);
    assert_eq!(report.produced, 0);
    assert!(h.alert.sent.lock().unwrap().is_empty());
    assert!(h.store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn unchanged_candles_are_not_reanalysed() {
    let h = harness(0.9, false);
    load(&h, reversal_short(), flat(3, 1.0));

    let (state, first) = h.orchestrator.run_cycle(CycleState::default()).await;
    assert!(matches!(first, CycleOutcome::Analyzed(r) if r.delivered == 1));

    let (again, second) = h.orchestrator.run_cycle(state).await;
    assert_eq!(second, CycleOutcome::NoNewCandle);
    assert_eq!(again, state);
    assert_eq!(h.alert.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn fetch_failure_keeps_previous_state() {
    let h = harness(0.9, false);
    load(&h, reversal_short(), flat(3, 1.0));
    h.feed.remove("1h");

    let before = CycleState {
        last_short: Some(ts(3)),
        last_mid: Some(ts(2)),
    };
    let (after, outcome) = h.orchestrator.run_cycle(before).await;
    assert_eq!(outcome, CycleOutcome::NoData);
    assert_eq!(after, before);
}

#[tokio::test]
async fn empty_series_counts_as_no_data() {
    let h = harness(0.9, false);
    load(&h, reversal_short(), flat(3, 1.0));
    h.feed.set("15m", Vec::new());

    let (after, outcome) = h.orchestrator.run_cycle(CycleState::default()).await;
    assert_eq!(outcome, CycleOutcome::NoData);
    assert_eq!(after, CycleState::default());
}

#[tokio::test]
async fn low_score_is_rejected_but_state_advances() {
    let h = harness(0.2, false);
    load(&h, reversal_short(), flat(3, 1.0));

    let (state, outcome) = h.orchestrator.run_cycle(CycleState::default()).await;
    let CycleOutcome::Analyzed(report) = outcome else {
        panic!("expected an analysed cycle, got {outcome:?}");
    };
    assert_eq!(report.produced, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.accepted, 0);
    assert_eq!(state.last_short, Some(ts(9)));
    assert!(h.store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_alert_is_still_persisted() {
    let h = harness(0.9, true);
    load(&h, reversal_short(), flat(3, 1.0));

    let (_, outcome) = h.orchestrator.run_cycle(CycleState::default()).await;
    let CycleOutcome::Analyzed(report) = outcome else {
        panic!("expected an analysed cycle, got {outcome:?}");
    };
    assert_eq!(report.accepted, 1);
    assert_eq!(report.delivered, 0);

    let stored = h.store.load().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].reasoning, "VSA only: VSA Bullish Reversal");
}

#[tokio::test]
async fn run_stops_on_shutdown() {
    let h = harness(0.9, false);
    load(&h, reversal_short(), flat(3, 1.0));
    let store = h.store.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(h.orchestrator.run(shutdown_rx));

    // Wait for the first cycle to land before asking it to stop
    for _ in 0..100 {
        if !store.load().await.unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    shutdown_tx.send(true).unwrap();

    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("watch loop did not stop")
        .unwrap();
    assert_eq!(store.load().await.unwrap().len(), 1);
}
