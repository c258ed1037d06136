use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use common::{CandleFeed, CandleSeries, Config, Result, Timeframe};
use gate::QualityGate;
use strategy::{Freshness, Frames, SignalComposer};

use crate::dispatcher::Dispatcher;

/// True when `current` is a candle not seen before.
pub fn new_candle(current: DateTime<Utc>, last: Option<DateTime<Utc>>) -> bool {
    last.map_or(true, |last| current > last)
}

/// Latest short and mid candle timestamps already analysed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleState {
    pub last_short: Option<DateTime<Utc>>,
    pub last_mid: Option<DateTime<Utc>>,
}

/// Per-cycle counters for an analysed cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub produced: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub delivered: usize,
    pub vetoed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A fetch failed or returned no candles. State is left untouched.
    NoData,
    NoNewCandle,
    Analyzed(CycleReport),
}

/// Market and timing settings for the watch loop.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub symbol: String,
    pub short_interval: String,
    pub mid_interval: String,
    pub long_interval: String,
    pub candle_limit: u32,
    pub poll_interval: Duration,
}

impl From<&Config> for WatchSettings {
    fn from(cfg: &Config) -> Self {
        Self {
            symbol: cfg.symbol.clone(),
            short_interval: cfg.short_interval.clone(),
            mid_interval: cfg.mid_interval.clone(),
            long_interval: cfg.long_interval.clone(),
            candle_limit: cfg.candle_limit,
            poll_interval: cfg.poll_interval,
        }
    }
}

/// Drives fetch, compose, gate and dispatch for one market, one cycle at a time.
pub struct Orchestrator {
    settings: WatchSettings,
    feed: Arc<dyn CandleFeed>,
    composer: SignalComposer,
    gate: QualityGate,
    dispatcher: Dispatcher,
}

impl Orchestrator {
    pub fn new(
        settings: WatchSettings,
        feed: Arc<dyn CandleFeed>,
        composer: SignalComposer,
        gate: QualityGate,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            settings,
            feed,
            composer,
            gate,
            dispatcher,
        }
    }

    async fn fetch(&self, timeframe: Timeframe) -> Result<CandleSeries> {
        let interval = match timeframe {
            Timeframe::Short => &self.settings.short_interval,
            Timeframe::Mid => &self.settings.mid_interval,
            Timeframe::Long => &self.settings.long_interval,
        };
        self.feed
            .candles(&self.settings.symbol, interval, self.settings.candle_limit)
            .await
    }

    /// Run one cycle and return the state for the next one.
    pub async fn run_cycle(&self, state: CycleState) -> (CycleState, CycleOutcome) {
        let symbol = self.settings.symbol.as_str();

        let (short, mid, long) = tokio::join!(
            self.fetch(Timeframe::Short),
            self.fetch(Timeframe::Mid),
            self.fetch(Timeframe::Long),
        );
        let mut series = Vec::with_capacity(3);
        for (timeframe, result) in [
            (Timeframe::Short, short),
            (Timeframe::Mid, mid),
            (Timeframe::Long, long),
        ] {
            match result {
                Ok(candles) if !candles.is_empty() => series.push(candles),
                Ok(_) => {
                    warn!(symbol, %timeframe, "Feed returned no candles, skipping cycle");
                    return (state, CycleOutcome::NoData);
                }
                Err(e) => {
                    warn!(symbol, %timeframe, error = %e, "Candle fetch failed, skipping cycle");
                    return (state, CycleOutcome::NoData);
                }
            }
        }
        let (short, mid, long) = (&series[0], &series[1], &series[2]);

        let (Some(short_last), Some(mid_last)) = (short.last(), mid.last()) else {
            return (state, CycleOutcome::NoData);
        };
        let fresh = Freshness {
            short: new_candle(short_last.timestamp, state.last_short),
            mid: new_candle(mid_last.timestamp, state.last_mid),
        };
        if !fresh.short && !fresh.mid {
            debug!(symbol, "No new candles yet");
            return (state, CycleOutcome::NoNewCandle);
        }

        let frames = Frames { short, mid, long };
        let composition = self.composer.compose(symbol, &frames, fresh);
        let mut report = CycleReport {
            vetoed: composition.is_vetoed(),
            ..CycleReport::default()
        };

        for signal in composition.signals() {
            report.produced += 1;
            let score = self.gate.score(&signal);
            if !self.gate.accepts(score) {
                info!(
                    signal_id = %signal.id,
                    score,
                    threshold = self.gate.threshold(),
                    "Signal rejected by quality gate"
                );
                report.rejected += 1;
                continue;
            }

            info!(signal_id = %signal.id, signal_type = %signal.signal_type, score, "Signal accepted");
            report.accepted += 1;
            if self.dispatcher.dispatch(&signal).await.delivered {
                report.delivered += 1;
            }
        }

        let next = CycleState {
            last_short: Some(short_last.timestamp),
            last_mid: Some(mid_last.timestamp),
        };
        (next, CycleOutcome::Analyzed(report))
    }

    /// Poll until `shutdown` flips to true. A running cycle always completes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(
            symbol = %self.settings.symbol,
            short = %self.settings.short_interval,
            mid = %self.settings.mid_interval,
            long = %self.settings.long_interval,
            poll_secs = self.settings.poll_interval.as_secs(),
            "Signal watch started"
        );

        let mut state = CycleState::default();
        loop {
            if *shutdown.borrow() {
                break;
            }

            let (next, outcome) = self.run_cycle(state).await;
            state = next;
            if let CycleOutcome::Analyzed(report) = outcome {
                info!(
                    produced = report.produced,
                    accepted = report.accepted,
                    rejected = report.rejected,
                    delivered = report.delivered,
                    vetoed = report.vetoed,
                    "Cycle analysed"
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("Signal watch stopped");
    }
}
