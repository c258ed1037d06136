pub mod binance;
pub mod dispatcher;
pub mod orchestrator;

pub use binance::BinanceFeed;
pub use dispatcher::{format_alert, DispatchReport, Dispatcher};
pub use orchestrator::{
    new_candle, CycleOutcome, CycleReport, CycleState, Orchestrator, WatchSettings,
};
