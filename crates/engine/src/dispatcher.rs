use std::sync::Arc;

use tracing::{error, info};

use common::{AlertChannel, Signal, SignalStore, SignalType};

/// What happened to one accepted signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchReport {
    pub delivered: bool,
    pub persisted: bool,
}

/// Sends accepted signals to the alert channel and records them in the store.
///
/// Delivery and persistence are independent: a failed alert is still stored.
#[derive(Clone)]
pub struct Dispatcher {
    alert: Arc<dyn AlertChannel>,
    store: Arc<dyn SignalStore>,
}

impl Dispatcher {
    pub fn new(alert: Arc<dyn AlertChannel>, store: Arc<dyn SignalStore>) -> Self {
        Self { alert, store }
    }

    pub async fn send(&self, signal: &Signal) -> bool {
        match self.alert.send(&format_alert(signal)).await {
            Ok(()) => {
                info!(signal_id = %signal.id, "Signal alert delivered");
                true
            }
            Err(e) => {
                error!(signal_id = %signal.id, error = %e, "Signal alert failed");
                false
            }
        }
    }

    pub async fn persist(&self, signal: &Signal) -> bool {
        match self.store.append(signal).await {
            Ok(()) => true,
            Err(e) => {
                error!(signal_id = %signal.id, error = %e, "Failed to persist signal");
                false
            }
        }
    }

    pub async fn dispatch(&self, signal: &Signal) -> DispatchReport {
        let delivered = self.send(signal).await;
        let persisted = self.persist(signal).await;
        DispatchReport {
            delivered,
            persisted,
        }
    }
}

/// Human-readable alert text with a fixed field layout.
pub fn format_alert(signal: &Signal) -> String {
    let type_label = match signal.signal_type {
        SignalType::Bullish => "Bullish",
        SignalType::Bearish => "Bearish",
        SignalType::Neutral => "Neutral",
    };
    let level = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |p| p.to_string());

    format!(
        "🚨 *Trade Signal Alert* 🚨\n\
         \n\
         coin: {}\n\
         Type: {}\n\
         Description: {}\n\
         Entry: {}\n\
         TP: {}\n\
         SL: {}\n\
         Reason: {}\n\
         Time: {}\n\
         id: {}",
        signal.symbol,
        type_label,
        signal.description,
        signal.entry,
        level(signal.take_profit),
        level(signal.stop_loss),
        signal.reasoning,
        signal.time.format("%Y-%m-%d %H:%M"),
        signal.id,
    )
}
