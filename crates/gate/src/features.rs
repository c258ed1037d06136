use chrono::Timelike;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use common::Signal;

/// Buckets for the hashed signal id.
const CODE_BUCKETS: u64 = 100;

/// Model input derived from one signal.
///
/// The column order is shared with the training side and must not change:
/// `[tp_hit, sl_hit, hour, signal_code]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalFeatures {
    pub tp_hit: bool,
    pub sl_hit: bool,
    /// Hour of day (UTC) of the signal time.
    pub hour: u32,
    pub signal_code: u64,
}

impl SignalFeatures {
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            tp_hit: signal.tp_hit,
            sl_hit: signal.sl_hit,
            hour: signal.time.hour(),
            signal_code: signal_code(&signal.id),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            f64::from(u8::from(self.tp_hit)),
            f64::from(u8::from(self.sl_hit)),
            f64::from(self.hour),
            self.signal_code as f64,
        ]
    }
}

/// Stable bucket for a signal id: the first 8 bytes of its SHA-256 digest
/// read as a big-endian integer, modulo 100.
pub fn signal_code(id: &str) -> u64 {
    let digest = Sha256::digest(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % CODE_BUCKETS
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::SignalType;

    fn signal(id: &str, hour: u32) -> Signal {
        Signal {
            symbol: "DOGEUSDT".into(),
            time: Utc.with_ymd_and_hms(2024, 3, 1, hour, 35, 0).unwrap(),
            id: id.into(),
            entry: 0.15,
            signal_type: SignalType::Neutral,
            stop_loss: None,
            take_profit: None,
            tp_hit: false,
            sl_hit: false,
            reasoning: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn code_is_stable_and_bucketed() {
        let a = signal_code("accum_in_2024-03-01 12:05:00");
        assert_eq!(a, signal_code("accum_in_2024-03-01 12:05:00"));
        assert!(a < 100);
    }

    #[test]
    fn code_of_empty_id_matches_digest_prefix() {
        // SHA-256("") starts with e3b0c44298fc1c14
        assert_eq!(signal_code(""), 0xe3b0_c442_98fc_1c14_u64 % 100);
    }

    #[test]
    fn encodes_in_training_column_order() {
        let s = signal("2024-03-01 17:35:00", 17);
        let features = SignalFeatures::from_signal(&s);
        let v = features.to_vec();
        assert_eq!(v.len(), 4);
        assert_eq!(&v[..3], &[0.0, 0.0, 17.0]);
        assert_eq!(v[3], signal_code("2024-03-01 17:35:00") as f64);
    }
}
