use std::time::Duration;

/// All configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Market
    pub symbol: String,
    pub short_interval: String,
    pub mid_interval: String,
    pub long_interval: String,
    pub candle_limit: u32,

    // Feed
    pub feed_base_url: String,
    pub feed_timeout: Duration,

    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: String,

    // Quality gate
    pub signal_threshold: f64,
    pub model_path: String,

    // Persistence
    pub signal_store: String,

    // Loop
    pub poll_interval: Duration,

    // Status responder
    pub status_port: u16,

    // Optional detector parameter file (TOML)
    pub detector_config_path: Option<String>,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let signal_threshold: f64 = parsed_env("SIGNAL_THRESHOLD", 0.5);
        if !(0.0..=1.0).contains(&signal_threshold) {
            panic!("SIGNAL_THRESHOLD must be within [0, 1], got: {signal_threshold}");
        }

        Config {
            symbol: optional_env("SYMBOL")
                .map(|s| s.to_uppercase())
                .unwrap_or_else(|| "DOGEUSDT".to_string()),
            short_interval: optional_env("SHORT_INTERVAL").unwrap_or_else(|| "5m".to_string()),
            mid_interval: optional_env("MID_INTERVAL").unwrap_or_else(|| "15m".to_string()),
            long_interval: optional_env("LONG_INTERVAL").unwrap_or_else(|| "1h".to_string()),
            candle_limit: parsed_env("CANDLE_LIMIT", 100),
            feed_base_url: optional_env("FEED_BASE_URL")
                .unwrap_or_else(|| "https://api.binance.com".to_string()),
            feed_timeout: Duration::from_secs(parsed_env("FEED_TIMEOUT_SECS", 10)),
            telegram_token: required_env("TELEGRAM_TOKEN"),
            telegram_chat_id: required_env("TELEGRAM_CHAT_ID"),
            signal_threshold,
            model_path: optional_env("MODEL_PATH")
                .unwrap_or_else(|| "logs/feedback_model.json".to_string()),
            signal_store: optional_env("SIGNAL_STORE")
                .unwrap_or_else(|| "logs/signals.json".to_string()),
            poll_interval: Duration::from_secs(parsed_env("POLL_INTERVAL_SECS", 60)),
            status_port: parsed_env("STATUS_PORT", 10_000),
            detector_config_path: optional_env("DETECTOR_CONFIG_PATH"),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Optional variable parsed into `T`; a present but malformed value is a startup error.
fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("Environment variable '{key}' has an invalid value: '{raw}'")),
        None => default,
    }
}
