use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Candle feed unreachable or returned something unparsable.
    #[error("Feed error: {0}")]
    Fetch(String),

    /// No trained scorer artifact is available.
    #[error("Quality scorer unavailable: {0}")]
    ScorerUnavailable(String),

    #[error("Quality scorer error: {0}")]
    Scorer(String),

    /// A directional signal whose stop/target ordering is inconsistent.
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    /// Alert delivery failed (transport error or non-success response).
    #[error("Alert delivery failed: {0}")]
    Dispatch(String),

    /// The persisted signal store could not be read back.
    #[error("Signal store unreadable: {0}")]
    StoreCorruption(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
